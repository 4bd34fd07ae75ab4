//! Startup checks against the inventory service.
//!
//! Before any tray is reconciled the service must know the vendor the bridge
//! files new filament types under, and the spool extra field that records
//! which tray claims a spool. [`Preflight`] ensures both exist and warms the
//! external filament cache.
//!
//! Failures are logged and degrade: an unknown vendor id means filament types
//! are created without a vendor, and a missing tag field surfaces later as
//! failed spool writes.

use crate::client::CatalogClient;
use crate::models::{EntityType, NewField, NewVendor};
use spoolbridge_core::{TagField, constants::VENDOR_NAME};
use tracing::{info, warn};

/// What the preflight found or created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreflightReport {
    /// Id of the vendor new filament types are filed under
    pub vendor_id: Option<i64>,

    /// The vendor did not exist and was created
    pub vendor_created: bool,

    /// The tag field is known to exist after the run
    pub tag_field_ready: bool,

    /// The tag field did not exist and was created
    pub tag_field_created: bool,

    /// Number of cached external filament types, if the fetch succeeded
    pub external_filaments: Option<usize>,
}

pub struct Preflight<'a, C> {
    catalog: &'a C,
    tag: &'a TagField,
}

impl<'a, C: CatalogClient> Preflight<'a, C> {
    pub fn new(catalog: &'a C, tag: &'a TagField) -> Self {
        Self { catalog, tag }
    }

    /// Run every check. Never fails; see [`PreflightReport`] for the outcome.
    pub async fn run(&self) -> PreflightReport {
        info!("Catalog preflight starting");

        let mut report = PreflightReport::default();
        self.ensure_vendor(&mut report).await;
        self.ensure_tag_field(&mut report).await;

        match self.catalog.get_external_filaments().await {
            Ok(filaments) => report.external_filaments = Some(filaments.len()),
            Err(e) => warn!(error = %e, "External filament catalog unavailable"),
        }

        info!(
            vendor_id = ?report.vendor_id,
            tag_field_ready = report.tag_field_ready,
            external_filaments = ?report.external_filaments,
            "Catalog preflight completed"
        );
        report
    }

    async fn ensure_vendor(&self, report: &mut PreflightReport) {
        let vendors = match self.catalog.get_vendors().await {
            Ok(vendors) => vendors,
            Err(e) => {
                warn!(error = %e, "Failed to list vendors");
                return;
            }
        };

        if let Some(vendor) = vendors.iter().find(|v| v.name == VENDOR_NAME) {
            info!(vendor_id = vendor.id, vendor = VENDOR_NAME, "Vendor present");
            report.vendor_id = Some(vendor.id);
            return;
        }

        info!(vendor = VENDOR_NAME, "Vendor not found, creating");
        match self.catalog.create_vendor(&NewVendor::bambu_lab()).await {
            Ok(vendor) => {
                report.vendor_id = Some(vendor.id);
                report.vendor_created = true;
            }
            Err(e) => warn!(vendor = VENDOR_NAME, error = %e, "Failed to create vendor"),
        }
    }

    async fn ensure_tag_field(&self, report: &mut PreflightReport) {
        let fields = match self.catalog.get_fields(EntityType::Spool).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(tag = self.tag.name(), error = %e, "Failed to list spool extra fields");
                return;
            }
        };

        if fields
            .iter()
            .any(|f| f.name == self.tag.name() || f.key == self.tag.key())
        {
            info!(tag = self.tag.name(), "Spool tag field present");
            report.tag_field_ready = true;
            return;
        }

        info!(tag = self.tag.name(), key = self.tag.key(), "Spool tag field not found, creating");
        match self
            .catalog
            .create_field(EntityType::Spool, self.tag.key(), &NewField::text(self.tag.name()))
            .await
        {
            Ok(_) => {
                report.tag_field_ready = true;
                report.tag_field_created = true;
            }
            Err(e) => warn!(tag = self.tag.name(), error = %e, "Failed to create spool tag field"),
        }
    }
}
