//! Record types exchanged with the inventory service.

mod field;
mod filament;
mod spool;
mod vendor;

pub use field::{EntityType, FieldDef, FieldType, NewField};
pub use filament::{ExternalFilament, InternalFilament, NewFilament};
pub use spool::{ClaimState, NewSpool, Spool, SpoolPatch};
pub use vendor::{NewVendor, Vendor};
