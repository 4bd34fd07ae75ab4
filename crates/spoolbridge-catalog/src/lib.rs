//! Inventory catalog access for spoolbridge.
//!
//! This crate defines the [`CatalogClient`] contract the reconciliation
//! engine depends on, the record types exchanged with the inventory
//! service, and three implementations:
//!
//! - [`SpoolmanClient`]: the Spoolman REST API over HTTP
//! - [`InMemoryCatalog`]: shared in-memory state with a write log
//! - [`AnyCatalog`]: enum dispatch over both, for spawned workers
//!
//! [`Preflight`] prepares a fresh service before the first pass.

pub mod any;
pub mod client;
pub mod error;
pub mod memory;
pub mod models;
pub mod preflight;
pub mod spoolman;

pub use any::AnyCatalog;
pub use client::CatalogClient;
pub use error::{CatalogError, CatalogResult};
pub use memory::{CatalogWrite, Failure, InMemoryCatalog};
pub use models::*;
pub use preflight::{Preflight, PreflightReport};
pub use spoolman::{CatalogStatus, SpoolmanClient, SpoolmanConfig};
