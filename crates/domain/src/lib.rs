//! Dispatch-note ("Guía de Despacho") domain

/// Product catalog
pub mod catalog;

/// Dispatch notes
pub mod dispatches;

/// Domain errors
pub mod errors;

/// Google Sheets adapter
pub mod sheets;

/// Tabular store seam
pub mod store;

pub use catalog::{Catalog, Product};
pub use errors::Error;
pub use store::{SheetStore, Worksheet};
