//! Shared types for the storefront catalog
//!
//! Domain models used by the catalog store and everything that consumes
//! its output (cart, sponsored slots, CLI).

pub mod models;

// Re-exports
pub use models::{CatalogId, Category, DisplayFields, Product};
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};
