//! Data models
//!
//! Catalog entities shared by the store, its consumers and the CLI.

pub mod catalog_id;
pub mod category;
pub mod product;

// Re-exports
pub use catalog_id::*;
pub use category::*;
pub use product::*;
