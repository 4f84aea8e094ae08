//! Catalog Store - client-side storefront data layer
//!
//! Loads the category and product datasets, caches them for the session
//! and answers catalog queries. Cart totals and sponsored-slot backfill
//! sit on top of the store.

pub mod cart;
pub mod config;
pub mod csv;
pub mod enrich;
pub mod error;
pub mod fallback;
pub mod logger;
pub mod source;
pub mod sponsored;
pub mod store;

pub use cart::{Cart, CartItem, CartPricing, CartStorage, CartTotals};
pub use config::{CatalogConfig, EnrichmentMode};
pub use enrich::{Enrichment, FixedEnrichment, RandomEnrichment};
pub use error::{CatalogError, CatalogResult};
pub use fallback::FallbackChain;
pub use source::{CatalogSource, Dataset, FileSource, HttpSource, MemorySource};
pub use sponsored::backfill_sponsored;
pub use store::{CatalogStore, CatalogStoreBuilder, CategoryListing};

// Re-export shared types for convenience
pub use shared::{CatalogId, Category, DisplayFields, Product};
