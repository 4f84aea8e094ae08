//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CatalogId;

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: CatalogId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: CatalogId,
    pub price: Decimal,
    /// 3.0 - 5.0
    pub rating: Decimal,
    /// 0 - 999
    pub reviews_count: u32,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub ean: String,
    #[serde(default)]
    pub upc_code: String,
    #[serde(default)]
    pub category1_name: String,
    #[serde(default)]
    pub category2_name: String,
    #[serde(default)]
    pub category3_name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_on_sale: bool,
}

impl Product {
    /// Case-insensitive substring match on the searchable text fields
    ///
    /// `term` must already be lowercase.
    pub fn matches_term(&self, term: &str) -> bool {
        [
            &self.name,
            &self.description,
            &self.brand,
            &self.category1_name,
            &self.category2_name,
            &self.category3_name,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(term))
    }
}

/// Presentation fields produced by an enrichment strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayFields {
    pub price: Decimal,
    pub rating: Decimal,
    pub reviews_count: u32,
    pub is_new: bool,
    pub is_on_sale: bool,
}

impl DisplayFields {
    pub const MIN_RATING: Decimal = Decimal::from_parts(30, 0, 0, false, 1);
    pub const MAX_RATING: Decimal = Decimal::from_parts(50, 0, 0, false, 1);
    pub const MAX_REVIEWS: u32 = 999;

    /// Clamp rating and review count into their display bounds
    pub fn clamped(mut self) -> Self {
        self.rating = self.rating.clamp(Self::MIN_RATING, Self::MAX_RATING);
        self.reviews_count = self.reviews_count.min(Self::MAX_REVIEWS);
        self
    }
}
