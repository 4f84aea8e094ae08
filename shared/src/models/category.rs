//! Category Model

use serde::{Deserialize, Serialize};

use super::CatalogId;

/// Category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CatalogId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `None` for root categories
    #[serde(default)]
    pub parent_category_id: Option<CatalogId>,
    #[serde(default)]
    pub image_url: String,
    /// Derived from the product dataset, 0 until products are loaded
    #[serde(default)]
    pub product_count: usize,
}

impl Category {
    pub fn new(id: impl Into<CatalogId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            parent_category_id: None,
            image_url: String::new(),
            product_count: 0,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<CatalogId>) -> Self {
        self.parent_category_id = Some(parent.into());
        self
    }

    /// Root when the parent is absent, empty, or the literal `"null"`
    pub fn is_root(&self) -> bool {
        match &self.parent_category_id {
            None => true,
            Some(parent) => parent.is_empty() || parent.as_str().eq_ignore_ascii_case("null"),
        }
    }
}
