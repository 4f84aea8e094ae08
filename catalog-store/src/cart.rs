//! Shopping cart
//!
//! Line items and totals, plus a JSON state file standing in for browser
//! local storage. The cart copies name and price at add time and never
//! consults the catalog again.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use shared::{CatalogId, Product};

use crate::error::CatalogResult;

/// Cart line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: CatalogId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: String,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Shipping and tax rules applied to the subtotal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPricing {
    /// Flat shipping fee below the free-shipping threshold
    pub shipping_flat: Decimal,
    /// Subtotal at or above which shipping is free; `None` never waives it
    pub free_shipping_threshold: Option<Decimal>,
    /// Tax percentage, e.g. 21 for 21%
    pub tax_rate: Decimal,
}

impl Default for CartPricing {
    fn default() -> Self {
        Self {
            shipping_flat: Decimal::ZERO,
            free_shipping_threshold: None,
            tax_rate: Decimal::ZERO,
        }
    }
}

/// Computed cart totals, rounded to cents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of a product, merging with an existing line
    pub fn add(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(item) = self.item_mut(&product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
            return;
        }
        self.items.push(CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            image_url: product.image_url.clone(),
        });
    }

    /// Set a line's quantity; 0 removes the line. Returns false for unknown ids
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        match self.item_mut(&CatalogId::new(product_id)) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, product_id: &str) -> bool {
        let id = CatalogId::new(product_id);
        let before = self.items.len();
        self.items.retain(|item| item.product_id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn totals(&self, pricing: &CartPricing) -> CartTotals {
        let subtotal = round_cents(self.subtotal());

        let shipping = if self.is_empty() {
            Decimal::ZERO
        } else {
            match pricing.free_shipping_threshold {
                Some(threshold) if subtotal >= threshold => Decimal::ZERO,
                _ => pricing.shipping_flat,
            }
        };

        let tax = round_cents(subtotal * pricing.tax_rate / Decimal::ONE_HUNDRED);

        CartTotals {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    fn item_mut(&mut self, id: &CatalogId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| &item.product_id == id)
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// CartStorage
// =============================================================================

/// JSON file holding the cart between runs
#[derive(Debug, Clone)]
pub struct CartStorage {
    path: PathBuf,
}

impl CartStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, cart: &Cart) -> CatalogResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(cart)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Load the stored cart; a missing or unreadable file yields an empty cart
    pub fn load(&self) -> Cart {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Cart::new();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable cart state");
            Cart::new()
        })
    }

    pub fn delete(&self) -> CatalogResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
