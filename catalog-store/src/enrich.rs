//! Display-field enrichment
//!
//! Price, rating, review count and the new/sale flags are presentation
//! filler when the dataset does not carry them. Values present in the
//! source always win; only the gaps are filled by the strategy.

use std::str::FromStr;

use rand::Rng;
use rust_decimal::Decimal;
use shared::DisplayFields;

use crate::csv::CsvRecord;

/// Share of products flagged as new
pub const NEW_PROBABILITY: f64 = 0.15;
/// Share of products flagged as on sale
pub const SALE_PROBABILITY: f64 = 0.30;

/// Strategy producing display fields for one raw product record
pub trait Enrichment: Send + Sync {
    fn enrich(&self, record: &CsvRecord) -> DisplayFields;
}

/// Display values carried by the source record itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFields {
    pub price: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub reviews_count: Option<u32>,
    pub is_new: Option<bool>,
    pub is_on_sale: Option<bool>,
}

impl SourceFields {
    pub fn from_record(record: &CsvRecord) -> Self {
        Self {
            price: record.present("price").and_then(parse_decimal),
            rating: record.present("rating").and_then(parse_decimal),
            reviews_count: record
                .present("reviewsCount")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.min(u32::MAX as f64) as u32),
            is_new: record.present("isNew").and_then(parse_flag),
            is_on_sale: record.present("isOnSale").and_then(parse_flag),
        }
    }
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

// =============================================================================
// RandomEnrichment
// =============================================================================

/// Fills missing fields with bounded pseudo-random values
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomEnrichment;

impl RandomEnrichment {
    fn synthesize<R: Rng>(source: SourceFields, rng: &mut R) -> DisplayFields {
        DisplayFields {
            // 4.99 .. 499.99, always ending in .99
            price: source
                .price
                .unwrap_or_else(|| Decimal::new(rng.gen_range(5..=500) * 100 - 1, 2)),
            rating: source
                .rating
                .unwrap_or_else(|| Decimal::new(rng.gen_range(30..=50), 1)),
            reviews_count: source
                .reviews_count
                .unwrap_or_else(|| rng.gen_range(0..=DisplayFields::MAX_REVIEWS)),
            is_new: source.is_new.unwrap_or_else(|| rng.gen_bool(NEW_PROBABILITY)),
            is_on_sale: source
                .is_on_sale
                .unwrap_or_else(|| rng.gen_bool(SALE_PROBABILITY)),
        }
        .clamped()
    }

    /// Enrich with an explicit RNG
    pub fn enrich_with<R: Rng>(&self, record: &CsvRecord, rng: &mut R) -> DisplayFields {
        Self::synthesize(SourceFields::from_record(record), rng)
    }
}

impl Enrichment for RandomEnrichment {
    fn enrich(&self, record: &CsvRecord) -> DisplayFields {
        self.enrich_with(record, &mut rand::thread_rng())
    }
}

// =============================================================================
// FixedEnrichment
// =============================================================================

/// Fills missing fields with constants, for deterministic output
#[derive(Debug, Clone, PartialEq)]
pub struct FixedEnrichment {
    pub fields: DisplayFields,
}

impl FixedEnrichment {
    pub fn new(fields: DisplayFields) -> Self {
        Self { fields }
    }
}

impl Default for FixedEnrichment {
    fn default() -> Self {
        Self::new(DisplayFields {
            price: Decimal::new(999, 2),
            rating: Decimal::new(40, 1),
            reviews_count: 0,
            is_new: false,
            is_on_sale: false,
        })
    }
}

impl Enrichment for FixedEnrichment {
    fn enrich(&self, record: &CsvRecord) -> DisplayFields {
        let source = SourceFields::from_record(record);
        let fixed = &self.fields;
        DisplayFields {
            price: source.price.unwrap_or(fixed.price),
            rating: source.rating.unwrap_or(fixed.rating),
            reviews_count: source.reviews_count.unwrap_or(fixed.reviews_count),
            is_new: source.is_new.unwrap_or(fixed.is_new),
            is_on_sale: source.is_on_sale.unwrap_or(fixed.is_on_sale),
        }
        .clamped()
    }
}
