//! Catalog configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | CATALOG_DATA_DIR | . | Directory containing `data/*.csv` |
//! | CATALOG_BASE_URL | (unset) | Fetch datasets over HTTP instead of from disk |
//! | CATALOG_LOCALE | en | Dataset locale suffix |
//! | CATALOG_FETCH_TIMEOUT_MS | 10000 | Per-fetch timeout, 0 disables |
//! | CATALOG_ENRICHMENT | random | `random` or `fixed` display fields |
//! | CART_STATE_FILE | .storefront/cart.json | Cart state file |
//! | CART_SHIPPING_FLAT | 0 | Flat shipping fee |
//! | CART_FREE_SHIPPING_OVER | (unset) | Subtotal waiving shipping |
//! | CART_TAX_RATE | 0 | Tax percentage |
//! | LOG_LEVEL | info | Log level |
//! | LOG_DIR | (unset) | Directory for daily log files |

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::cart::CartPricing;
use crate::enrich::{Enrichment, FixedEnrichment, RandomEnrichment};
use crate::error::CatalogResult;
use crate::source::{CatalogSource, FileSource, HttpSource};
use crate::store::CatalogStore;

/// How display fields missing from the dataset are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrichmentMode {
    #[default]
    Random,
    Fixed,
}

impl EnrichmentMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "random" => Some(Self::Random),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Store and CLI configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Root directory for the file source
    pub data_dir: PathBuf,
    /// Base URL for the HTTP source; takes precedence over `data_dir`
    pub base_url: Option<String>,
    /// Dataset locale, e.g. "en" for `catalog_products_en.csv`
    pub locale: String,
    /// Fetch timeout in milliseconds, 0 waits indefinitely
    pub fetch_timeout_ms: u64,
    pub enrichment: EnrichmentMode,
    pub cart_state_file: PathBuf,
    pub cart_pricing: CartPricing,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl CatalogConfig {
    /// Create a configuration reading datasets from `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            base_url: None,
            locale: "en".into(),
            fetch_timeout_ms: 10_000,
            enrichment: EnrichmentMode::Random,
            cart_state_file: PathBuf::from(".storefront/cart.json"),
            cart_pricing: CartPricing::default(),
            log_level: "info".into(),
            log_dir: None,
        }
    }

    /// Load configuration from the process environment
    ///
    /// Unset or unparseable values use defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new(".");
        Self {
            data_dir: lookup("CATALOG_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            base_url: lookup("CATALOG_BASE_URL").filter(|url| !url.trim().is_empty()),
            locale: lookup("CATALOG_LOCALE")
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(defaults.locale),
            fetch_timeout_ms: lookup("CATALOG_FETCH_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout_ms),
            enrichment: lookup("CATALOG_ENRICHMENT")
                .and_then(|v| EnrichmentMode::parse(&v))
                .unwrap_or(defaults.enrichment),
            cart_state_file: lookup("CART_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.cart_state_file),
            cart_pricing: CartPricing {
                shipping_flat: lookup("CART_SHIPPING_FLAT")
                    .and_then(|v| parse_amount(&v))
                    .unwrap_or(defaults.cart_pricing.shipping_flat),
                free_shipping_threshold: lookup("CART_FREE_SHIPPING_OVER")
                    .and_then(|v| parse_amount(&v)),
                tax_rate: lookup("CART_TAX_RATE")
                    .and_then(|v| parse_amount(&v))
                    .unwrap_or(defaults.cart_pricing.tax_rate),
            },
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: lookup("LOG_DIR").filter(|d| !d.trim().is_empty()),
        }
    }

    /// Fetch datasets over HTTP from `base_url`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_fetch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.fetch_timeout_ms = timeout_ms;
        self
    }

    pub fn with_enrichment(mut self, enrichment: EnrichmentMode) -> Self {
        self.enrichment = enrichment;
        self
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_ms > 0).then(|| Duration::from_millis(self.fetch_timeout_ms))
    }

    /// Build the configured data source
    pub fn build_source(&self) -> CatalogResult<Arc<dyn CatalogSource>> {
        let source: Arc<dyn CatalogSource> = match &self.base_url {
            Some(url) => Arc::new(HttpSource::new(
                url.clone(),
                self.locale.clone(),
                self.fetch_timeout(),
            )?),
            None => Arc::new(FileSource::new(self.data_dir.clone(), self.locale.clone())),
        };
        Ok(source)
    }

    pub fn build_enrichment(&self) -> Arc<dyn Enrichment> {
        match self.enrichment {
            EnrichmentMode::Random => Arc::new(RandomEnrichment),
            EnrichmentMode::Fixed => Arc::new(FixedEnrichment::default()),
        }
    }

    /// Build a store from this configuration
    pub fn build_store(&self) -> CatalogResult<CatalogStore> {
        Ok(CatalogStore::builder(self.build_source()?)
            .enrichment(self.build_enrichment())
            .fetch_timeout(self.fetch_timeout())
            .build())
    }
}

fn parse_amount(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim())
        .ok()
        .filter(|amount| !amount.is_sign_negative())
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
