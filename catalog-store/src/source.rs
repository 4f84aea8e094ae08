//! Dataset sources
//!
//! A [`CatalogSource`] returns the raw text of one dataset. The store never
//! touches files or the network directly, so fixtures can be injected in
//! tests through [`MemorySource`].

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;

use crate::error::{CatalogError, CatalogResult};

/// The two flat-file datasets backing the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Categories,
    Products,
}

impl Dataset {
    /// Relative path of the dataset, e.g. `data/catalog_products_en.csv`
    pub fn relative_path(&self, locale: &str) -> String {
        match self {
            Dataset::Categories => format!("data/catalog_categories_{}.csv", locale),
            Dataset::Products => format!("data/catalog_products_{}.csv", locale),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Categories => "categories",
            Dataset::Products => "products",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of raw dataset text
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full text of a dataset
    async fn fetch(&self, dataset: Dataset) -> CatalogResult<String>;

    /// Human-readable location, used in logs
    fn describe(&self) -> String;
}

// =============================================================================
// FileSource
// =============================================================================

/// Reads datasets from a local directory
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
    locale: String,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>, locale: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            locale: locale.into(),
        }
    }

    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        self.root.join(dataset.relative_path(&self.locale))
    }
}

#[async_trait]
impl CatalogSource for FileSource {
    async fn fetch(&self, dataset: Dataset) -> CatalogResult<String> {
        let path = self.path_for(dataset);
        tracing::debug!(dataset = %dataset, path = %path.display(), "Reading dataset file");
        Ok(tokio::fs::read_to_string(&path).await?)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

// =============================================================================
// HttpSource
// =============================================================================

/// Fetches datasets over HTTP relative to a base URL
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    locale: String,
}

impl HttpSource {
    pub fn new(
        base_url: impl Into<String>,
        locale: impl Into<String>,
        timeout: Option<Duration>,
    ) -> CatalogResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
            locale: locale.into(),
        })
    }

    /// Use an existing client (shared connection pool)
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            locale: locale.into(),
        }
    }

    pub fn url_for(&self, dataset: Dataset) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            dataset.relative_path(&self.locale)
        )
    }
}

#[async_trait]
impl CatalogSource for HttpSource {
    async fn fetch(&self, dataset: Dataset) -> CatalogResult<String> {
        let url = self.url_for(dataset);
        tracing::debug!(dataset = %dataset, url = %url, "Fetching dataset");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

// =============================================================================
// MemorySource
// =============================================================================

/// In-memory fixture source with per-dataset fetch counters
#[derive(Debug, Default)]
pub struct MemorySource {
    texts: RwLock<HashMap<Dataset, String>>,
    failing: RwLock<HashMap<Dataset, String>>,
    categories_fetches: AtomicUsize,
    products_fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl MemorySource {
    pub fn new(categories: impl Into<String>, products: impl Into<String>) -> Self {
        let source = Self::default();
        source.set_text(Dataset::Categories, categories);
        source.set_text(Dataset::Products, products);
        source
    }

    /// Delay every fetch, to widen race windows in tests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_text(&self, dataset: Dataset, text: impl Into<String>) {
        self.texts.write().insert(dataset, text.into());
    }

    /// Make fetches of `dataset` fail with an IO error until [`Self::recover`]
    pub fn fail(&self, dataset: Dataset, message: impl Into<String>) {
        self.failing.write().insert(dataset, message.into());
    }

    pub fn recover(&self, dataset: Dataset) {
        self.failing.write().remove(&dataset);
    }

    /// Number of fetches issued for `dataset`, including failed ones
    pub fn fetch_count(&self, dataset: Dataset) -> usize {
        self.counter(dataset).load(Ordering::SeqCst)
    }

    fn counter(&self, dataset: Dataset) -> &AtomicUsize {
        match dataset {
            Dataset::Categories => &self.categories_fetches,
            Dataset::Products => &self.products_fetches,
        }
    }
}

#[async_trait]
impl CatalogSource for MemorySource {
    async fn fetch(&self, dataset: Dataset) -> CatalogResult<String> {
        self.counter(dataset).fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failing.read().get(&dataset).cloned() {
            return Err(CatalogError::Io(std::io::Error::other(message)));
        }

        let text = self.texts.read().get(&dataset).cloned();
        text.ok_or_else(|| {
            CatalogError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no fixture for {}", dataset),
            ))
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
