//! CatalogStore - categories and products with lazy in-memory caching
//!
//! Each dataset is fetched at most once per cache generation. Concurrent
//! first callers share the in-flight fetch. Category product counts are
//! derived from the product index and recomputed whenever either dataset
//! is (re)loaded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::Rng;
use rand::seq::SliceRandom;
use shared::{CatalogId, Category, Product};
use tokio::sync::OnceCell;

use crate::csv::{self, CsvRecord, PARENT_CATEGORY_FIELD};
use crate::enrich::{Enrichment, RandomEnrichment};
use crate::error::{CatalogError, CatalogResult};
use crate::fallback::FallbackChain;
use crate::source::{CatalogSource, Dataset};

// =============================================================================
// Types
// =============================================================================

/// Products with their lookup indices
#[derive(Debug, Default)]
struct ProductIndex {
    products: Vec<Product>,
    /// product id -> position in `products`
    by_id: HashMap<CatalogId, usize>,
    /// category id -> positions in `products`
    by_category: HashMap<String, Vec<usize>>,
}

impl ProductIndex {
    fn build(products: Vec<Product>) -> Self {
        let mut index = Self::default();
        for product in products {
            if index.by_id.contains_key(&product.id) {
                tracing::warn!(product_id = %product.id, "Duplicate product id, keeping first");
                continue;
            }
            let position = index.products.len();
            index.by_id.insert(product.id.clone(), position);
            index
                .by_category
                .entry(product.category_id.as_str().to_string())
                .or_default()
                .push(position);
            index.products.push(product);
        }
        index
    }

    fn get(&self, id: &CatalogId) -> Option<&Product> {
        self.by_id.get(id).map(|&i| &self.products[i])
    }

    fn in_category(&self, key: &str) -> Option<Vec<Product>> {
        self.by_category
            .get(key)
            .map(|positions| positions.iter().map(|&i| self.products[i].clone()).collect())
    }

    fn count_in(&self, category: &CatalogId) -> usize {
        self.by_category.get(category.as_str()).map_or(0, Vec::len)
    }
}

/// Which categories a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryListing {
    #[default]
    All,
    Roots,
    /// Roots when there are any, otherwise everything
    Landing,
}

/// One cache generation, replaced wholesale by `clear_cache`
#[derive(Default)]
struct CatalogCache {
    categories: OnceCell<RwLock<Vec<Category>>>,
    products: OnceCell<ProductIndex>,
}

impl CatalogCache {
    /// Refresh every category's product count from the product index
    fn recount(&self) {
        let (Some(categories), Some(index)) = (self.categories.get(), self.products.get()) else {
            return;
        };
        let mut categories = categories.write();
        for category in categories.iter_mut() {
            category.product_count = index.count_in(&category.id);
        }
    }
}

// =============================================================================
// CatalogStore
// =============================================================================

/// Single source of truth for catalog data within one session
pub struct CatalogStore {
    source: Arc<dyn CatalogSource>,
    enrichment: Arc<dyn Enrichment>,
    fetch_timeout: Option<Duration>,
    cache: RwLock<Arc<CatalogCache>>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.current();
        f.debug_struct("CatalogStore")
            .field("source", &self.source.describe())
            .field(
                "categories_count",
                &cache.categories.get().map(|c| c.read().len()),
            )
            .field(
                "products_count",
                &cache.products.get().map(|p| p.products.len()),
            )
            .finish()
    }
}

impl CatalogStore {
    /// Create a store with random display-field enrichment and no timeout
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self::builder(source).build()
    }

    pub fn builder(source: Arc<dyn CatalogSource>) -> CatalogStoreBuilder {
        CatalogStoreBuilder {
            source,
            enrichment: Arc::new(RandomEnrichment),
            fetch_timeout: None,
        }
    }

    fn current(&self) -> Arc<CatalogCache> {
        self.cache.read().clone()
    }

    /// Whether a dataset is cached in the current generation
    pub fn is_loaded(&self, dataset: Dataset) -> bool {
        let cache = self.current();
        match dataset {
            Dataset::Categories => cache.categories.initialized(),
            Dataset::Products => cache.products.initialized(),
        }
    }

    /// Drop all cached data; the next getter call refetches
    pub fn clear_cache(&self) {
        *self.cache.write() = Arc::new(CatalogCache::default());
        tracing::info!("CatalogStore: cache cleared");
    }

    async fn fetch(&self, dataset: Dataset) -> CatalogResult<String> {
        match self.fetch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.source.fetch(dataset))
                .await
                .map_err(|_| CatalogError::Timeout {
                    dataset,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })?,
            None => self.source.fetch(dataset).await,
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories
    ///
    /// A failed first load is logged and cached as an empty list.
    pub async fn get_categories(&self) -> Vec<Category> {
        let cache = self.current();
        let categories = cache
            .categories
            .get_or_init(|| async move {
                let loaded = match self.load_categories().await {
                    Ok(categories) => {
                        tracing::info!(
                            "📦 CatalogStore: Loaded {} categories",
                            categories.len()
                        );
                        categories
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to load categories, using empty list");
                        Vec::new()
                    }
                };
                RwLock::new(loaded)
            })
            .await;

        cache.recount();
        categories.read().clone()
    }

    async fn load_categories(&self) -> CatalogResult<Vec<Category>> {
        let text = self.fetch(Dataset::Categories).await?;
        let records = csv::parse_csv(&text)?;
        Ok(records.iter().map(category_from_record).collect())
    }

    /// Categories without a parent
    pub async fn get_root_categories(&self) -> Vec<Category> {
        self.get_categories()
            .await
            .into_iter()
            .filter(Category::is_root)
            .collect()
    }

    /// Category by id, tolerant of inconsistent quoting
    pub async fn get_category_by_id(&self, id: &str) -> Option<Category> {
        self.get_categories()
            .await
            .into_iter()
            .find(|category| category.id.matches(id))
    }

    /// Root categories, falling back to all categories, then to nothing
    pub async fn landing_categories(&self) -> Vec<Category> {
        FallbackChain::new("landing categories")
            .accept(|categories: &Vec<Category>| !categories.is_empty())
            .strategy("root categories", || async move {
                Ok(self.get_root_categories().await)
            })
            .strategy("all categories", || async move {
                Ok(self.get_categories().await)
            })
            .run_or(Vec::new())
            .await
    }

    pub async fn list_categories(&self, listing: CategoryListing) -> Vec<Category> {
        match listing {
            CategoryListing::All => self.get_categories().await,
            CategoryListing::Roots => self.get_root_categories().await,
            CategoryListing::Landing => self.landing_categories().await,
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    async fn product_index(&self) -> CatalogResult<Arc<CatalogCache>> {
        let cache = self.current();
        if cache.products.initialized() {
            return Ok(cache);
        }

        cache
            .products
            .get_or_try_init(|| async move {
                let index = self.load_products().await?;
                tracing::info!(
                    "📦 CatalogStore: Loaded {} products",
                    index.products.len()
                );
                Ok::<_, CatalogError>(index)
            })
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to load products"))?;

        cache.recount();
        Ok(cache)
    }

    async fn load_products(&self) -> CatalogResult<ProductIndex> {
        let text = self.fetch(Dataset::Products).await?;
        let records = csv::parse_csv(&text)?;
        let products = records
            .iter()
            .map(|record| product_from_record(record, self.enrichment.as_ref()))
            .collect();
        Ok(ProductIndex::build(products))
    }

    /// All products
    ///
    /// Fetch and parse failures are returned and not cached.
    pub async fn get_products(&self) -> CatalogResult<Vec<Product>> {
        let cache = self.product_index().await?;
        Ok(cache
            .products
            .get()
            .map(|index| index.products.clone())
            .unwrap_or_default())
    }

    /// Product by id; `None` for unknown ids
    pub async fn get_product_by_id(&self, id: &str) -> CatalogResult<Option<Product>> {
        let cache = self.product_index().await?;
        let id = CatalogId::new(id);
        Ok(cache
            .products
            .get()
            .and_then(|index| index.get(&id))
            .cloned())
    }

    /// Products of one category
    ///
    /// Empty input returns nothing without loading. Tries the normalized
    /// id first, then the input as given.
    pub async fn get_products_by_category(&self, category_id: &str) -> CatalogResult<Vec<Product>> {
        if category_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let cache = self.product_index().await?;
        let Some(index) = cache.products.get() else {
            return Ok(Vec::new());
        };

        let normalized = CatalogId::new(category_id);
        Ok(index
            .in_category(normalized.as_str())
            .or_else(|| index.in_category(category_id))
            .unwrap_or_default())
    }

    /// Case-insensitive search over name, description, brand and category names
    pub async fn search_products(&self, query: &str) -> CatalogResult<Vec<Product>> {
        let term = query.trim().to_lowercase();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let cache = self.product_index().await?;
        let results: Vec<Product> = cache
            .products
            .get()
            .map(|index| {
                index
                    .products
                    .iter()
                    .filter(|product| product.matches_term(&term))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        tracing::debug!(query = %query, results = results.len(), "Product search");
        Ok(results)
    }

    /// Random sample of up to `count` products, optionally from one category
    pub async fn get_sponsored_products(
        &self,
        count: usize,
        category_id: Option<&str>,
    ) -> CatalogResult<Vec<Product>> {
        let pool = self.sponsored_pool(category_id).await?;
        Ok(sample(pool, count, &mut rand::thread_rng()))
    }

    /// Same as [`Self::get_sponsored_products`] with an explicit RNG
    pub async fn get_sponsored_products_with_rng<R: Rng + Send>(
        &self,
        count: usize,
        category_id: Option<&str>,
        rng: &mut R,
    ) -> CatalogResult<Vec<Product>> {
        let pool = self.sponsored_pool(category_id).await?;
        Ok(sample(pool, count, rng))
    }

    async fn sponsored_pool(&self, category_id: Option<&str>) -> CatalogResult<Vec<Product>> {
        match category_id {
            Some(id) => self.get_products_by_category(id).await,
            None => self.get_products().await,
        }
    }
}

/// Uniform shuffle, then truncate
fn sample<R: Rng + ?Sized>(mut products: Vec<Product>, count: usize, rng: &mut R) -> Vec<Product> {
    products.shuffle(rng);
    products.truncate(count);
    products
}

// =============================================================================
// Builder
// =============================================================================

pub struct CatalogStoreBuilder {
    source: Arc<dyn CatalogSource>,
    enrichment: Arc<dyn Enrichment>,
    fetch_timeout: Option<Duration>,
}

impl CatalogStoreBuilder {
    pub fn enrichment(mut self, enrichment: Arc<dyn Enrichment>) -> Self {
        self.enrichment = enrichment;
        self
    }

    /// Bound every dataset fetch; `None` waits indefinitely
    pub fn fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn build(self) -> CatalogStore {
        CatalogStore {
            source: self.source,
            enrichment: self.enrichment,
            fetch_timeout: self.fetch_timeout,
            cache: RwLock::new(Arc::new(CatalogCache::default())),
        }
    }
}

// =============================================================================
// Record mapping
// =============================================================================

fn category_from_record(record: &CsvRecord) -> Category {
    Category {
        id: CatalogId::new(record.text("id")),
        name: record.text("name"),
        description: record.text("description"),
        parent_category_id: record.get(PARENT_CATEGORY_FIELD).map(CatalogId::new),
        image_url: record.text("imageUrl"),
        product_count: 0,
    }
}

fn product_from_record(record: &CsvRecord, enrichment: &dyn Enrichment) -> Product {
    let display = enrichment.enrich(record);
    Product {
        id: CatalogId::new(record.text("id")),
        name: record.text("name"),
        description: record.text("description"),
        category_id: CatalogId::new(record.text("categoryId")),
        price: display.price,
        rating: display.rating,
        reviews_count: display.reviews_count,
        brand: record.text("brand"),
        ean: record.text("ean"),
        upc_code: record.text("upcCode"),
        category1_name: record.text("category1Name"),
        category2_name: record.text("category2Name"),
        category3_name: record.text("category3Name"),
        image_url: record.text("imageUrl"),
        is_new: display.is_new,
        is_on_sale: display.is_on_sale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::FixedEnrichment;
    use crate::source::MemorySource;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const CATEGORIES: &str = "id,name,parentCategoryId\n1,Electronics,\n2,Phones,1\n\"3\",Books,null\n";
    const PRODUCTS: &str = "id,name,categoryId,price\np1,Widget,1,19.99\np2,Gadget,2,49.99\np3,Novel,\"3\",9.50\np1,Duplicate,2,1.00\n";

    fn store() -> (Arc<MemorySource>, CatalogStore) {
        let source = Arc::new(MemorySource::new(CATEGORIES, PRODUCTS));
        let store = CatalogStore::builder(source.clone())
            .enrichment(Arc::new(FixedEnrichment::default()))
            .build();
        (source, store)
    }

    #[test]
    fn test_category_record_mapping() {
        let records = csv::parse_csv("id,name,parentCategoryId,imageUrl\n\"7\",Toys,,img.png").unwrap();
        let category = category_from_record(&records[0]);
        assert_eq!(category.id.as_str(), "7");
        assert_eq!(category.parent_category_id, None);
        assert_eq!(category.image_url, "img.png");
    }

    #[test]
    fn test_index_keeps_first_duplicate() {
        let records = csv::parse_csv(PRODUCTS).unwrap();
        let enrichment = FixedEnrichment::default();
        let products = records
            .iter()
            .map(|r| product_from_record(r, &enrichment))
            .collect();
        let index = ProductIndex::build(products);
        assert_eq!(index.products.len(), 3);
        assert_eq!(index.get(&CatalogId::new("p1")).unwrap().name, "Widget");
        assert_eq!(index.count_in(&CatalogId::new("3")), 1);
    }

    #[test]
    fn test_sample_truncates_and_shuffles_deterministically() {
        let records = csv::parse_csv(PRODUCTS).unwrap();
        let enrichment = FixedEnrichment::default();
        let products: Vec<Product> = records
            .iter()
            .map(|r| product_from_record(r, &enrichment))
            .collect();

        let a = sample(products.clone(), 2, &mut StdRng::seed_from_u64(1));
        let b = sample(products.clone(), 2, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(sample(products, 10, &mut StdRng::seed_from_u64(1)).len(), 4);
    }

    #[tokio::test]
    async fn test_is_loaded_tracks_generations() {
        let (_source, store) = store();
        assert!(!store.is_loaded(Dataset::Categories));
        store.get_categories().await;
        assert!(store.is_loaded(Dataset::Categories));
        assert!(!store.is_loaded(Dataset::Products));
        store.get_products().await.unwrap();
        assert!(store.is_loaded(Dataset::Products));
        store.clear_cache();
        assert!(!store.is_loaded(Dataset::Categories));
        assert!(!store.is_loaded(Dataset::Products));
    }

    #[tokio::test]
    async fn test_debug_reports_counts() {
        let (_source, store) = store();
        store.get_categories().await;
        let debug = format!("{:?}", store);
        assert!(debug.contains("categories_count: Some(3)"));
        assert!(debug.contains("products_count: None"));
    }
}
