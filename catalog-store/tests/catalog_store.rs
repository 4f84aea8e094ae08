// catalog-store/tests/catalog_store.rs
// Store behaviour against fixture datasets

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use catalog_store::{
    CatalogError, CatalogStore, CategoryListing, Dataset, DisplayFields, FixedEnrichment,
    MemorySource,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::dec;

const CATEGORIES: &str = "\
id,name,description,parentCategoryId,imageUrl
1,Electronics,Gadgets and devices,,electronics.png
2,Phones,Mobile phones,1,phones.png
\"3\",Books,Paper and ink,null,books.png
4,Laptops,Portable computers,\"1\",laptops.png
5,Garden,Outdoor,\"\",garden.png
";

const PRODUCTS: &str = "\
id,name,description,categoryId,price,brand,category1Name,category2Name,category3Name
p1,Widget,A useful widget,1,19.99,Acme,Electronics,,
p2,Gadget,Shiny gadget,2,49.99,Globex,Electronics,Phones,
p3,Novel,\"A long, winding story\",\"3\",12.50,Penguin,Books,,
p4,Ultrabook,Thin and light,4,999.00,Initech,Electronics,Laptops,
p5,Charger,Fast USB-C,2,,Acme,Electronics,Phones,Accessories
";

fn fixture_store(categories: &str, products: &str) -> (Arc<MemorySource>, CatalogStore) {
    let source = Arc::new(MemorySource::new(categories, products));
    let store = CatalogStore::builder(source.clone())
        .enrichment(Arc::new(FixedEnrichment::new(DisplayFields {
            price: dec!(1.00),
            rating: dec!(4.0),
            reviews_count: 7,
            is_new: false,
            is_on_sale: true,
        })))
        .build();
    (source, store)
}

fn store() -> (Arc<MemorySource>, CatalogStore) {
    fixture_store(CATEGORIES, PRODUCTS)
}

fn ids<T, F: Fn(&T) -> &str>(items: &[T], id: F) -> Vec<String> {
    items.iter().map(|item| id(item).to_string()).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_root_categories_minimal_dataset() {
    let (_source, store) = fixture_store("id,name,parentCategoryId\n1,Electronics,\n2,Phones,1\n", "id\n");
    let roots = store.get_root_categories().await;
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id.as_str(), "1");
    assert_eq!(roots[0].name, "Electronics");
    assert_eq!(roots[0].parent_category_id, None);
}

#[tokio::test]
async fn test_products_by_category_and_count() {
    let (_source, store) = fixture_store(
        "id,name,parentCategoryId\n1,Electronics,\n2,Phones,1\n",
        "id,name,categoryId,price\np1,Widget,1,19.99\np2,Gadget,2,49.99\n",
    );
    let products = store.get_products_by_category("1").await.unwrap();
    assert_eq!(ids(&products, |p| p.id.as_str()), vec!["p1"]);
    assert_eq!(products[0].price, dec!(19.99));

    let categories = store.get_categories().await;
    let electronics = categories.iter().find(|c| c.id.as_str() == "1").unwrap();
    assert_eq!(electronics.product_count, 1);
}

#[tokio::test]
async fn test_product_by_id_triggers_load() {
    let (source, store) = store();
    assert_eq!(source.fetch_count(Dataset::Products), 0);

    let product = store.get_product_by_id("p1").await.unwrap().unwrap();
    assert_eq!(product.name, "Widget");
    assert_eq!(source.fetch_count(Dataset::Products), 1);

    assert!(store.get_product_by_id("missing").await.unwrap().is_none());
    assert_eq!(source.fetch_count(Dataset::Products), 1);
}

#[tokio::test]
async fn test_sponsored_under_supply() {
    let (_source, store) = store();
    let products = store.get_sponsored_products(2, Some("1")).await.unwrap();
    assert_eq!(ids(&products, |p| p.id.as_str()), vec!["p1"]);
}

#[tokio::test]
async fn test_clear_cache_refetches() {
    let (source, store) = store();
    store.get_categories().await;
    store.get_categories().await;
    assert_eq!(source.fetch_count(Dataset::Categories), 1);

    store.clear_cache();
    store.get_categories().await;
    assert_eq!(source.fetch_count(Dataset::Categories), 2);
}

#[tokio::test]
async fn test_quoted_category_ids() {
    let (_source, store) = store();
    let books = store.get_category_by_id("3").await.unwrap();
    assert_eq!(books.name, "Books");
    let books_quoted = store.get_category_by_id("\"3\"").await.unwrap();
    assert_eq!(books_quoted, books);

    let novels = store.get_products_by_category("\"3\"").await.unwrap();
    assert_eq!(ids(&novels, |p| p.id.as_str()), vec!["p3"]);
    assert!(store.get_category_by_id("99").await.is_none());
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn test_product_counts_match_products() {
    for categories_first in [true, false] {
        let (_source, store) = store();
        if categories_first {
            store.get_categories().await;
            store.get_products().await.unwrap();
        } else {
            store.get_products().await.unwrap();
        }

        let products = store.get_products().await.unwrap();
        let mut expected: HashMap<String, usize> = HashMap::new();
        for product in &products {
            *expected.entry(product.category_id.as_str().to_string()).or_default() += 1;
        }

        for category in store.get_categories().await {
            assert_eq!(
                category.product_count,
                expected.get(category.id.as_str()).copied().unwrap_or(0),
                "category {}",
                category.id
            );
        }
    }
}

#[tokio::test]
async fn test_counts_recomputed_after_products_load() {
    let (_source, store) = store();
    let before = store.get_categories().await;
    assert!(before.iter().all(|c| c.product_count == 0));

    store.get_products().await.unwrap();
    let phones = store.get_category_by_id("2").await.unwrap();
    assert_eq!(phones.product_count, 2);
}

#[tokio::test]
async fn test_root_detection_variants() {
    let (_source, store) = store();
    let roots = store.get_root_categories().await;
    let mut root_ids = ids(&roots, |c| c.id.as_str());
    root_ids.sort();
    // empty, "null" and quoted-empty parents are roots; "1" and quoted "1" are not
    assert_eq!(root_ids, vec!["1", "3", "5"]);
    assert!(roots.iter().all(|c| c.is_root()));
}

#[tokio::test]
async fn test_lookups_are_idempotent() {
    let (source, store) = store();
    let first = store.get_product_by_id("p2").await.unwrap();
    let second = store.get_product_by_id("p2").await.unwrap();
    assert_eq!(first, second);

    let a = store.get_products_by_category("2").await.unwrap();
    let b = store.get_products_by_category("2").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);

    assert_eq!(source.fetch_count(Dataset::Products), 1);
}

#[tokio::test]
async fn test_blank_inputs_do_not_fetch() {
    let (source, store) = store();
    assert!(store.search_products("").await.unwrap().is_empty());
    assert!(store.search_products("   ").await.unwrap().is_empty());
    assert!(store.get_products_by_category("").await.unwrap().is_empty());
    assert!(store.get_products_by_category("  ").await.unwrap().is_empty());
    assert_eq!(source.fetch_count(Dataset::Products), 0);
}

#[tokio::test]
async fn test_search_matches_any_field_case_insensitively() {
    let (_source, store) = store();

    let by_name = store.search_products("WIDGET").await.unwrap();
    assert_eq!(ids(&by_name, |p| p.id.as_str()), vec!["p1"]);

    let by_description = store.search_products("winding").await.unwrap();
    assert_eq!(ids(&by_description, |p| p.id.as_str()), vec!["p3"]);

    let by_brand = store.search_products("acme").await.unwrap();
    assert_eq!(ids(&by_brand, |p| p.id.as_str()), vec!["p1", "p5"]);

    let by_category_name = store.search_products("accessories").await.unwrap();
    assert_eq!(ids(&by_category_name, |p| p.id.as_str()), vec!["p5"]);

    assert!(store.search_products("nothing-matches").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_enrichment_fills_only_missing_fields() {
    let (_source, store) = store();
    let widget = store.get_product_by_id("p1").await.unwrap().unwrap();
    assert_eq!(widget.price, dec!(19.99));
    assert_eq!(widget.rating, dec!(4.0));
    assert_eq!(widget.reviews_count, 7);
    assert!(widget.is_on_sale);

    let charger = store.get_product_by_id("p5").await.unwrap().unwrap();
    assert_eq!(charger.price, dec!(1.00));
}

#[tokio::test]
async fn test_sponsored_sampling_is_bounded_and_seedable() {
    let (_source, store) = store();

    let all = store.get_sponsored_products(10, None).await.unwrap();
    assert_eq!(all.len(), 5);

    let a = store
        .get_sponsored_products_with_rng(3, None, &mut StdRng::seed_from_u64(42))
        .await
        .unwrap();
    let b = store
        .get_sponsored_products_with_rng(3, None, &mut StdRng::seed_from_u64(42))
        .await
        .unwrap();
    assert_eq!(a.len(), 3);
    assert_eq!(a, b);

    assert!(store.get_sponsored_products(0, None).await.unwrap().is_empty());
    assert!(store.get_sponsored_products(3, Some("99")).await.unwrap().is_empty());
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_categories_failure_is_cached_empty() {
    let (source, store) = store();
    source.fail(Dataset::Categories, "offline");

    assert!(store.get_categories().await.is_empty());
    source.recover(Dataset::Categories);
    assert!(store.get_categories().await.is_empty());
    assert_eq!(source.fetch_count(Dataset::Categories), 1);

    store.clear_cache();
    assert_eq!(store.get_categories().await.len(), 5);
}

#[tokio::test]
async fn test_malformed_categories_are_cached_empty() {
    let (_source, store) = fixture_store("", PRODUCTS);
    assert!(store.get_categories().await.is_empty());
    assert!(store.get_root_categories().await.is_empty());
}

#[tokio::test]
async fn test_products_failure_propagates_and_retries() {
    let (source, store) = store();
    source.fail(Dataset::Products, "offline");

    assert!(matches!(store.get_products().await, Err(CatalogError::Io(_))));
    assert!(store.get_product_by_id("p1").await.is_err());
    assert!(store.search_products("widget").await.is_err());

    source.recover(Dataset::Products);
    assert_eq!(store.get_products().await.unwrap().len(), 5);
    assert_eq!(source.fetch_count(Dataset::Products), 4);
}

#[tokio::test]
async fn test_fetch_timeout() {
    let source = Arc::new(MemorySource::new(CATEGORIES, PRODUCTS).with_delay(Duration::from_millis(200)));
    let store = CatalogStore::builder(source.clone())
        .fetch_timeout(Some(Duration::from_millis(20)))
        .build();

    assert!(matches!(
        store.get_products().await,
        Err(CatalogError::Timeout {
            dataset: Dataset::Products,
            timeout_ms: 20
        })
    ));
    assert!(store.get_categories().await.is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_first_calls_share_one_fetch() {
    let source = Arc::new(MemorySource::new(CATEGORIES, PRODUCTS).with_delay(Duration::from_millis(50)));
    let store = Arc::new(
        CatalogStore::builder(source.clone())
            .enrichment(Arc::new(FixedEnrichment::default()))
            .build(),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let products = store.get_products().await.unwrap();
            let categories = store.get_categories().await;
            (products.len(), categories.len())
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), (5, 5));
    }
    assert_eq!(source.fetch_count(Dataset::Products), 1);
    assert_eq!(source.fetch_count(Dataset::Categories), 1);
}

#[tokio::test]
async fn test_landing_categories_falls_back_to_all() {
    // no roots: every category has a parent
    let (_source, store) = fixture_store("id,name,parentCategoryId\n2,Phones,1\n4,Laptops,1\n", "id\n");
    let landing = store.landing_categories().await;
    assert_eq!(landing.len(), 2);

    let (_source, store) = fixture_store(CATEGORIES, PRODUCTS);
    let landing = store.landing_categories().await;
    assert_eq!(landing.len(), 3);

    let (source, store) = fixture_store(CATEGORIES, PRODUCTS);
    source.fail(Dataset::Categories, "offline");
    assert!(store.landing_categories().await.is_empty());
}

#[tokio::test]
async fn test_category_listings() {
    let (_source, store) = store();
    let all = store.list_categories(CategoryListing::default()).await;
    assert_eq!(ids(&all, |c| c.id.as_str()), vec!["1", "2", "3", "4", "5"]);

    let roots = store.list_categories(CategoryListing::Roots).await;
    assert_eq!(ids(&roots, |c| c.id.as_str()), vec!["1", "3", "5"]);

    let landing = store.list_categories(CategoryListing::Landing).await;
    assert_eq!(landing, roots);
}
