//! Sponsored slot backfill
//!
//! The ad server returns product ids for sponsored slots, often fewer than
//! requested. Backfill resolves those ids against the catalog and tops the
//! slots up with random sponsored products.

use std::collections::HashSet;

use shared::Product;

use crate::error::CatalogResult;
use crate::store::CatalogStore;

/// Resolve ad-server ids and backfill up to `count` products
///
/// Unknown and duplicate ids are dropped. Backfill products come from
/// `category_id` when given and never repeat an id already chosen.
pub async fn backfill_sponsored(
    store: &CatalogStore,
    ad_product_ids: &[String],
    count: usize,
    category_id: Option<&str>,
) -> CatalogResult<Vec<Product>> {
    let mut chosen: Vec<Product> = Vec::with_capacity(count);
    let mut seen = HashSet::new();

    for id in ad_product_ids {
        if chosen.len() >= count {
            break;
        }
        match store.get_product_by_id(id).await? {
            Some(product) => {
                if seen.insert(product.id.clone()) {
                    chosen.push(product);
                }
            }
            None => tracing::debug!(product_id = %id, "Ad product not in catalog, skipping"),
        }
    }

    let missing = count - chosen.len();
    if missing > 0 {
        // extra headroom for ids already chosen
        let extra = store
            .get_sponsored_products(missing + chosen.len(), category_id)
            .await?;
        let filled: Vec<Product> = extra
            .into_iter()
            .filter(|product| seen.insert(product.id.clone()))
            .take(missing)
            .collect();
        tracing::debug!(
            from_ads = chosen.len(),
            backfilled = filled.len(),
            "Sponsored slots filled"
        );
        chosen.extend(filled);
    }

    Ok(chosen)
}
