//! Catalog browsing and endpoint probing.

use std::time::Instant;

use tracing::{info, warn};

use fakestore_storefront::catalog::CatalogError;
use fakestore_storefront::state::AppState;

use super::product_line;

/// List products, optionally in one category.
pub async fn products(state: &AppState, category: Option<&str>) {
    let resolved = state.catalog().resolve().await;
    let products = match category {
        Some(category) => resolved.in_category(category),
        None => resolved.products.clone(),
    };

    info!(source = %resolved.source, count = products.len(), "Products");
    for product in &products {
        info!("{}", product_line(product));
    }
}

/// List categories.
pub async fn categories(state: &AppState) {
    let resolved = state.catalog().resolve().await;
    info!(source = %resolved.source, "Categories");
    for category in resolved.categories() {
        info!("  {category}");
    }
}

/// Hit each remote endpoint without fallback and report counts and timings.
pub async fn probe(state: &AppState) {
    let client = state.catalog().client();
    info!(base_url = %client.base_url(), "Probing catalog endpoints");

    let started = Instant::now();
    report("/products", started, &client.products().await);

    let started = Instant::now();
    let categories = client.categories().await;
    report("/products/categories", started, &categories);

    let Some(first) = categories.ok().and_then(|c| c.into_iter().next()) else {
        warn!("No category to probe /products/category with");
        return;
    };
    let endpoint = format!("/products/category/{first}");
    let started = Instant::now();
    report(&endpoint, started, &client.products_in_category(&first).await);
}

fn report<T>(endpoint: &str, started: Instant, result: &Result<Vec<T>, CatalogError>) {
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(items) => info!(endpoint, elapsed_ms, count = items.len(), "ok"),
        Err(e) => warn!(endpoint, elapsed_ms, error = %e, "failed"),
    }
}
