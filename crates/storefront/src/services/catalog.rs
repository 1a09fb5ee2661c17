//! Catalog query layer.
//!
//! Resolves the product list from exactly one source, in order:
//!
//! 1. custom products in the document store, if there are any
//! 2. the remote catalog API
//! 3. the embedded sample products
//!
//! Categories and category filters are derived from the resolved list so the
//! three views never disagree. Successful resolutions are cached with `moka`;
//! fallback results are not, so the next call tries the remote sources again.

use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info, instrument, warn};

use fakestore_core::{Product, ProductId};

use super::products::ProductService;
use crate::catalog::{CatalogClient, fallback};

const CATALOG_CACHE_KEY: &str = "catalog";

/// Where a resolved catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    CustomProducts,
    RemoteCatalog,
    Fallback,
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CustomProducts => "custom products",
            Self::RemoteCatalog => "remote catalog",
            Self::Fallback => "sample products",
        };
        f.write_str(name)
    }
}

/// A product list and its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCatalog {
    pub source: CatalogSource,
    pub products: Vec<Product>,
}

impl ResolvedCatalog {
    /// Distinct categories in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for product in &self.products {
            if !categories.contains(&product.category) {
                categories.push(product.category.clone());
            }
        }
        categories
    }

    /// Products in `category`, in list order.
    #[must_use]
    pub fn in_category(&self, category: &str) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }
}

/// Read-only catalog access with graceful degradation.
#[derive(Clone)]
pub struct CatalogService {
    client: CatalogClient,
    products: ProductService,
    cache: Option<Cache<String, ResolvedCatalog>>,
}

impl CatalogService {
    /// Create a catalog service; `cache_ttl` of `None` disables caching.
    #[must_use]
    pub fn new(client: CatalogClient, products: ProductService, cache_ttl: Option<Duration>) -> Self {
        let cache = cache_ttl.map(|ttl| Cache::builder().max_capacity(1).time_to_live(ttl).build());
        Self {
            client,
            products,
            cache,
        }
    }

    /// The underlying API client.
    #[must_use]
    pub const fn client(&self) -> &CatalogClient {
        &self.client
    }

    /// Resolve the catalog, using the cache when it holds a fresh entry.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> ResolvedCatalog {
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(CATALOG_CACHE_KEY).await
        {
            debug!(source = %hit.source, "Catalog cache hit");
            return hit;
        }

        let resolved = self.resolve_uncached().await;
        if let Some(cache) = &self.cache
            && resolved.source != CatalogSource::Fallback
        {
            cache
                .insert(CATALOG_CACHE_KEY.to_string(), resolved.clone())
                .await;
        }
        resolved
    }

    async fn resolve_uncached(&self) -> ResolvedCatalog {
        match self.products.list_custom().await {
            Ok(custom) if !custom.is_empty() => {
                info!(count = custom.len(), "Using custom products");
                return ResolvedCatalog {
                    source: CatalogSource::CustomProducts,
                    products: custom,
                };
            }
            Ok(_) => debug!("No custom products, using remote catalog"),
            Err(e) => warn!(error = %e, "Custom products unavailable, using remote catalog"),
        }

        match self.client.products().await {
            Ok(products) => ResolvedCatalog {
                source: CatalogSource::RemoteCatalog,
                products,
            },
            Err(e) => {
                warn!(error = %e, "Remote catalog unavailable, serving sample products");
                ResolvedCatalog {
                    source: CatalogSource::Fallback,
                    products: fallback::sample_products(),
                }
            }
        }
    }

    /// All products.
    pub async fn products(&self) -> Vec<Product> {
        self.resolve().await.products
    }

    /// Distinct categories of the resolved products.
    pub async fn categories(&self) -> Vec<String> {
        self.resolve().await.categories()
    }

    /// Resolved products in one category.
    pub async fn products_in_category(&self, category: &str) -> Vec<Product> {
        self.resolve().await.in_category(category)
    }

    /// One product by storefront id.
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        self.resolve()
            .await
            .products
            .into_iter()
            .find(|p| p.id == id)
    }

    /// Drop the cached catalog (after product administration).
    pub async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(CATALOG_CACHE_KEY).await;
        }
    }
}
