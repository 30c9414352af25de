//! Product catalog collaborator.
//!
//! The cart engine never calls the catalog; front ends use it to find
//! products and hand them to [`CartStore::add_item`](crate::cart::CartStore::add_item).
//!
//! # Providers
//!
//! - [`HttpCatalog`] - the shop backend over HTTP, cached with `moka`
//! - [`StaticCatalog`] - a fixed product list (offline use and tests)
//!
//! Backends return the full list; filtering, sorting, and limiting happen
//! client-side in [`ProductFilter::apply`].

mod http;

pub use http::HttpCatalog;

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use shunny_core::{Amount, Product, ProductId};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when fetching products.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}")]
    Status { status: u16 },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend reported a failure in its response envelope.
    #[error("backend error: {0}")]
    Backend(String),

    /// No product with this ID.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// A new product was rejected before being sent.
    #[error("invalid product: {0}")]
    Invalid(String),

    /// A failed fetch shared by concurrent callers of the cache.
    #[error(transparent)]
    Shared(Arc<CatalogError>),
}

impl CatalogError {
    /// The underlying error, looking through [`CatalogError::Shared`].
    #[must_use]
    pub fn inner(&self) -> &Self {
        match self {
            Self::Shared(inner) => inner.inner(),
            other => other,
        }
    }
}

/// Product ordering offered by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    /// Backend order.
    #[default]
    None,
    PriceAsc,
    PriceDesc,
    RatingDesc,
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            "rating-desc" => Ok(Self::RatingDesc),
            _ => Err(format!("invalid sort option: {s}")),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::PriceAsc => write!(f, "price-asc"),
            Self::PriceDesc => write!(f, "price-desc"),
            Self::RatingDesc => write!(f, "rating-desc"),
        }
    }
}

/// Search, category, sort, and limit applied to a product list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    /// Case-insensitive category name; `all` matches every category.
    pub category: Option<String>,
    pub sort: SortOption,
    /// Keep at most this many products (after sorting).
    pub limit: Option<usize>,
}

impl ProductFilter {
    /// Filter, sort, and truncate `products`.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(str::to_lowercase);

        let mut matched: Vec<Product> = products
            .iter()
            .filter(|p| {
                search
                    .as_ref()
                    .is_none_or(|s| p.title.to_lowercase().contains(s))
            })
            .filter(|p| {
                category
                    .as_ref()
                    .is_none_or(|c| p.category.to_lowercase() == *c)
            })
            .cloned()
            .collect();

        match self.sort {
            SortOption::None => {}
            SortOption::PriceAsc => matched.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOption::PriceDesc => matched.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOption::RatingDesc => matched.sort_by(compare_rating_desc),
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Higher rating first; unrated products last.
fn compare_rating_desc(a: &Product, b: &Product) -> Ordering {
    match (a.rating, b.rating) {
        (Some(a), Some(b)) => b.rate.total_cmp(&a.rate),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A source of catalog products.
pub trait CatalogProvider: Send + Sync {
    /// Fetch the products matching `filter`.
    fn fetch_products(
        &self,
        filter: &ProductFilter,
    ) -> impl Future<Output = Result<Vec<Product>, CatalogError>> + Send;

    /// Fetch a single product.
    fn fetch_product(&self, id: ProductId)
    -> impl Future<Output = Result<Product, CatalogError>> + Send;
}

/// A catalog over a fixed list of products.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

impl CatalogProvider for StaticCatalog {
    async fn fetch_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        Ok(filter.apply(&self.products))
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }
}

/// Look up each of `ids` in `catalog`, keeping their order.
///
/// An ID the catalog cannot resolve, for any reason, yields a placeholder
/// product titled `Product #<id>` with a zero price.
pub async fn resolve_products(catalog: &impl CatalogProvider, ids: &[ProductId]) -> Vec<Product> {
    let mut products = Vec::with_capacity(ids.len());
    for &id in ids {
        let product = match catalog.fetch_product(id).await {
            Ok(product) => product,
            Err(e) => {
                debug!(product_id = %id, error = %e, "Using placeholder product");
                placeholder(id)
            }
        };
        products.push(product);
    }
    products
}

fn placeholder(id: ProductId) -> Product {
    Product {
        id,
        title: format!("Product #{id}"),
        price: Amount::ZERO,
        description: String::new(),
        category: String::new(),
        image: None,
        rating: None,
    }
}
