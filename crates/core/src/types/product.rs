//! Catalog products and cart line items.

use serde::{Deserialize, Serialize};

use crate::types::amount::Amount;
use crate::types::id::ProductId;

/// Customer rating summary returned by the catalog backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average rating.
    pub rate: f64,
    /// Number of ratings.
    pub count: u64,
}

/// A product as listed by the catalog backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub price: Amount,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
}

/// The subset of product data the cart keeps for each line.
///
/// Callers outside the catalog (e.g., a favorites list that only knows an ID
/// and a title) can build one directly; a missing price counts as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub price: Amount,
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            image: product.image.clone(),
            price: product.price,
        }
    }
}

impl From<Product> for CartProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image: product.image,
            price: product.price,
        }
    }
}

/// A product to be added to the catalog backend.
///
/// Sent as `{title, price, description, category, image, rating}` with the
/// price and rating as JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(serialize_with = "price_as_number")]
    pub price: Amount,
    pub description: String,
    pub category: String,
    pub image: String,
    /// Average rating between 0 and 5.
    pub rating: f64,
}

impl NewProduct {
    /// Category preselected for new products.
    pub const DEFAULT_CATEGORY: &str = "electronics";

    /// Rating preselected for new products.
    pub const DEFAULT_RATING: f64 = 4.5;
}

fn price_as_number<S: serde::Serializer>(price: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float::serialize(&price.value(), serializer)
}

/// One product entry in the cart.
///
/// Persisted as `{id, title, image, price, quantity}`. `quantity` is at least 1
/// for every line held by a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "image", default)]
    pub image_ref: Option<String>,
    #[serde(rename = "price", default)]
    pub unit_price: Amount,
    pub quantity: u32,
}

impl LineItem {
    /// Create a line for `product` with the given quantity.
    #[must_use]
    pub fn new(product: CartProduct, quantity: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image_ref: product.image,
            unit_price: product.price,
            quantity,
        }
    }

    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Amount {
        self.unit_price.times(self.quantity)
    }
}
