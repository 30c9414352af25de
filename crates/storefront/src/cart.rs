//! Persisted shopping cart.
//!
//! [`Cart`] is the in-memory collection with its invariants (unique product
//! IDs, every quantity at least 1, insertion order preserved). [`CartStore`]
//! owns a `Cart` and writes it under [`keys::CART`] after every mutation.
//!
//! Mutations referencing an absent product are silent no-ops so repeated UI
//! actions stay idempotent.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use shunny_core::{Amount, CartProduct, LineItem, ProductId};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::store::{self, KeyValueStore, StoreError, keys};

/// Errors that can occur when decoding a persisted cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartDecodeError {
    /// Two lines share a product ID.
    #[error("duplicate product id {0} in cart")]
    DuplicateId(ProductId),
}

/// Clamp a requested quantity into the stored range (at least 1).
fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(1)).unwrap_or(u32::MAX)
}

/// Ordered cart lines keyed by product ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from decoded lines, enforcing the cart invariants.
    ///
    /// Lines with quantity zero are dropped, as if they had been removed.
    ///
    /// # Errors
    ///
    /// Returns `CartDecodeError` on a duplicate product ID.
    pub fn from_items(mut items: Vec<LineItem>) -> Result<Self, CartDecodeError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id) {
                return Err(CartDecodeError::DuplicateId(item.id));
            }
        }
        items.retain(|item| {
            if item.quantity == 0 {
                warn!(product_id = %item.id, "Dropping zero-quantity cart line");
            }
            item.quantity > 0
        });
        Ok(Self { items })
    }

    /// Read and validate the cart persisted in `store`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` for a duplicate product ID and other
    /// `StoreError` variants if the value cannot be read or decoded.
    pub fn read(store: &dyn KeyValueStore) -> Result<Option<Self>, StoreError> {
        store::load_checked(store, keys::CART, Self::from_items)
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up the line for `id`.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether the cart holds a line for `id`.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Product IDs in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.items.iter().map(|item| item.id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of line totals over all lines, selected or not.
    #[must_use]
    pub fn total_price(&self) -> Amount {
        self.items
            .iter()
            .fold(Amount::ZERO, |sum, item| sum.saturating_add(item.line_total()))
    }

    fn add(&mut self, product: CartProduct, quantity: i64) {
        if let Some(existing) = self.items.iter_mut().find(|item| item.id == product.id) {
            existing.quantity =
                clamp_quantity(i64::from(existing.quantity).saturating_add(quantity));
        } else {
            self.items
                .push(LineItem::new(product, clamp_quantity(quantity)));
        }
    }

    fn set_quantity(&mut self, id: ProductId, quantity: i64) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.quantity = clamp_quantity(quantity);
                true
            }
            None => false,
        }
    }

    fn remove_all(&mut self, ids: &[ProductId]) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id));
        before - self.items.len()
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

/// The cart plus its persistence.
///
/// A failed write is logged and swallowed; the in-memory cart stays the
/// source of truth for the rest of the session.
pub struct CartStore {
    cart: Cart,
    store: Arc<dyn KeyValueStore>,
}

impl CartStore {
    /// Load the persisted cart, or start empty when it is absent or unreadable.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let cart = match Cart::read(store.as_ref()) {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted cart");
                Cart::new()
            }
        };
        debug!(lines = cart.len(), "Cart loaded");
        Self { cart, store }
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add `quantity` of `product`, merging into an existing line.
    ///
    /// The resulting quantity is at least 1 even when `quantity` is zero or
    /// negative.
    pub fn add_item(&mut self, product: impl Into<CartProduct>, quantity: i64) {
        let product = product.into();
        let id = product.id;
        self.cart.add(product, quantity);
        debug!(product_id = %id, delta = quantity, "Added to cart");
        self.persist();
    }

    /// Set the quantity for `id` (at least 1). Returns `false` if `id` is not in the cart.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> bool {
        if !self.cart.set_quantity(id, quantity) {
            return false;
        }
        debug!(product_id = %id, quantity, "Updated cart quantity");
        self.persist();
        true
    }

    /// Remove the line for `id`. Returns `false` if `id` is not in the cart.
    pub fn remove_item(&mut self, id: ProductId) -> bool {
        self.remove_items(&[id]) > 0
    }

    /// Remove every line whose ID is in `ids`, persisting once. Returns the number removed.
    #[instrument(skip(self), fields(requested = ids.len()))]
    pub fn remove_items(&mut self, ids: &[ProductId]) -> usize {
        let removed = self.cart.remove_all(ids);
        if removed > 0 {
            debug!(removed, "Removed from cart");
            self.persist();
        }
        removed
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.cart = Cart::new();
        debug!("Cleared cart");
        self.persist();
    }

    /// Write the cart, reporting any failure.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    pub fn flush(&self) -> Result<(), StoreError> {
        store::save_json(self.store.as_ref(), keys::CART, &self.cart)
    }

    fn persist(&self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "Failed to persist cart; keeping in-memory state");
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}
