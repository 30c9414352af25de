//! Favorite products.
//!
//! An ordered set of product IDs persisted under [`keys::FAVORITES`]. It is
//! independent of the cart: checkout never reads or writes it.

use std::collections::HashSet;
use std::sync::Arc;

use shunny_core::ProductId;
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::{self, KeyValueStore, StoreError, keys};

/// Errors that can occur when decoding persisted favorites.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FavoritesDecodeError {
    /// The same product ID appears twice.
    #[error("duplicate product id {0} in favorites")]
    DuplicateId(ProductId),
}

/// Accept decoded `ids` if they hold no duplicates.
fn validate(ids: Vec<ProductId>) -> Result<Vec<ProductId>, FavoritesDecodeError> {
    let mut seen = HashSet::with_capacity(ids.len());
    match ids.iter().find(|id| !seen.insert(**id)) {
        Some(id) => Err(FavoritesDecodeError::DuplicateId(*id)),
        None => Ok(ids),
    }
}

/// Favorite product IDs in the order they were added.
pub struct FavoritesStore {
    ids: Vec<ProductId>,
    store: Arc<dyn KeyValueStore>,
}

impl FavoritesStore {
    /// Load persisted favorites, or start empty when absent or unreadable.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let ids = match store::load_checked(store.as_ref(), keys::FAVORITES, validate) {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted favorites");
                Vec::new()
            }
        };
        Self { ids, store }
    }

    /// Favorite IDs in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    /// Whether `id` is a favorite.
    #[must_use]
    pub fn is_favorite(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    /// Mark `id` as a favorite. Adding an existing favorite is a no-op.
    pub fn add(&mut self, id: ProductId) {
        if self.is_favorite(id) {
            return;
        }
        self.ids.push(id);
        debug!(product_id = %id, "Added favorite");
        self.persist();
    }

    /// Unmark `id`. Removing an absent favorite is a no-op.
    pub fn remove(&mut self, id: ProductId) {
        let before = self.ids.len();
        self.ids.retain(|existing| *existing != id);
        if self.ids.len() != before {
            debug!(product_id = %id, "Removed favorite");
            self.persist();
        }
    }

    /// Flip `id` and return whether it is now a favorite.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if self.is_favorite(id) {
            self.remove(id);
            false
        } else {
            self.add(id);
            true
        }
    }

    /// Write the favorites, reporting any failure.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    pub fn flush(&self) -> Result<(), StoreError> {
        store::save_json(self.store.as_ref(), keys::FAVORITES, &self.ids)
    }

    fn persist(&self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "Failed to persist favorites; keeping in-memory state");
        }
    }
}

impl std::fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}
