//! Transient per-line selection for the next checkout.
//!
//! Selection is never persisted. Its domain always tracks the cart's product
//! IDs: [`SelectionState::reconcile`] must run after every cart change, which
//! [`ShopContext`](crate::context::ShopContext) does for its own mutations.

use std::collections::HashMap;

use shunny_core::{Amount, LineItem, ProductId};

use crate::cart::Cart;

/// Boolean selection flag per cart line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: HashMap<ProductId, bool>,
}

impl SelectionState {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selection reconciled against `cart`, with every line unselected.
    #[must_use]
    pub fn for_cart(cart: &Cart) -> Self {
        let mut selection = Self::new();
        selection.reconcile(cart);
        selection
    }

    /// Align the selection domain with the cart's IDs.
    ///
    /// Lines new to the cart start unselected, existing flags are kept, and
    /// flags for lines no longer in the cart are dropped.
    pub fn reconcile(&mut self, cart: &Cart) {
        let previous = std::mem::take(&mut self.selected);
        self.selected = cart
            .ids()
            .map(|id| (id, previous.get(&id).copied().unwrap_or(false)))
            .collect();
    }

    /// Flip the flag for `id`; an absent entry counts as unselected.
    pub fn toggle(&mut self, id: ProductId) {
        let flag = self.selected.entry(id).or_insert(false);
        *flag = !*flag;
    }

    /// Set the flag for `id` explicitly.
    pub fn set(&mut self, id: ProductId, selected: bool) {
        self.selected.insert(id, selected);
    }

    /// Select every line unless all are already selected, in which case deselect all.
    pub fn toggle_all(&mut self, cart: &Cart) {
        let target = !self.all_selected(cart);
        self.selected = cart.ids().map(|id| (id, target)).collect();
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: ProductId) -> bool {
        self.selected.get(&id).copied().unwrap_or(false)
    }

    /// Whether `id` has an entry at all (selected or not).
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.selected.contains_key(&id)
    }

    /// Number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether no entries are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// True when the cart is non-empty and every line is selected.
    #[must_use]
    pub fn all_selected(&self, cart: &Cart) -> bool {
        !cart.is_empty() && cart.ids().all(|id| self.is_selected(id))
    }

    /// Selected lines, in cart order.
    #[must_use]
    pub fn selected_items<'a>(&self, cart: &'a Cart) -> Vec<&'a LineItem> {
        cart.items()
            .iter()
            .filter(|item| self.is_selected(item.id))
            .collect()
    }

    /// Sum of `unit_price × quantity` over the selected lines.
    #[must_use]
    pub fn subtotal(&self, cart: &Cart) -> Amount {
        self.selected_items(cart)
            .into_iter()
            .fold(Amount::ZERO, |sum, item| sum.saturating_add(item.line_total()))
    }
}
