//! Shared shop state for one session.

use std::sync::Arc;

use shunny_core::{Amount, CartProduct, LineItem, ProductId};
use tracing::{debug, instrument};

use crate::balance::{BalanceLedger, BalanceNotifier, BalanceSubscription, LedgerError};
use crate::cart::{Cart, CartStore};
use crate::checkout::{self, CheckoutError, CheckoutReceipt};
use crate::config::ShopConfig;
use crate::favorites::FavoritesStore;
use crate::selection::SelectionState;
use crate::store::{KeyValueStore, StoreError};

/// Cart, selection, balance, and favorites, loaded from one store.
///
/// Cart mutations made through the context keep the selection reconciled
/// with the cart. Call [`flush`](Self::flush) before dropping the context to
/// learn whether the final write succeeded.
#[derive(Debug)]
pub struct ShopContext {
    carts: CartStore,
    selection: SelectionState,
    ledger: BalanceLedger,
    favorites: FavoritesStore,
}

impl ShopContext {
    /// Load all persisted state from `store`.
    ///
    /// The balance is seeded from `config.starting_balance` only when none
    /// has been persisted. The selection starts empty for every cart line.
    #[instrument(skip_all)]
    pub fn open(store: Arc<dyn KeyValueStore>, config: &ShopConfig) -> Self {
        let carts = CartStore::load(Arc::clone(&store));
        let ledger = BalanceLedger::load(Arc::clone(&store), config.starting_balance);
        let favorites = FavoritesStore::load(store);
        let selection = SelectionState::for_cart(carts.cart());

        debug!(
            lines = carts.cart().len(),
            balance = %ledger.read(),
            favorites = favorites.ids().len(),
            "Shop context opened"
        );

        Self {
            carts,
            selection,
            ledger,
            favorites,
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        self.carts.cart()
    }

    /// Add `quantity` of `product` and reconcile the selection.
    pub fn add_item(&mut self, product: impl Into<CartProduct>, quantity: i64) {
        self.carts.add_item(product, quantity);
        self.selection.reconcile(self.carts.cart());
    }

    /// Set the quantity of a line (at least 1). Returns `false` if `id` is not in the cart.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> bool {
        self.carts.set_quantity(id, quantity)
    }

    /// Remove a line and reconcile the selection. Returns `false` if `id` is not in the cart.
    pub fn remove_item(&mut self, id: ProductId) -> bool {
        let removed = self.carts.remove_item(id);
        self.selection.reconcile(self.carts.cart());
        removed
    }

    /// Empty the cart and the selection.
    pub fn clear_cart(&mut self) {
        self.carts.clear();
        self.selection.reconcile(self.carts.cart());
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// The current selection.
    #[must_use]
    pub const fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Flip the selection of a cart line. Returns `false` if `id` is not in the cart.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if !self.carts.cart().contains(id) {
            return false;
        }
        self.selection.toggle(id);
        true
    }

    /// Select or deselect a cart line. Returns `false` if `id` is not in the cart.
    pub fn select(&mut self, id: ProductId, selected: bool) -> bool {
        if !self.carts.cart().contains(id) {
            return false;
        }
        self.selection.set(id, selected);
        true
    }

    /// Select every line, or deselect all if every line is already selected.
    pub fn toggle_all(&mut self) {
        self.selection.toggle_all(self.carts.cart());
    }

    /// True when the cart is non-empty and every line is selected.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        self.selection.all_selected(self.carts.cart())
    }

    /// Selected lines, in cart order.
    #[must_use]
    pub fn selected_items(&self) -> Vec<&LineItem> {
        self.selection.selected_items(self.carts.cart())
    }

    /// Total price of the selected lines.
    #[must_use]
    pub fn subtotal(&self) -> Amount {
        self.selection.subtotal(self.carts.cart())
    }

    // =========================================================================
    // Balance
    // =========================================================================

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> Amount {
        self.ledger.read()
    }

    /// The balance ledger.
    #[must_use]
    pub const fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    /// Register a balance observer.
    #[must_use]
    pub fn subscribe(&self) -> BalanceSubscription {
        self.ledger.subscribe()
    }

    /// A handle for registering balance observers without borrowing the context.
    #[must_use]
    pub fn notifier(&self) -> BalanceNotifier {
        self.ledger.notifier()
    }

    /// Add funds to the balance. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Overflow` if the result is not representable.
    pub fn top_up(&mut self, amount: Amount) -> Result<Amount, LedgerError> {
        self.ledger.top_up(amount)
    }

    /// Pay for the selected lines.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` when nothing is selected or the balance is too
    /// low; no state changes in either case.
    pub fn checkout(&mut self) -> Result<CheckoutReceipt, CheckoutError> {
        checkout::checkout(&mut self.carts, &mut self.selection, &mut self.ledger)
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Favorite product IDs.
    #[must_use]
    pub const fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    /// Mutable access to favorites. Checkout never reads them.
    pub const fn favorites_mut(&mut self) -> &mut FavoritesStore {
        &mut self.favorites
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Write cart, balance, and favorites.
    ///
    /// Every write is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first `StoreError` encountered.
    pub fn flush(&self) -> Result<(), StoreError> {
        let results = [
            self.carts.flush(),
            self.ledger.flush(),
            self.favorites.flush(),
        ];
        results.into_iter().collect()
    }
}
