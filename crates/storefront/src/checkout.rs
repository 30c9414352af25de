//! Checkout: pay for the selected cart lines from the balance.
//!
//! The protocol is select → validate → commit → notify → clear:
//!
//! 1. Collect the selected lines and their subtotal.
//! 2. Stop with [`CheckoutError::EmptySelection`] if nothing is selected.
//! 3. Debit the subtotal. The ledger persists the new balance and notifies
//!    observers before returning.
//! 4. Remove the purchased lines from the cart and reconcile the selection.
//!
//! A debit is never rolled back: if writing the cart fails after step 3, the
//! failure is logged by the cart store and the in-memory cart still drops the
//! purchased lines.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shunny_core::{Amount, LineItem, ProductId};
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::balance::BalanceLedger;
use crate::cart::CartStore;
use crate::selection::SelectionState;

/// Reasons a checkout did not go through. Neither changes any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// No cart line is selected.
    #[error("no items selected")]
    EmptySelection,

    /// The balance does not cover the subtotal.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },
}

/// Record of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    /// Unique receipt identifier.
    pub id: Uuid,
    /// Lines that were paid for, as they were in the cart.
    pub purchased: Vec<LineItem>,
    /// Number of distinct lines purchased.
    pub purchased_count: usize,
    /// Amount debited.
    pub subtotal: Amount,
    /// Balance after the debit.
    pub remaining_balance: Amount,
    /// When the debit was committed.
    pub completed_at: DateTime<Utc>,
}

/// Pay for the selected lines of `carts` from `ledger`.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptySelection`] when nothing is selected and
/// [`CheckoutError::InsufficientFunds`] when the balance does not cover the
/// subtotal. In both cases the cart, the selection, and the balance are unchanged.
#[instrument(skip_all, fields(lines = carts.cart().len()))]
pub fn checkout(
    carts: &mut CartStore,
    selection: &mut SelectionState,
    ledger: &mut BalanceLedger,
) -> Result<CheckoutReceipt, CheckoutError> {
    let purchased: Vec<LineItem> = selection
        .selected_items(carts.cart())
        .into_iter()
        .cloned()
        .collect();

    if purchased.is_empty() {
        debug!("Checkout with empty selection");
        return Err(CheckoutError::EmptySelection);
    }

    let subtotal = selection.subtotal(carts.cart());

    let remaining_balance = ledger
        .debit(subtotal)
        .map_err(|e| CheckoutError::InsufficientFunds {
            required: subtotal,
            available: e.available,
        })?;
    let completed_at = Utc::now();

    let ids: Vec<ProductId> = purchased.iter().map(|item| item.id).collect();
    carts.remove_items(&ids);
    selection.reconcile(carts.cart());

    let receipt = CheckoutReceipt {
        id: Uuid::new_v4(),
        purchased_count: purchased.len(),
        purchased,
        subtotal,
        remaining_balance,
        completed_at,
    };

    info!(
        receipt_id = %receipt.id,
        purchased = receipt.purchased_count,
        subtotal = %receipt.subtotal,
        remaining = %receipt.remaining_balance,
        "Checkout completed"
    );

    Ok(receipt)
}
