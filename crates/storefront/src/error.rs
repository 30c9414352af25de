//! Unified error handling for front ends.
//!
//! Each engine concern has its own error type. `ShopError` gathers them so a
//! front end can propagate any of them with `?` and show the user a message
//! that does not leak storage or network details.

use shunny_core::{AmountError, ProductId};
use thiserror::Error;

use crate::balance::{InsufficientFunds, LedgerError};
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::store::StoreError;

/// Application-level error type for the shop.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Persisted state could not be read or written.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A balance change was rejected.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Checkout did not go through.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Product catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A monetary value was invalid.
    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    /// The product is not in the cart.
    #[error("Not in cart: {0}")]
    NotInCart(ProductId),
}

impl From<InsufficientFunds> for ShopError {
    fn from(err: InsufficientFunds) -> Self {
        Self::Ledger(LedgerError::from(err))
    }
}

impl ShopError {
    /// A message suitable for showing to the shopper.
    ///
    /// Storage and network failures are summarized without internal details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(_) => "Your changes could not be saved".to_string(),
            Self::Catalog(err) => match err.inner() {
                CatalogError::NotFound(id) => format!("Product {id} was not found"),
                CatalogError::Invalid(reason) => format!("Product not added: {reason}"),
                _ => "Products are unavailable right now".to_string(),
            },
            Self::Checkout(CheckoutError::EmptySelection) => {
                "Select at least one item to check out".to_string()
            }
            Self::Checkout(CheckoutError::InsufficientFunds {
                required,
                available,
            }) => format!(
                "Insufficient balance: the selected items cost {}, but only {} is available",
                required.display_rupiah(),
                available.display_rupiah()
            ),
            Self::Ledger(LedgerError::InsufficientFunds(e)) => format!(
                "Insufficient balance: {} requested, {} available",
                e.requested.display_rupiah(),
                e.available.display_rupiah()
            ),
            Self::Ledger(LedgerError::Overflow) => "That amount is too large".to_string(),
            Self::NotInCart(id) => format!("Product {id} is not in your cart"),
            Self::Config(_) | Self::Amount(_) => self.to_string(),
        }
    }
}

/// Result type alias for `ShopError`.
pub type Result<T> = std::result::Result<T, ShopError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shunny_core::Amount;

    use super::*;

    #[test]
    fn test_store_errors_hide_details() {
        let err = ShopError::from(StoreError::Unavailable("disk on fire".to_string()));
        let message = err.user_message();
        assert!(!message.contains("disk"));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_insufficient_funds_message_uses_rupiah() {
        let err = ShopError::from(CheckoutError::InsufficientFunds {
            required: Amount::from_units(1100),
            available: Amount::from_units(1000),
        });
        assert_eq!(
            err.user_message(),
            "Insufficient balance: the selected items cost Rp 1.100, but only Rp 1.000 is available"
        );
    }

    #[test]
    fn test_debit_error_converts_into_ledger_variant() {
        let err = ShopError::from(InsufficientFunds {
            requested: Amount::from_units(5),
            available: Amount::ZERO,
        });
        assert!(matches!(
            err,
            ShopError::Ledger(LedgerError::InsufficientFunds(_))
        ));
    }

    #[test]
    fn test_catalog_not_found_message() {
        let err = ShopError::from(CatalogError::NotFound(ProductId::new(7)));
        assert_eq!(err.user_message(), "Product 7 was not found");
    }

    #[test]
    fn test_invalid_product_message_explains_reason() {
        let err = ShopError::from(CatalogError::Invalid("title is required".to_string()));
        assert_eq!(err.user_message(), "Product not added: title is required");
    }

    #[test]
    fn test_shared_catalog_error_is_unwrapped() {
        let shared = CatalogError::Shared(std::sync::Arc::new(CatalogError::Status { status: 502 }));
        let err = ShopError::from(shared);
        assert_eq!(err.user_message(), "Products are unavailable right now");
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_empty_selection_message() {
        let err = ShopError::from(CheckoutError::EmptySelection);
        assert_eq!(err.user_message(), "Select at least one item to check out");
    }
}
