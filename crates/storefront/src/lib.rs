//! Shunny Shop storefront engine.
//!
//! This crate holds the cart and checkout state engine as a library so that
//! any front end can drive it:
//!
//! - [`store`] - durable key-value persistence
//! - [`cart`] - the persisted cart
//! - [`selection`] - transient per-line checkout selection
//! - [`balance`] - the balance ledger and its change notifications
//! - [`checkout`] - paying for the selected lines
//! - [`context`] - all of the above, loaded together
//!
//! Product browsing ([`catalog`], [`pagination`]) and [`favorites`] are
//! separate collaborators; checkout never depends on them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod balance;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod context;
pub mod error;
pub mod favorites;
pub mod pagination;
pub mod selection;
pub mod store;

pub use balance::{BalanceChanged, BalanceLedger, BalanceSubscription, InsufficientFunds};
pub use checkout::{CheckoutError, CheckoutReceipt};
pub use config::ShopConfig;
pub use context::ShopContext;
pub use error::{Result, ShopError};
pub use store::{FileStore, KeyValueStore, MemoryStore};
