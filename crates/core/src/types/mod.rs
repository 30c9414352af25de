//! Core types for Shunny Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod amount;
pub mod id;
pub mod product;

pub use amount::{Amount, AmountError};
pub use id::*;
pub use product::{CartProduct, LineItem, NewProduct, Product, Rating};
