//! Subcommand implementations.

pub mod balance;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod favorites;
