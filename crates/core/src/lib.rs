//! Shunny Core - Shared types library.
//!
//! This crate provides common types used across all Shunny Shop components:
//! - `storefront` - Cart, balance ledger, and checkout engine
//! - `cli` - Command-line front end driving the engine
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs and amounts, plus product and line item records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
