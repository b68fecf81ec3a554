//! cartsync Core - Shared cart and wishlist types.
//!
//! This crate provides the domain types used across all cartsync components:
//! - `storefront` - List synchronization subsystem and its JSON API
//! - `cli` - Command-line tools for migrations and list inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows the list
//! invariants to be tested without any backing store.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, quantities, line items, list owners, prices
//!   and cart totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
