//! Waman Core - Shared types library.
//!
//! This crate provides common types used across the Waman storefront
//! components:
//! - `cart` - Cart and wishlist state layer for the shop frontend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, variants, and
//!   cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
