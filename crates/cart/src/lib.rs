//! Cart and wishlist state layer for the Waman storefront.
//!
//! This crate owns the shop's client-side cart and wishlist state for one
//! interactive session. It is a library consumed by UI event handlers; it
//! defines no routes, no templates, and no CLI.
//!
//! # Architecture
//!
//! - [`cart::Cart`] and [`wishlist::Wishlist`] are explicit state objects
//!   owned by the application shell and passed by reference to the views
//!   that need them. Reactive consumers subscribe to a summary channel
//!   instead of reaching into ambient globals.
//! - While the shopper is a guest, state persists to named JSON slots via
//!   [`local::LocalStore`]. After sign-in, every mutation writes through to
//!   the hosted table API behind the [`backend::CartBackend`] port, with
//!   optimistic in-memory application and rollback on remote failure.
//! - [`Cart::sign_in`](cart::Cart::sign_in) runs the one-time merge of
//!   guest state into the server-authoritative cart.
//!
//! The production backend is [`rest::RestBackend`]; tests substitute an
//! in-memory implementation of the same ports.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod config;
pub mod error;
pub mod local;
pub mod rest;
pub mod session;
pub mod wishlist;

pub use backend::{BackendError, CartBackend, LineDraft, ProductSnapshot, RemoteLine, WishlistBackend};
pub use cart::{Cart, CartLineInput, CartSummary};
pub use config::{BackendConfig, ConfigError};
pub use error::{CartError, WishlistError};
pub use local::LocalStore;
pub use rest::RestBackend;
pub use session::Identity;
pub use wishlist::{Wishlist, WishlistEntry};
