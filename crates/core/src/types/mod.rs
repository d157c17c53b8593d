//! Common type definitions.

pub mod id;
pub mod line;
pub mod price;

pub use id::{LineId, ProductId, UserId};
pub use line::{CartLine, LineKey, Variant};
pub use price::{CurrencyCode, Price};
