//! Cart line items and their identity.
//!
//! A line is one distinct product-plus-variant entry in a cart. The same
//! product in two sizes is two lines; adding the same `(product, size,
//! color)` combination again raises the quantity of the existing line
//! instead of creating a duplicate.

use serde::{Deserialize, Serialize};

use super::id::{LineId, ProductId};
use super::price::Price;

/// The `(size, color)` selection distinguishing otherwise-identical lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    pub size: Option<String>,
    pub color: Option<String>,
}

impl Variant {
    /// A variant with no size or color selection.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            size: None,
            color: None,
        }
    }
}

/// Identity key for a cart line: the product plus its variant selection.
///
/// Two lines with equal keys are the same logical line regardless of their
/// row identity; the cart maintains at most one line per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product: ProductId,
    pub variant: Variant,
}

/// One line item in a cart.
///
/// `name`, `unit_price`, and `image` are denormalized snapshots of product
/// data taken at add-time; they are refreshed from the product join whenever
/// lines are fetched from the backend, never re-synced while a line lives
/// only locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Row identity. Authoritative only once persisted remotely; guest lines
    /// carry a locally generated placeholder.
    pub id: LineId,
    pub product: ProductId,
    pub name: String,
    pub unit_price: Price,
    /// Always >= 1; a mutation that would reach 0 removes the line.
    pub quantity: u32,
    #[serde(default)]
    pub variant: Variant,
    pub image: Option<String>,
}

impl CartLine {
    /// The identity key for duplicate detection.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product: self.product,
            variant: self.variant.clone(),
        }
    }

    /// Price times quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> rust_decimal::Decimal {
        self.unit_price.line_total(self.quantity)
    }
}
