//! Ports for the hosted table API.
//!
//! The state layer talks to the backend through these traits so the cart
//! and wishlist logic can be exercised against an in-memory double. The
//! production implementation is [`crate::rest::RestBackend`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use waman_core::{CartLine, LineId, LineKey, Price, ProductId, UserId, Variant};

/// Failure talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    /// The response body did not decode as the expected rows.
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// An insert that should return its row returned nothing.
    #[error("backend returned no row")]
    MissingRow,
}

/// A cart row as the backend returns it: the stored fields joined with the
/// product's current `name`, `price`, and first image.
///
/// The joined fields are the source of truth for display data at fetch
/// time; locally held snapshots are replaced by them.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteLine {
    pub id: LineId,
    pub product: ProductId,
    pub quantity: u32,
    pub variant: Variant,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<String>,
    /// When the row was created, per the backend.
    pub added_at: Option<DateTime<Utc>>,
}

impl RemoteLine {
    /// Identity key for duplicate detection against local lines.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product: self.product,
            variant: self.variant.clone(),
        }
    }
}

impl From<RemoteLine> for CartLine {
    fn from(row: RemoteLine) -> Self {
        Self {
            id: row.id,
            product: row.product,
            name: row.name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            variant: row.variant,
            image: row.image,
        }
    }
}

/// Fields sent when creating a cart row.
///
/// Price and name are not sent; the backend derives them from the product
/// reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    pub product: ProductId,
    pub quantity: u32,
    pub variant: Variant,
}

impl From<&CartLine> for LineDraft {
    fn from(line: &CartLine) -> Self {
        Self {
            product: line.product,
            quantity: line.quantity,
            variant: line.variant.clone(),
        }
    }
}

/// Current product data joined for wishlist display.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub in_stock: bool,
}

/// Remote cart storage, scoped per owning customer.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Fetch all cart rows owned by `owner`, joined with product data.
    async fn fetch_lines(&self, owner: UserId) -> Result<Vec<RemoteLine>, BackendError>;

    /// Insert one row and return it with its assigned identity.
    async fn insert_line(
        &self,
        owner: UserId,
        draft: &LineDraft,
    ) -> Result<RemoteLine, BackendError>;

    /// Bulk-insert rows without returning representations.
    ///
    /// Used by reconciliation, which re-fetches afterwards for
    /// authoritative identities.
    async fn insert_lines(&self, owner: UserId, drafts: &[LineDraft]) -> Result<(), BackendError>;

    /// Set the quantity of an existing row.
    async fn update_quantity(&self, id: LineId, quantity: u32) -> Result<(), BackendError>;

    /// Delete one row by identity.
    async fn delete_line(&self, id: LineId) -> Result<(), BackendError>;

    /// Delete every row owned by `owner`.
    async fn clear_lines(&self, owner: UserId) -> Result<(), BackendError>;
}

/// Remote wishlist storage: an array of product ids on the customer's
/// profile row, plus a product join for display data.
#[async_trait]
pub trait WishlistBackend: Send + Sync {
    /// Fetch the saved product ids for `owner`. A missing profile row
    /// yields an empty list.
    async fn fetch_wishlist(&self, owner: UserId) -> Result<Vec<ProductId>, BackendError>;

    /// Replace the saved product ids for `owner` with `ids`.
    async fn save_wishlist(&self, owner: UserId, ids: &[ProductId]) -> Result<(), BackendError>;

    /// Fetch current display data for the given products. Inactive or
    /// deleted products are omitted from the result.
    async fn fetch_products(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ProductSnapshot>, BackendError>;
}
