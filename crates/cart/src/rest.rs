//! Table-API backend implementation.
//!
//! Talks to the hosted backend's REST layer: one resource per table,
//! filters in the query string (`user_id=eq.<uuid>`), embedded joins via
//! `select=*,products(...)`, and `Prefer: return=representation` when an
//! insert must come back with its assigned row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use waman_core::{LineId, Price, ProductId, UserId, Variant};

use crate::backend::{
    BackendError, CartBackend, LineDraft, ProductSnapshot, RemoteLine, WishlistBackend,
};
use crate::config::BackendConfig;

/// Display name used when the product join is missing (product deleted
/// between add and fetch).
const FALLBACK_PRODUCT_NAME: &str = "Product";

// =============================================================================
// RestBackend
// =============================================================================

/// Client for the hosted table API.
///
/// Implements both [`CartBackend`] and [`WishlistBackend`]. Cheap to clone;
/// the HTTP client and credentials live behind an `Arc`.
#[derive(Clone)]
pub struct RestBackend {
    inner: Arc<RestBackendInner>,
}

struct RestBackendInner {
    client: reqwest::Client,
    base: String,
    api_key: String,
}

impl RestBackend {
    /// Create a new table-API client from configuration.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let base = format!(
            "{}/rest/v1",
            config.base_url.as_str().trim_end_matches('/')
        );

        Self {
            inner: Arc::new(RestBackendInner {
                client: reqwest::Client::new(),
                base,
                api_key: config.api_key.expose_secret().to_string(),
            }),
        }
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}/{}", self.inner.base, table))
            .header("apikey", &self.inner.api_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.inner.api_key),
            )
    }

    /// Send a request and return the body of a successful response.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "table API returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(body)
    }
}

/// Decode a response body, logging a snippet on failure for diagnostics.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "failed to decode table API response"
        );
        BackendError::Decode(e)
    })
}

// =============================================================================
// Wire rows
// =============================================================================

const CART_SELECT: &str = "*,products(name,price,images)";

#[derive(Debug, Deserialize)]
struct CartItemRow {
    id: LineId,
    product_id: ProductId,
    quantity: u32,
    size: Option<String>,
    color: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    products: Option<ProductJoin>,
}

#[derive(Debug, Deserialize)]
struct ProductJoin {
    name: String,
    price: Decimal,
    #[serde(default)]
    images: Vec<String>,
}

impl From<CartItemRow> for RemoteLine {
    fn from(row: CartItemRow) -> Self {
        // The join is null when the product row has been deleted; fall back
        // rather than dropping the line the customer still owns.
        let (name, price, image) = match row.products {
            Some(join) => (
                join.name,
                join.price,
                join.images.into_iter().next(),
            ),
            None => (FALLBACK_PRODUCT_NAME.to_string(), Decimal::ZERO, None),
        };

        Self {
            id: row.id,
            product: row.product_id,
            quantity: row.quantity,
            variant: Variant {
                size: row.size,
                color: row.color,
            },
            name,
            unit_price: Price::from_amount(price),
            image,
            added_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewCartItemRow<'a> {
    user_id: UserId,
    product_id: ProductId,
    quantity: u32,
    size: Option<&'a str>,
    color: Option<&'a str>,
}

impl<'a> NewCartItemRow<'a> {
    fn from_draft(owner: UserId, draft: &'a LineDraft) -> Self {
        Self {
            user_id: owner,
            product_id: draft.product,
            quantity: draft.quantity,
            size: draft.variant.size.as_deref(),
            color: draft.variant.color.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    wishlist: Option<Vec<ProductId>>,
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Decimal,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    stock_quantity: Option<i64>,
}

impl From<ProductRow> for ProductSnapshot {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: Price::from_amount(row.price),
            image: row.images.into_iter().next(),
            in_stock: row.stock_quantity.unwrap_or(0) > 0,
        }
    }
}

// =============================================================================
// CartBackend
// =============================================================================

#[async_trait]
impl CartBackend for RestBackend {
    #[instrument(skip(self))]
    async fn fetch_lines(&self, owner: UserId) -> Result<Vec<RemoteLine>, BackendError> {
        let owner_filter = format!("eq.{owner}");
        let request = self
            .request(reqwest::Method::GET, "cart_items")
            .query(&[("select", CART_SELECT), ("user_id", owner_filter.as_str())]);

        let body = self.execute(request).await?;
        let rows: Vec<CartItemRow> = decode(&body)?;
        Ok(rows.into_iter().map(RemoteLine::from).collect())
    }

    #[instrument(skip(self, draft))]
    async fn insert_line(
        &self,
        owner: UserId,
        draft: &LineDraft,
    ) -> Result<RemoteLine, BackendError> {
        let request = self
            .request(reqwest::Method::POST, "cart_items")
            .query(&[("select", CART_SELECT)])
            .header("Prefer", "return=representation")
            .json(&NewCartItemRow::from_draft(owner, draft));

        let body = self.execute(request).await?;
        let rows: Vec<CartItemRow> = decode(&body)?;
        rows.into_iter()
            .next()
            .map(RemoteLine::from)
            .ok_or(BackendError::MissingRow)
    }

    #[instrument(skip(self, drafts), fields(count = drafts.len()))]
    async fn insert_lines(
        &self,
        owner: UserId,
        drafts: &[LineDraft],
    ) -> Result<(), BackendError> {
        if drafts.is_empty() {
            return Ok(());
        }

        let rows: Vec<NewCartItemRow<'_>> = drafts
            .iter()
            .map(|draft| NewCartItemRow::from_draft(owner, draft))
            .collect();

        let request = self
            .request(reqwest::Method::POST, "cart_items")
            .header("Prefer", "return=minimal")
            .json(&rows);

        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_quantity(&self, id: LineId, quantity: u32) -> Result<(), BackendError> {
        let id_filter = format!("eq.{id}");
        let request = self
            .request(reqwest::Method::PATCH, "cart_items")
            .query(&[("id", id_filter.as_str())])
            .json(&serde_json::json!({ "quantity": quantity }));

        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_line(&self, id: LineId) -> Result<(), BackendError> {
        let id_filter = format!("eq.{id}");
        let request = self
            .request(reqwest::Method::DELETE, "cart_items")
            .query(&[("id", id_filter.as_str())]);

        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_lines(&self, owner: UserId) -> Result<(), BackendError> {
        let owner_filter = format!("eq.{owner}");
        let request = self
            .request(reqwest::Method::DELETE, "cart_items")
            .query(&[("user_id", owner_filter.as_str())]);

        self.execute(request).await?;
        Ok(())
    }
}

// =============================================================================
// WishlistBackend
// =============================================================================

#[async_trait]
impl WishlistBackend for RestBackend {
    #[instrument(skip(self))]
    async fn fetch_wishlist(&self, owner: UserId) -> Result<Vec<ProductId>, BackendError> {
        let owner_filter = format!("eq.{owner}");
        let request = self
            .request(reqwest::Method::GET, "profiles")
            .query(&[("select", "wishlist"), ("user_id", owner_filter.as_str())]);

        let body = self.execute(request).await?;
        let rows: Vec<ProfileRow> = decode(&body)?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.wishlist)
            .unwrap_or_default())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn save_wishlist(&self, owner: UserId, ids: &[ProductId]) -> Result<(), BackendError> {
        let owner_filter = format!("eq.{owner}");
        let request = self
            .request(reqwest::Method::PATCH, "profiles")
            .query(&[("user_id", owner_filter.as_str())])
            .json(&serde_json::json!({ "wishlist": ids }));

        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn fetch_products(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ProductSnapshot>, BackendError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let id_filter = format!("in.({id_list})");
        let request = self.request(reqwest::Method::GET, "products").query(&[
            ("select", "id,name,price,images,stock_quantity"),
            ("id", id_filter.as_str()),
            ("is_active", "eq.true"),
        ]);

        let body = self.execute(request).await?;
        let rows: Vec<ProductRow> = decode(&body)?;
        Ok(rows.into_iter().map(ProductSnapshot::from).collect())
    }
}
