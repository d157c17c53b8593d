//! Shared test support: an in-memory backend double with failure injection.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use waman_cart::{
    BackendError, CartBackend, LineDraft, ProductSnapshot, RemoteLine, WishlistBackend,
};
use waman_core::{LineId, Price, ProductId, UserId, Variant};

/// One stored cart row, as the backend would hold it (no denormalized
/// product data).
#[derive(Debug, Clone)]
struct StoredRow {
    id: LineId,
    owner: UserId,
    product: ProductId,
    quantity: u32,
    variant: Variant,
}

/// In-memory stand-in for the hosted table API.
///
/// `fail_next_call` makes exactly one subsequent call answer with an
/// injected 503, which is how the rollback paths are driven.
#[derive(Default)]
pub struct MemoryBackend {
    rows: Mutex<Vec<StoredRow>>,
    products: Mutex<HashMap<ProductId, ProductSnapshot>>,
    wishlists: Mutex<HashMap<UserId, Vec<ProductId>>>,
    fail_next: AtomicBool,
    fetches: AtomicUsize,
}

impl MemoryBackend {
    /// Register a product so joins resolve to real display data.
    pub fn register_product(&self, snapshot: ProductSnapshot) {
        self.products
            .lock()
            .unwrap()
            .insert(snapshot.id, snapshot);
    }

    /// Seed a cart row directly, as if a previous session created it.
    pub fn seed_line(
        &self,
        owner: UserId,
        product: ProductId,
        quantity: u32,
        variant: Variant,
    ) -> LineId {
        let id = LineId::generate();
        self.rows.lock().unwrap().push(StoredRow {
            id,
            owner,
            product,
            quantity,
            variant,
        });
        id
    }

    /// Make the next backend call fail with an injected 503.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// How many times `fetch_lines` has run.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Stored rows for one owner, joined like a fetch would be.
    pub fn stored_lines(&self, owner: UserId) -> Vec<RemoteLine> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.owner == owner)
            .map(|row| self.join(row))
            .collect()
    }

    fn check_failure(&self) -> Result<(), BackendError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 503,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn join(&self, row: &StoredRow) -> RemoteLine {
        let products = self.products.lock().unwrap();
        let (name, price, image) = products.get(&row.product).map_or_else(
            || ("Product".to_string(), Price::from_amount(Decimal::ZERO), None),
            |p| (p.name.clone(), p.price, p.image.clone()),
        );

        RemoteLine {
            id: row.id,
            product: row.product,
            quantity: row.quantity,
            variant: row.variant.clone(),
            name,
            unit_price: price,
            image,
            added_at: None,
        }
    }
}

#[async_trait]
impl CartBackend for MemoryBackend {
    async fn fetch_lines(&self, owner: UserId) -> Result<Vec<RemoteLine>, BackendError> {
        self.check_failure()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.stored_lines(owner))
    }

    async fn insert_line(
        &self,
        owner: UserId,
        draft: &LineDraft,
    ) -> Result<RemoteLine, BackendError> {
        self.check_failure()?;
        let id = self.seed_line(owner, draft.product, draft.quantity, draft.variant.clone());
        let rows = self.rows.lock().unwrap();
        let row = rows
            .iter()
            .find(|row| row.id == id)
            .expect("row just inserted");
        Ok(self.join(row))
    }

    async fn insert_lines(&self, owner: UserId, drafts: &[LineDraft]) -> Result<(), BackendError> {
        self.check_failure()?;
        for draft in drafts {
            self.seed_line(owner, draft.product, draft.quantity, draft.variant.clone());
        }
        Ok(())
    }

    async fn update_quantity(&self, id: LineId, quantity: u32) -> Result<(), BackendError> {
        self.check_failure()?;
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|row| row.id == id) {
            row.quantity = quantity;
        }
        Ok(())
    }

    async fn delete_line(&self, id: LineId) -> Result<(), BackendError> {
        self.check_failure()?;
        self.rows.lock().unwrap().retain(|row| row.id != id);
        Ok(())
    }

    async fn clear_lines(&self, owner: UserId) -> Result<(), BackendError> {
        self.check_failure()?;
        self.rows.lock().unwrap().retain(|row| row.owner != owner);
        Ok(())
    }
}

#[async_trait]
impl WishlistBackend for MemoryBackend {
    async fn fetch_wishlist(&self, owner: UserId) -> Result<Vec<ProductId>, BackendError> {
        self.check_failure()?;
        Ok(self
            .wishlists
            .lock()
            .unwrap()
            .get(&owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_wishlist(&self, owner: UserId, ids: &[ProductId]) -> Result<(), BackendError> {
        self.check_failure()?;
        self.wishlists.lock().unwrap().insert(owner, ids.to_vec());
        Ok(())
    }

    async fn fetch_products(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ProductSnapshot>, BackendError> {
        self.check_failure()?;
        let products = self.products.lock().unwrap();
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }
}

/// A product snapshot with a fresh id.
pub fn product(name: &str, amount: i64) -> ProductSnapshot {
    ProductSnapshot {
        id: ProductId::generate(),
        name: name.to_string(),
        price: Price::from_amount(Decimal::new(amount, 0)),
        image: Some(format!("{}.webp", name.to_lowercase().replace(' ', "-"))),
        in_stock: true,
    }
}

/// Install a test subscriber so tracing output lands in the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
