//! Wishlist state object.
//!
//! Mirrors the cart's shape: guest entries persist to a local slot, a
//! signed-in customer's entries live as a product-id array on their
//! profile row, and sign-in merges the two with the remote side winning.
//! Identity is the product alone - wishlists have no variants and no
//! quantities.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{instrument, warn};
use waman_core::{Price, ProductId, UserId};

use crate::backend::{BackendError, ProductSnapshot, WishlistBackend};
use crate::error::WishlistError;
use crate::local::LocalStore;
use crate::session::Identity;

/// One saved product.
///
/// Display fields are denormalized at save-time for guests and refreshed
/// from the product join whenever the list syncs with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub product: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub in_stock: bool,
}

impl From<ProductSnapshot> for WishlistEntry {
    fn from(snapshot: ProductSnapshot) -> Self {
        Self {
            product: snapshot.id,
            name: snapshot.name,
            price: snapshot.price,
            image: snapshot.image,
            in_stock: snapshot.in_stock,
        }
    }
}

/// Pre-mutation snapshot held until the remote call resolves.
struct Snapshot(Vec<WishlistEntry>);

/// The shopper's wishlist for one interactive session.
pub struct Wishlist {
    entries: Vec<WishlistEntry>,
    identity: Identity,
    backend: Arc<dyn WishlistBackend>,
    local: LocalStore,
    count_tx: watch::Sender<usize>,
}

impl Wishlist {
    /// Create a wishlist in guest mode, loading any persisted entries.
    #[must_use]
    pub fn new(backend: Arc<dyn WishlistBackend>, local: LocalStore) -> Self {
        let entries = local.load_wishlist();
        let (count_tx, _) = watch::channel(entries.len());

        Self {
            entries,
            identity: Identity::Guest,
            backend,
            local,
            count_tx,
        }
    }

    /// Current entries.
    #[must_use]
    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    /// Whether `product` is saved.
    #[must_use]
    pub fn contains(&self, product: ProductId) -> bool {
        self.entries.iter().any(|entry| entry.product == product)
    }

    /// Subscribe to entry-count updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }

    /// Save a product. Saving an already-present product is a no-op.
    ///
    /// Applied optimistically; in authenticated mode the profile array is
    /// rewritten and a failure restores the pre-mutation entries.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::Backend`] after rollback if the remote
    /// write fails.
    #[instrument(skip(self, entry), fields(product = %entry.product))]
    pub async fn add(&mut self, entry: WishlistEntry) -> Result<(), WishlistError> {
        if self.contains(entry.product) {
            return Ok(());
        }

        let snapshot = self.snapshot();
        self.entries.push(entry);
        self.publish();
        self.sync_after_mutation(snapshot).await
    }

    /// Remove a product. Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::Backend`] after rollback if the remote
    /// write fails.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, product: ProductId) -> Result<(), WishlistError> {
        if !self.contains(product) {
            return Ok(());
        }

        let snapshot = self.snapshot();
        self.entries.retain(|entry| entry.product != product);
        self.publish();
        self.sync_after_mutation(snapshot).await
    }

    /// Switch to authenticated mode and merge the guest wishlist into the
    /// customer's profile.
    ///
    /// Remote entries win; guest-only product ids are appended to the
    /// profile array, then display data for the merged set is joined from
    /// the products table (inactive products drop out).
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::Backend`] if a fetch or the array update
    /// fails. The identity switch still happens and the in-memory entries
    /// stay last-known.
    #[instrument(skip(self))]
    pub async fn sign_in(&mut self, owner: UserId) -> Result<(), WishlistError> {
        self.identity = Identity::Customer(owner);

        let guest_entries = self.local.take_wishlist();

        match self.merge(owner, &guest_entries).await {
            Ok(merged) => {
                self.entries = merged;
                self.publish();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "wishlist sync failed; keeping last-known entries");
                Err(e.into())
            }
        }
    }

    /// Revert to guest mode; entries resume from the local slot.
    pub fn sign_out(&mut self) {
        self.identity = Identity::Guest;
        self.entries = self.local.load_wishlist();
        self.publish();
    }

    async fn merge(
        &self,
        owner: UserId,
        guest_entries: &[WishlistEntry],
    ) -> Result<Vec<WishlistEntry>, BackendError> {
        let remote_ids = self.backend.fetch_wishlist(owner).await?;

        let new_ids: Vec<ProductId> = guest_entries
            .iter()
            .map(|entry| entry.product)
            .filter(|id| !remote_ids.contains(id))
            .collect();

        let merged_ids: Vec<ProductId> = remote_ids.iter().copied().chain(new_ids).collect();

        if merged_ids.len() > remote_ids.len() {
            self.backend.save_wishlist(owner, &merged_ids).await?;
        }

        let products = self.backend.fetch_products(&merged_ids).await?;
        Ok(products.into_iter().map(WishlistEntry::from).collect())
    }

    async fn sync_after_mutation(&mut self, snapshot: Snapshot) -> Result<(), WishlistError> {
        let Identity::Customer(owner) = self.identity else {
            self.persist_guest();
            return Ok(());
        };

        let ids: Vec<ProductId> = self.entries.iter().map(|entry| entry.product).collect();
        if let Err(e) = self.backend.save_wishlist(owner, &ids).await {
            warn!(error = %e, "failed to update wishlist; rolling back");
            self.revert(snapshot);
            return Err(e.into());
        }

        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot(self.entries.clone())
    }

    fn revert(&mut self, snapshot: Snapshot) {
        self.entries = snapshot.0;
        self.publish();
    }

    fn persist_guest(&self) {
        if let Err(e) = self.local.save_wishlist(&self.entries) {
            warn!(error = %e, "failed to persist guest wishlist");
        }
    }

    fn publish(&self) {
        self.count_tx.send_replace(self.entries.len());
    }
}
