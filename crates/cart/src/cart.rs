//! Cart state object: optimistic mutation and sign-in reconciliation.
//!
//! The application shell owns one [`Cart`] and passes it by reference to
//! the views that mutate it. There is exactly one logical writer; every
//! mutation is a discrete task triggered by a user action or a session
//! transition, so no locking or versioning is layered on top.
//!
//! Authenticated mutations follow a snapshot/commit-or-revert discipline:
//! the pre-mutation line set is held until the remote call resolves, and a
//! failure restores it verbatim. Callers observe either the old state or
//! the new one, never something in between.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{instrument, warn};
use waman_core::{CartLine, LineId, LineKey, Price, ProductId, UserId, Variant};

use crate::backend::{BackendError, CartBackend, LineDraft, RemoteLine};
use crate::error::CartError;
use crate::local::LocalStore;
use crate::session::Identity;

/// Caller-supplied fields for a new cart line.
///
/// `name`, `unit_price`, and `image` are the denormalized product snapshot
/// shown while the line is guest-local; once lines come back from the
/// backend the joined product data replaces them.
#[derive(Debug, Clone)]
pub struct CartLineInput {
    pub product: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub variant: Variant,
    pub image: Option<String>,
}

impl CartLineInput {
    fn key(&self) -> LineKey {
        LineKey {
            product: self.product,
            variant: self.variant.clone(),
        }
    }
}

/// Derived cart aggregates, recomputed from the line set on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartSummary {
    /// Sum of quantities over all lines.
    pub total_items: u32,
    /// Sum of unit price times quantity over all lines.
    pub total_amount: Decimal,
}

/// Pre-mutation snapshot held until the remote call resolves.
struct Snapshot(Vec<CartLine>);

/// The shopper's cart for one interactive session.
pub struct Cart {
    lines: Vec<CartLine>,
    identity: Identity,
    backend: Arc<dyn CartBackend>,
    local: LocalStore,
    summary_tx: watch::Sender<CartSummary>,
}

impl Cart {
    /// Create a cart in guest mode, loading any persisted guest lines.
    #[must_use]
    pub fn new(backend: Arc<dyn CartBackend>, local: LocalStore) -> Self {
        let lines = local.load_cart();
        let (summary_tx, _) = watch::channel(summary_of(&lines));

        Self {
            lines,
            identity: Identity::Guest,
            backend,
            local,
            summary_tx,
        }
    }

    /// Current line set.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Current session identity.
    #[must_use]
    pub const fn identity(&self) -> Identity {
        self.identity
    }

    /// Sum of quantities over all lines. Never stored; always recomputed.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of price times quantity over all lines. Never stored; always
    /// recomputed.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Both derived aggregates in one read.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        summary_of(&self.lines)
    }

    /// Subscribe to summary updates. The receiver sees the value after
    /// every committed change (a rolled-back mutation settles on the
    /// pre-mutation value).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSummary> {
        self.summary_tx.subscribe()
    }

    /// Add a line, merging into an existing line with the same
    /// `(product, size, color)` key by raising its quantity.
    ///
    /// In authenticated mode the backend insert happens *first* and the
    /// line appears only with its assigned identity; a failed insert adds
    /// nothing. Guests get a placeholder identity immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Backend`] if the remote insert or quantity
    /// update fails; in-memory state is unchanged in that case.
    #[instrument(skip(self, input), fields(product = %input.product))]
    pub async fn add_line(&mut self, input: CartLineInput) -> Result<(), CartError> {
        if input.quantity == 0 {
            return Ok(());
        }

        let key = input.key();
        let existing = self
            .lines
            .iter()
            .find(|line| line.key() == key)
            .map(|line| (line.id, line.quantity));
        if let Some((id, quantity)) = existing {
            return self.set_quantity(id, quantity + input.quantity).await;
        }

        match self.identity {
            Identity::Customer(owner) => {
                let draft = LineDraft {
                    product: input.product,
                    quantity: input.quantity,
                    variant: input.variant,
                };
                let row = self
                    .backend
                    .insert_line(owner, &draft)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "failed to add cart line");
                        e
                    })?;
                self.lines.push(CartLine::from(row));
            }
            Identity::Guest => {
                self.lines.push(CartLine {
                    id: LineId::generate(),
                    product: input.product,
                    name: input.name,
                    unit_price: input.unit_price,
                    quantity: input.quantity,
                    variant: input.variant,
                    image: input.image,
                });
                self.persist_guest();
            }
        }

        self.publish();
        Ok(())
    }

    /// Set a line's quantity. A quantity of 0 removes the line.
    ///
    /// The in-memory update is applied optimistically; a failed remote
    /// update restores the pre-mutation snapshot verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] if no line has `id`, or
    /// [`CartError::Backend`] after rollback if the remote update fails.
    #[instrument(skip(self))]
    pub async fn set_quantity(&mut self, id: LineId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_line(id).await;
        }

        let snapshot = self.snapshot();
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.id == id)
            .ok_or(CartError::UnknownLine(id))?;
        line.quantity = quantity;
        self.publish();

        match self.identity {
            Identity::Customer(_) => {
                if let Err(e) = self.backend.update_quantity(id, quantity).await {
                    warn!(error = %e, %id, "failed to update cart line; rolling back");
                    self.revert(snapshot);
                    return Err(e.into());
                }
            }
            Identity::Guest => self.persist_guest(),
        }

        Ok(())
    }

    /// Remove a line.
    ///
    /// The removal is applied optimistically; a failed remote delete
    /// restores the pre-mutation snapshot (the line reappears).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] if no line has `id`, or
    /// [`CartError::Backend`] after rollback if the remote delete fails.
    #[instrument(skip(self))]
    pub async fn remove_line(&mut self, id: LineId) -> Result<(), CartError> {
        if !self.lines.iter().any(|line| line.id == id) {
            return Err(CartError::UnknownLine(id));
        }

        let snapshot = self.snapshot();
        self.lines.retain(|line| line.id != id);
        self.publish();

        match self.identity {
            Identity::Customer(_) => {
                if let Err(e) = self.backend.delete_line(id).await {
                    warn!(error = %e, %id, "failed to remove cart line; rolling back");
                    self.revert(snapshot);
                    return Err(e.into());
                }
            }
            Identity::Guest => self.persist_guest(),
        }

        Ok(())
    }

    /// Empty the cart.
    ///
    /// Applied optimistically; a failed remote bulk delete restores every
    /// line with its original identity and quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Backend`] after rollback if the remote bulk
    /// delete fails.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<(), CartError> {
        let snapshot = self.snapshot();
        self.lines.clear();
        self.publish();

        match self.identity {
            Identity::Customer(owner) => {
                if let Err(e) = self.backend.clear_lines(owner).await {
                    warn!(error = %e, "failed to clear cart; rolling back");
                    self.revert(snapshot);
                    return Err(e.into());
                }
            }
            Identity::Guest => self.persist_guest(),
        }

        Ok(())
    }

    /// Switch to authenticated mode and merge the guest cart into the
    /// customer's remote cart.
    ///
    /// The guest slot is snapshotted and cleared up front so a repeated
    /// call cannot reprocess the same lines. Remote lines win conflicts by
    /// `(product, size, color)` key; only genuinely new guest lines are
    /// uploaded, followed by one bounded re-fetch for their authoritative
    /// identities.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Backend`] if a fetch or upload fails. The
    /// identity switch still happens and the in-memory cart keeps its
    /// last-known lines; sign-in itself is never blocked by the cart.
    #[instrument(skip(self))]
    pub async fn sign_in(&mut self, owner: UserId) -> Result<(), CartError> {
        self.identity = Identity::Customer(owner);

        let guest_lines = self.local.take_cart();

        match self.reconcile(owner, &guest_lines).await {
            Ok(remote) => {
                self.lines = remote.into_iter().map(CartLine::from).collect();
                self.publish();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "cart reconciliation failed; keeping last-known lines");
                Err(e.into())
            }
        }
    }

    /// Revert to guest mode. Remote lines are not migrated back; the cart
    /// resumes from the local slot, which was cleared at sign-in.
    pub fn sign_out(&mut self) {
        self.identity = Identity::Guest;
        self.lines = self.local.load_cart();
        self.publish();
    }

    async fn reconcile(
        &self,
        owner: UserId,
        guest_lines: &[CartLine],
    ) -> Result<Vec<RemoteLine>, BackendError> {
        let remote = self.backend.fetch_lines(owner).await?;

        // Remote wins conflicts: a key already present remotely keeps its
        // remote quantity. Only genuinely new guest lines are uploaded;
        // price and name are not sent, the backend derives them from the
        // product reference.
        let uploads: Vec<LineDraft> = guest_lines
            .iter()
            .filter(|line| !remote.iter().any(|row| row.key() == line.key()))
            .map(LineDraft::from)
            .collect();

        if uploads.is_empty() {
            return Ok(remote);
        }

        self.backend.insert_lines(owner, &uploads).await?;

        // One re-fetch for the identities the backend just assigned. The
        // guest slot was consumed before the first fetch, so this pass has
        // nothing left to upload.
        self.backend.fetch_lines(owner).await
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot(self.lines.clone())
    }

    fn revert(&mut self, snapshot: Snapshot) {
        self.lines = snapshot.0;
        self.publish();
    }

    fn persist_guest(&self) {
        if let Err(e) = self.local.save_cart(&self.lines) {
            warn!(error = %e, "failed to persist guest cart");
        }
    }

    fn publish(&self) {
        self.summary_tx.send_replace(self.summary());
    }
}

fn summary_of(lines: &[CartLine]) -> CartSummary {
    CartSummary {
        total_items: lines.iter().map(|line| line.quantity).sum(),
        total_amount: lines.iter().map(CartLine::line_total).sum(),
    }
}
