//! Local store adapter: durable guest state, one JSON slot per concern.
//!
//! Guest carts and wishlists live only here, scoped to the shopper's
//! profile directory. Slots are whole-value: `load` reads the complete
//! sequence, `save` overwrites it. Corrupt or missing content loads as
//! empty - a damaged slot must never take the storefront down. No network
//! access happens in this module.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use waman_core::CartLine;

use crate::wishlist::WishlistEntry;

const CART_SLOT: &str = "waman-cart.json";
const WISHLIST_SLOT: &str = "waman-wishlist.json";

/// Durable local key-value slots under a profile directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The profile directory this store writes under.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the guest cart. Absent or unparseable content yields an empty
    /// cart.
    #[must_use]
    pub fn load_cart(&self) -> Vec<CartLine> {
        self.load_slot(CART_SLOT)
    }

    /// Persist the full guest cart, overwriting the prior content.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the slot cannot be written.
    pub fn save_cart(&self, lines: &[CartLine]) -> io::Result<()> {
        self.save_slot(CART_SLOT, lines)
    }

    /// Snapshot the guest cart and clear the slot in one step.
    ///
    /// Reconciliation uses this so a re-run cannot reprocess the same
    /// guest lines.
    #[must_use]
    pub fn take_cart(&self) -> Vec<CartLine> {
        let lines = self.load_cart();
        self.clear_slot(CART_SLOT);
        lines
    }

    /// Load the guest wishlist. Absent or unparseable content yields an
    /// empty list.
    #[must_use]
    pub fn load_wishlist(&self) -> Vec<WishlistEntry> {
        self.load_slot(WISHLIST_SLOT)
    }

    /// Persist the full guest wishlist, overwriting the prior content.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the slot cannot be written.
    pub fn save_wishlist(&self, entries: &[WishlistEntry]) -> io::Result<()> {
        self.save_slot(WISHLIST_SLOT, entries)
    }

    /// Snapshot the guest wishlist and clear the slot in one step.
    #[must_use]
    pub fn take_wishlist(&self) -> Vec<WishlistEntry> {
        let entries = self.load_wishlist();
        self.clear_slot(WISHLIST_SLOT);
        entries
    }

    fn load_slot<T: DeserializeOwned>(&self, slot: &str) -> Vec<T> {
        let path = self.dir.join(slot);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(slot, error = %e, "failed to read local slot; treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(slot, error = %e, "local slot is corrupt; treating as empty");
                Vec::new()
            }
        }
    }

    fn save_slot<T: Serialize>(&self, slot: &str, items: &[T]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_vec(items).map_err(io::Error::other)?;
        fs::write(self.dir.join(slot), raw)
    }

    fn clear_slot(&self, slot: &str) {
        match fs::remove_file(self.dir.join(slot)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!(slot, error = %e, "failed to clear local slot"),
        }
    }
}
