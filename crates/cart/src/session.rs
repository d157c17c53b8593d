//! Session identity for the state layer.

use waman_core::UserId;

/// Who owns the in-memory state right now.
///
/// The cart and wishlist behave differently per identity: guests persist to
/// the local store only, customers write through to the backend. The
/// transition from `Guest` to `Customer` is where reconciliation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Anonymous shopper; state lives in the local store.
    Guest,
    /// Signed-in customer; the backend is authoritative.
    Customer(UserId),
}

impl Identity {
    /// The owning user, if signed in.
    #[must_use]
    pub const fn owner(&self) -> Option<UserId> {
        match self {
            Self::Guest => None,
            Self::Customer(id) => Some(*id),
        }
    }

    /// True while anonymous.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }
}
