//! Error types for the state layer.
//!
//! All remote-call failures are caught at the mutation boundary: the
//! in-memory state is rolled back first, then the typed error is returned
//! for the shell to surface as a dismissable notice. Nothing in this crate
//! panics on a failed remote call.

use thiserror::Error;
use waman_core::LineId;

use crate::backend::BackendError;

/// Cart operation failure.
///
/// When a variant wraps a [`BackendError`], the in-memory cart has already
/// been restored to its pre-mutation snapshot by the time the caller sees
/// the error.
#[derive(Debug, Error)]
pub enum CartError {
    /// Remote call failed; the mutation was rolled back.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// No cart line with the given identity.
    #[error("no cart line with id {0}")]
    UnknownLine(LineId),
}

/// Wishlist operation failure.
#[derive(Debug, Error)]
pub enum WishlistError {
    /// Remote call failed; the mutation was rolled back.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}
