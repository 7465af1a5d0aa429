/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

use thiserror::Error;

/// A broken usage contract, reported by the `try_*` family of list operations.
///
/// The non-`try` operations treat these as programmer errors and panic with the
/// error's message instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DynListError {
    /// The operation needs storage, but the list was never initialized
    /// (or has been destroyed).
    #[error("dynlist is not initialized")]
    Uninitialized,
    /// `init` was called on a list that already owns storage.
    #[error("dynlist is already initialized")]
    AlreadyInitialized,
    /// The index does not address an element (or, for insertions, a position).
    #[error("index {index} is out of bounds for a dynlist of size {len}")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The size of the list at the time of the call.
        len: usize,
    },
    /// An element was requested from an empty list.
    #[error("cannot remove an element from an empty dynlist")]
    Empty,
    /// Two byte-width lists (or a list and a value) disagree on the element width.
    #[error("element size mismatch: expected {expected} bytes, got {actual}")]
    ElementSizeMismatch {
        /// The element width of the list being modified.
        expected: usize,
        /// The width that was provided.
        actual: usize,
    },
}

/// Raises a contract violation.
#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn contract_violation(err: DynListError) -> ! {
    panic!("{err}")
}
