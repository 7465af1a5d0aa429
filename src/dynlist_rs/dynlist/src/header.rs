/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

/// Length and capacity bookkeeping shared by [`DynList`](crate::DynList)
/// and [`RawDynList`](crate::RawDynList).
///
/// The setters enforce `len <= cap`, so a header can never describe
/// more initialized elements than it has slots for.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    len: usize,
    cap: usize,
}

impl Header {
    /// The header of a list that owns no storage.
    pub(crate) const EMPTY: Header = Header::new(0, 0);

    /// Creates a new header with the given length and capacity.
    ///
    /// # Panics
    ///
    /// Panics if the length is greater than the capacity.
    pub(crate) const fn new(len: usize, cap: usize) -> Self {
        assert!(len <= cap, "Length must be less than or equal to capacity");
        Self { len, cap }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub(crate) const fn set_capacity(&mut self, cap: usize) {
        assert!(
            cap >= self.len,
            "Capacity must be greater than or equal to the current length"
        );
        self.cap = cap;
    }

    #[inline]
    pub(crate) const fn set_len(&mut self, len: usize) {
        assert!(
            len <= self.cap,
            "New length must be less than or equal to current capacity"
        );
        self.len = len;
    }
}
