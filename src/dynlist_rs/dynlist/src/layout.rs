/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Utilities for computing the layout of allocations.
use crate::header::Header;
use std::alloc::Layout;
use std::mem;

/// Alignment of a [`RawDynList`](crate::RawDynList) allocation.
///
/// The element width of a raw list is only known at runtime, so its storage
/// is aligned for any primitive a caller might place in it.
pub const RAW_HEADER_ALIGN: usize = 16;

/// The header stored in front of the elements of a [`RawDynList`](crate::RawDynList).
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawHeader {
    pub(crate) list: Header,
    /// Width of one element, in bytes. Never changes after initialization.
    pub(crate) t_size: usize,
}

/// Distance, in bytes, from the start of a raw allocation to its first element.
///
/// The handle of a raw list points at its first element, so the header is always
/// found `RAW_HEADER_SIZE` bytes before the handle.
pub const RAW_HEADER_SIZE: usize = mem::size_of::<RawHeader>();

const _: () = assert!(mem::align_of::<RawHeader>() == RAW_HEADER_ALIGN);
const _: () = assert!(RAW_HEADER_SIZE % RAW_HEADER_ALIGN == 0);

/// Gets the layout of the element storage of a `DynList<T>` with the given capacity.
///
/// # Panics
///
/// Panics if the size of the array would exceed `isize::MAX`.
pub(crate) const fn elements_layout<T>(cap: usize) -> Layout {
    match Layout::array::<T>(cap) {
        Ok(layout) => layout,
        Err(_) => {
            // The panic message must be known at compile-time if we want `elements_layout` to be a `const fn`.
            panic!(
                "The size of the array of elements within `DynList<T>` would exceed `isize::MAX`, \
                which is the maximum size that can be allocated."
            )
        }
    }
}

/// Gets the layout of a `RawDynList` allocation: header followed by `cap` elements
/// of `t_size` bytes each.
///
/// # Panics
///
/// Panics if the size of the allocation would exceed `isize::MAX`.
pub(crate) fn raw_allocation_layout(t_size: usize, cap: usize) -> Layout {
    let size = t_size
        .checked_mul(cap)
        .and_then(|elements| elements.checked_add(RAW_HEADER_SIZE));
    match size.map(|size| Layout::from_size_align(size, RAW_HEADER_ALIGN)) {
        Some(Ok(layout)) => layout,
        _ => panic!(
            "The size of the allocated buffer for `RawDynList` would exceed `isize::MAX`, \
            which is the maximum size that can be allocated."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_header_size() {
        // Three words of bookkeeping, padded up to the 16 byte alignment.
        let words = 3 * mem::size_of::<usize>();
        assert_eq!(RAW_HEADER_SIZE, words.next_multiple_of(RAW_HEADER_ALIGN));
    }

    #[test]
    fn test_raw_allocation_layout() {
        let layout = raw_allocation_layout(12, 4);
        assert_eq!(layout.size(), RAW_HEADER_SIZE + 48);
        assert_eq!(layout.align(), RAW_HEADER_ALIGN);

        // Zero-width elements still get a header.
        assert_eq!(raw_allocation_layout(0, 64).size(), RAW_HEADER_SIZE);
    }

    #[test]
    #[should_panic(expected = "would exceed `isize::MAX`")]
    fn test_raw_allocation_layout_overflow() {
        raw_allocation_layout(usize::MAX / 2, 4);
    }

    #[test]
    fn test_elements_layout() {
        assert_eq!(elements_layout::<u64>(4).size(), 32);
        assert_eq!(elements_layout::<u64>(4).align(), 8);
        assert_eq!(elements_layout::<()>(1024).size(), 0);
    }

    #[test]
    #[should_panic(expected = "would exceed `isize::MAX`")]
    fn test_elements_layout_overflow() {
        elements_layout::<u64>(usize::MAX / 4);
    }
}
