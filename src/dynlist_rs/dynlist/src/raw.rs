/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! A dynamic list whose element width is only known at runtime.

use std::alloc::{alloc, dealloc, handle_alloc_error, realloc};
use std::cmp::Ordering;
use std::ffi::c_void;
use std::ptr::{self, NonNull};
use std::{fmt, mem, slice};

use crate::capacity::{contracted_capacity, grown_capacity, initial_capacity};
use crate::error::{DynListError, contract_violation};
use crate::header::Header;
use crate::layout::{RAW_HEADER_SIZE, RawHeader, raw_allocation_layout};

/// A list of fixed-width byte elements, stored right after a hidden header.
///
/// The element width (`t_size`) is chosen when the list is initialized and
/// never changes. The list can be turned into a plain pointer to its first
/// element with [`RawDynList::into_raw`] and recovered with [`RawDynList::from_raw`],
/// which is how C code holds on to it.
///
/// ```
/// use dynlist::RawDynList;
///
/// let mut list = RawDynList::with_capacity(4, 0);
/// list.append(&20u32.to_ne_bytes());
/// list.append(&10u32.to_ne_bytes());
/// list.prepend(&5u32.to_ne_bytes());
///
/// assert_eq!(list.len(), 3);
/// assert_eq!(list.get(0), Some(&5u32.to_ne_bytes()[..]));
/// ```
pub struct RawDynList {
    // # Invariants
    //
    // - `None` if and only if the list is uninitialized.
    // - Otherwise the pointer was obtained from the global allocator with
    //   `raw_allocation_layout(t_size, cap)`, where `t_size` and `cap` are the
    //   values stored in the header it points to, and the first `len * t_size`
    //   bytes following the header are initialized.
    ptr: Option<NonNull<RawHeader>>,
}

// SAFETY:
// The list owns plain bytes, which are both `Send` and `Sync`.
unsafe impl Send for RawDynList {}

// SAFETY:
// See above.
unsafe impl Sync for RawDynList {}

impl RawDynList {
    /// Creates an uninitialized list. This does not allocate.
    pub const fn new() -> RawDynList {
        RawDynList { ptr: None }
    }

    /// Creates an initialized, empty list of `t_size`-byte elements with room for
    /// at least `hint` of them.
    pub fn with_capacity(t_size: usize, hint: usize) -> RawDynList {
        let mut list = RawDynList::new();
        list.init(t_size, hint);
        list
    }

    /// Allocates storage for at least `hint` elements of `t_size` bytes each.
    ///
    /// # Panics
    ///
    /// Panics if the list is already initialized.
    #[track_caller]
    pub fn init(&mut self, t_size: usize, hint: usize) {
        if let Err(err) = self.try_init(t_size, hint) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`RawDynList::init`].
    pub fn try_init(&mut self, t_size: usize, hint: usize) -> Result<(), DynListError> {
        if self.is_initialized() {
            return Err(DynListError::AlreadyInitialized);
        }
        let cap = initial_capacity(hint);
        let layout = raw_allocation_layout(t_size, cap);
        // SAFETY:
        // The layout always includes the header, so its size is non-zero.
        let header = unsafe { alloc(layout) } as *mut RawHeader;
        let Some(header) = NonNull::new(header) else {
            handle_alloc_error(layout)
        };
        // SAFETY:
        // The allocation is large enough and aligned for a `RawHeader`.
        unsafe {
            header.write(RawHeader {
                list: Header::new(0, cap),
                t_size,
            })
        };
        self.ptr = Some(header);
        tracing::debug!(t_size, capacity = cap, "initialized raw dynlist");
        Ok(())
    }

    /// Frees the storage and leaves the list uninitialized.
    ///
    /// Destroying an uninitialized list does nothing.
    pub fn destroy(&mut self) {
        let Some(header) = self.ptr.take() else {
            return;
        };
        // SAFETY:
        // The header was initialized by `try_init` and is kept up to date.
        let RawHeader { list, t_size } = unsafe { header.read() };
        tracing::debug!(
            t_size,
            len = list.len(),
            capacity = list.capacity(),
            "destroying raw dynlist"
        );
        // SAFETY:
        // - The pointer was allocated via the same global allocator.
        // - The header records the capacity and width the current allocation was made for.
        unsafe {
            dealloc(
                header.as_ptr() as *mut u8,
                raw_allocation_layout(t_size, list.capacity()),
            )
        };
    }

    /// Returns `true` if the list owns storage.
    #[inline]
    pub const fn is_initialized(&self) -> bool {
        self.ptr.is_some()
    }

    /// Returns the number of elements in the list. Zero if uninitialized.
    #[inline]
    pub fn len(&self) -> usize {
        self.header().map_or(0, |header| header.list.len())
    }

    /// Returns `true` if the list contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of elements the list can hold without reallocating.
    /// Zero if uninitialized.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.header().map_or(0, |header| header.list.capacity())
    }

    /// Returns the width of one element in bytes. Zero if uninitialized.
    #[inline]
    pub fn element_size(&self) -> usize {
        self.header().map_or(0, |header| header.t_size)
    }

    /// Returns the bytes of every element, back to back.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY:
        // - The first `len * t_size` bytes after the header are initialized.
        // - The pointer is dangling only when the list is uninitialized, in which case the length is zero.
        unsafe { slice::from_raw_parts(self.data_raw(), self.len() * self.element_size()) }
    }

    /// Returns the bytes of every element, back to back.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY:
        // Same as `as_bytes`, and we have exclusive access through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.data_raw(), self.len() * self.element_size()) }
    }

    /// Returns the bytes of the element at `index`, or [`None`] if out of bounds.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        let t_size = self.element_size();
        (index < self.len()).then(|| &self.as_bytes()[index * t_size..(index + 1) * t_size])
    }

    /// Returns the bytes of the element at `index`, or [`None`] if out of bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let t_size = self.element_size();
        if index < self.len() {
            Some(&mut self.as_bytes_mut()[index * t_size..(index + 1) * t_size])
        } else {
            None
        }
    }

    /// Returns a pointer to the first element, or null if uninitialized.
    ///
    /// This is the value [`RawDynList::into_raw`] would return.
    pub fn as_ptr(&self) -> *const c_void {
        match self.ptr {
            Some(_) => self.data_raw() as *const c_void,
            None => ptr::null(),
        }
    }

    /// Consumes the list and returns a pointer to its first element,
    /// or null if it is uninitialized.
    ///
    /// The storage is leaked until the pointer is handed back to [`RawDynList::from_raw`].
    pub fn into_raw(self) -> *mut c_void {
        let handle = self.as_ptr() as *mut c_void;
        mem::forget(self);
        handle
    }

    /// Takes back ownership of a list handed out by [`RawDynList::into_raw`].
    ///
    /// A null pointer gives back an uninitialized list.
    ///
    /// # Safety
    ///
    /// 1. `handle` must be null or have been returned by [`RawDynList::into_raw`].
    /// 2. The same handle must not be turned back into a list more than once,
    ///    unless the previous list was itself forgotten without being dropped or mutated.
    pub unsafe fn from_raw(handle: *mut c_void) -> RawDynList {
        let ptr = NonNull::new(handle as *mut u8).map(|data| {
            // SAFETY:
            // By the safety contract, `data` sits `RAW_HEADER_SIZE` bytes after the
            // start of the allocation, where the header lives.
            unsafe { data.sub(RAW_HEADER_SIZE) }.cast::<RawHeader>()
        });
        RawDynList { ptr }
    }

    /// Makes sure the list can hold at least `n` elements without reallocating.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    #[track_caller]
    pub fn ensure(&mut self, n: usize) {
        if let Err(err) = self.try_ensure(n) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`RawDynList::ensure`].
    pub fn try_ensure(&mut self, n: usize) -> Result<(), DynListError> {
        let cap = self.initialized_header()?.list.capacity();
        self.reallocate(grown_capacity(cap, n));
        Ok(())
    }

    /// Inserts a copy of `element` at position `index`, shifting all elements
    /// after it to the right, and returns the inserted bytes.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized, if `index > len`, or if
    /// `element` isn't exactly one element wide.
    #[track_caller]
    pub fn insert(&mut self, index: usize, element: &[u8]) -> &mut [u8] {
        match self.try_insert(index, element) {
            Ok(slot) => slot,
            Err(err) => contract_violation(err),
        }
    }

    /// Fallible version of [`RawDynList::insert`].
    pub fn try_insert(&mut self, index: usize, element: &[u8]) -> Result<&mut [u8], DynListError> {
        let t_size = self.initialized_header()?.t_size;
        check_element_size(t_size, element.len())?;
        let slot = self.open_slot(index)?;
        // SAFETY:
        // - `open_slot` returned `t_size` writable bytes that belong to the list.
        // - `element` can't overlap them, since we hold `&mut self`.
        unsafe { ptr::copy_nonoverlapping(element.as_ptr(), slot, t_size) };
        // SAFETY:
        // The slot is now initialized, and the borrow is tied to `&mut self`.
        Ok(unsafe { slice::from_raw_parts_mut(slot, t_size) })
    }

    /// Appends a copy of `element` to the back of the list.
    #[track_caller]
    pub fn append(&mut self, element: &[u8]) -> &mut [u8] {
        self.insert(self.len(), element)
    }

    /// Inserts a copy of `element` at the front of the list.
    #[track_caller]
    pub fn prepend(&mut self, element: &[u8]) -> &mut [u8] {
        self.insert(0, element)
    }

    /// Opens a slot at position `index` and returns a pointer to it, leaving its
    /// content unspecified.
    ///
    /// # Safety
    ///
    /// The caller must write `element_size()` bytes through the returned pointer
    /// before the slot is read, and before the list is reallocated.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized or if `index > len`.
    #[track_caller]
    pub unsafe fn insert_uninit(&mut self, index: usize) -> *mut u8 {
        match self.open_slot(index) {
            Ok(slot) => slot,
            Err(err) => contract_violation(err),
        }
    }

    /// Removes the element at `index`, copying it into `out` when given, and
    /// shrinks the storage once the list is at most a quarter full.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized or empty, if `index >= len`, or if
    /// `out` isn't exactly one element wide.
    #[track_caller]
    pub fn remove(&mut self, index: usize, out: Option<&mut [u8]>) {
        if let Err(err) = self.try_remove(index, true, out) {
            contract_violation(err)
        }
    }

    /// Like [`RawDynList::remove`], but never shrinks the storage.
    #[track_caller]
    pub fn remove_no_contract(&mut self, index: usize, out: Option<&mut [u8]>) {
        if let Err(err) = self.try_remove(index, false, out) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`RawDynList::remove`] and [`RawDynList::remove_no_contract`].
    pub fn try_remove(
        &mut self,
        index: usize,
        allow_contract: bool,
        out: Option<&mut [u8]>,
    ) -> Result<(), DynListError> {
        let RawHeader { list, t_size } = *self.initialized_header()?;
        let len = list.len();
        if len == 0 {
            return Err(DynListError::Empty);
        }
        if index >= len {
            return Err(DynListError::IndexOutOfBounds { index, len });
        }
        if let Some(out) = &out {
            check_element_size(t_size, out.len())?;
        }

        let bytes = self.as_bytes_mut();
        if let Some(out) = out {
            out.copy_from_slice(&bytes[index * t_size..(index + 1) * t_size]);
        }
        bytes.copy_within((index + 1) * t_size.., index * t_size);

        let new_len = len - 1;
        self.set_len(new_len);
        if allow_contract {
            self.reallocate(contracted_capacity(list.capacity(), new_len));
        }
        Ok(())
    }

    /// Removes the last element, copying it into `out` when given.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized or empty.
    #[track_caller]
    pub fn pop(&mut self, out: Option<&mut [u8]>) {
        if let Err(err) = self.try_pop(out) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`RawDynList::pop`].
    pub fn try_pop(&mut self, out: Option<&mut [u8]>) -> Result<(), DynListError> {
        match self.initialized_header()?.list.len() {
            0 => Err(DynListError::Empty),
            len => self.try_remove(len - 1, true, out),
        }
    }

    /// Resizes the list to `n` elements. New elements are zeroed.
    ///
    /// The storage is reallocated only if `n` exceeds the capacity; shrinking
    /// keeps it in place.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    #[track_caller]
    pub fn resize(&mut self, n: usize) {
        if let Err(err) = self.try_resize(n) {
            contract_violation(err)
        }
    }

    /// Same as [`RawDynList::resize`], which never contracts either.
    #[track_caller]
    pub fn resize_no_contract(&mut self, n: usize) {
        self.resize(n);
    }

    /// Fallible version of [`RawDynList::resize`].
    pub fn try_resize(&mut self, n: usize) -> Result<(), DynListError> {
        let old_len = self.initialized_header()?.list.len();
        self.resize_storage(n)?;
        if n > old_len {
            let t_size = self.element_size();
            // SAFETY:
            // `resize_storage` made room for `n` elements, so the range is in bounds.
            unsafe {
                ptr::write_bytes(self.data_raw().add(old_len * t_size), 0, (n - old_len) * t_size)
            };
        }
        Ok(())
    }

    /// Removes every element. The capacity is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    #[track_caller]
    pub fn clear(&mut self) {
        self.resize(0);
    }

    /// Returns an independent, initialized copy of the list.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    #[track_caller]
    pub fn copy(&self) -> RawDynList {
        match self.try_copy() {
            Ok(copy) => copy,
            Err(err) => contract_violation(err),
        }
    }

    /// Fallible version of [`RawDynList::copy`].
    pub fn try_copy(&self) -> Result<RawDynList, DynListError> {
        let RawHeader { list, t_size } = *self.initialized_header()?;
        let mut copy = RawDynList::with_capacity(t_size, list.len());
        let bytes = self.as_bytes();
        // SAFETY:
        // The copy has room for `list.len()` elements and is a separate allocation.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), copy.data_raw(), bytes.len()) };
        copy.set_len(list.len());
        Ok(copy)
    }

    /// Appends a copy of every element of `other`.
    ///
    /// # Panics
    ///
    /// Panics if either list is uninitialized or if their element widths differ.
    #[track_caller]
    pub fn append_all(&mut self, other: &RawDynList) {
        if let Err(err) = self.try_append_all(other) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`RawDynList::append_all`].
    pub fn try_append_all(&mut self, other: &RawDynList) -> Result<(), DynListError> {
        let RawHeader { list, t_size } = *self.initialized_header()?;
        check_element_size(t_size, other.initialized_header()?.t_size)?;
        let offset = list.len() * t_size;
        let required = list
            .len()
            .checked_add(other.len())
            .expect("capacity overflow");
        self.resize_storage(required)?;
        let bytes = other.as_bytes();
        // SAFETY:
        // - The list now has room for `required` elements, so the destination is in bounds.
        // - `other` is a different list, since we hold `&mut self`.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), self.data_raw().add(offset), bytes.len()) };
        Ok(())
    }

    /// Sorts the elements with a comparator, preserving the order of equal elements.
    ///
    /// Does nothing if the list is uninitialized.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&[u8], &[u8]) -> Ordering,
    {
        let len = self.len();
        if len < 2 {
            return;
        }
        let t_size = self.element_size();
        let mut order: Vec<usize> = (0..len).collect();
        {
            let bytes = self.as_bytes();
            let element = |i: usize| &bytes[i * t_size..(i + 1) * t_size];
            order.sort_by(|&a, &b| compare(element(a), element(b)));
        }
        let sorted: Vec<u8> = order
            .iter()
            .flat_map(|&i| self.as_bytes()[i * t_size..(i + 1) * t_size].iter().copied())
            .collect();
        self.as_bytes_mut().copy_from_slice(&sorted);
    }

    /// Inserts a copy of `element` into a list sorted by `compare`, and returns the
    /// inserted bytes.
    ///
    /// The element goes before the first one comparing strictly greater than it,
    /// that is after every element comparing equal to it.
    ///
    /// Returns [`None`] if the list is uninitialized.
    ///
    /// # Panics
    ///
    /// Panics if `element` isn't exactly one element wide.
    #[track_caller]
    pub fn insert_sorted_by<F>(&mut self, mut compare: F, element: &[u8]) -> Option<&mut [u8]>
    where
        F: FnMut(&[u8], &[u8]) -> Ordering,
    {
        if !self.is_initialized() {
            return None;
        }
        let t_size = self.element_size();
        let (mut low, mut high) = (0, self.len());
        {
            let bytes = self.as_bytes();
            while low < high {
                let mid = low + (high - low) / 2;
                match compare(&bytes[mid * t_size..(mid + 1) * t_size], element) {
                    Ordering::Greater => high = mid,
                    Ordering::Less | Ordering::Equal => low = mid + 1,
                }
            }
        }
        Some(self.insert(low, element))
    }

    /// Sets the length to `n`, growing the storage if needed, and leaves the
    /// content of new slots untouched.
    fn resize_storage(&mut self, n: usize) -> Result<(), DynListError> {
        let cap = self.initialized_header()?.list.capacity();
        if n > cap {
            self.reallocate(grown_capacity(cap, n));
        }
        self.set_len(n);
        Ok(())
    }

    /// Makes room for one element at `index` and returns a pointer to it.
    fn open_slot(&mut self, index: usize) -> Result<*mut u8, DynListError> {
        let RawHeader { list, t_size } = *self.initialized_header()?;
        let len = list.len();
        if index > len {
            return Err(DynListError::IndexOutOfBounds { index, len });
        }
        if len == list.capacity() {
            self.reallocate(grown_capacity(list.capacity(), len + 1));
        }
        // SAFETY:
        // `index <= len < capacity`, so the slot lies within the allocation.
        let slot = unsafe { self.data_raw().add(index * t_size) };
        // SAFETY:
        // - The source range covers the initialized elements `index..len`.
        // - The destination range ends at `len + 1 <= capacity` elements.
        // - `ptr::copy` handles the overlap.
        unsafe { ptr::copy(slot, slot.add(t_size), (len - index) * t_size) };
        self.set_len(len + 1);
        Ok(slot)
    }

    fn header(&self) -> Option<&RawHeader> {
        // SAFETY:
        // The pointer refers to an initialized header, per the invariants on `ptr`,
        // and the borrow is tied to `&self`.
        self.ptr.map(|header| unsafe { header.as_ref() })
    }

    fn initialized_header(&self) -> Result<&RawHeader, DynListError> {
        self.header().ok_or(DynListError::Uninitialized)
    }

    /// Sets the length of an initialized list.
    fn set_len(&mut self, len: usize) {
        if let Some(mut header) = self.ptr {
            // SAFETY:
            // The header is initialized, and we have exclusive access through `&mut self`.
            unsafe { header.as_mut() }.list.set_len(len);
        }
    }

    /// Return a pointer to the first element; dangling (but aligned) when uninitialized.
    fn data_raw(&self) -> *mut u8 {
        match self.ptr {
            // SAFETY:
            // The allocation always extends `RAW_HEADER_SIZE` bytes past its start.
            Some(header) => unsafe { header.as_ptr().cast::<u8>().add(RAW_HEADER_SIZE) },
            None => NonNull::dangling().as_ptr(),
        }
    }

    /// Moves the list to an allocation of `new_cap` elements. Does nothing on an
    /// uninitialized list, or if the capacity wouldn't change.
    ///
    /// `new_cap` must be at least the current length.
    fn reallocate(&mut self, new_cap: usize) {
        let Some(header) = self.ptr else {
            return;
        };
        // SAFETY:
        // The header is initialized, per the invariants on `ptr`.
        let RawHeader { list, t_size } = unsafe { header.read() };
        if new_cap == list.capacity() {
            return;
        }
        tracing::trace!(
            old_capacity = list.capacity(),
            new_capacity = new_cap,
            len = list.len(),
            t_size,
            "reallocating raw dynlist"
        );

        let new_layout = raw_allocation_layout(t_size, new_cap);
        // SAFETY:
        // - The pointer was allocated via the same global allocator, with the
        //   layout recorded in its header.
        // - The new size is non-zero and doesn't exceed `isize::MAX`, since
        //   `raw_allocation_layout` would have panicked otherwise.
        let raw = unsafe {
            realloc(
                header.as_ptr() as *mut u8,
                raw_allocation_layout(t_size, list.capacity()),
                new_layout.size(),
            )
        } as *mut RawHeader;
        let Some(mut header) = NonNull::new(raw) else {
            handle_alloc_error(new_layout)
        };
        // SAFETY:
        // `realloc` preserved the header, and nothing else refers to the new allocation yet.
        unsafe { header.as_mut() }.list.set_capacity(new_cap);
        self.ptr = Some(header);
    }
}

fn check_element_size(expected: usize, actual: usize) -> Result<(), DynListError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DynListError::ElementSizeMismatch { expected, actual })
    }
}

impl Drop for RawDynList {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl Default for RawDynList {
    fn default() -> RawDynList {
        RawDynList::new()
    }
}

impl Clone for RawDynList {
    /// Uninitialized lists clone to uninitialized lists; initialized ones are [copied](RawDynList::copy).
    fn clone(&self) -> RawDynList {
        if self.is_initialized() {
            self.copy()
        } else {
            RawDynList::new()
        }
    }
}

impl fmt::Debug for RawDynList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDynList")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("element_size", &self.element_size())
            .field("bytes", &self.as_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_sits_before_data() {
        let list = RawDynList::with_capacity(8, 0);
        let header = list.ptr.unwrap().as_ptr() as usize;
        assert_eq!(list.as_ptr() as usize - header, RAW_HEADER_SIZE);
        assert_eq!(list.as_ptr() as usize % crate::RAW_HEADER_ALIGN, 0);
    }

    #[test]
    fn test_header_survives_reallocation() {
        let mut list = RawDynList::with_capacity(3, 0);
        for i in 0..20u8 {
            list.append(&[i, i, i]);
        }
        let header = list.header().unwrap();
        assert_eq!(header.t_size, 3);
        assert_eq!(header.list.len(), 20);
        assert_eq!(header.list.capacity(), 32);
    }

    #[test]
    fn test_failed_insert_leaves_list_untouched() {
        let mut list = RawDynList::with_capacity(2, 0);
        list.append(&[1, 2]);
        assert_eq!(
            list.try_insert(0, &[1, 2, 3]).unwrap_err(),
            DynListError::ElementSizeMismatch {
                expected: 2,
                actual: 3
            }
        );
        assert_eq!(
            list.try_insert(5, &[1, 2]).unwrap_err(),
            DynListError::IndexOutOfBounds { index: 5, len: 1 }
        );
        assert_eq!(list.as_bytes(), &[1, 2]);
    }
}
