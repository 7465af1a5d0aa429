/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! A growable, contiguous list with a predictable capacity policy.
//!
//! The crate offers two flavours of the same container:
//!
//! - [`DynList<T>`], the typed list. The element width is `size_of::<T>()`, known at compile time.
//! - [`RawDynList`], a byte-width list whose element width is chosen at runtime.
//!   Its storage starts with a hidden header, so the list can be handed over to C
//!   as a single pointer to its first element (see the `dynlist_ffi` crate).
//!
//! # Memory layout
//!
//! A `DynList<u64>` holding three elements looks as follows:
//!
//!```text
//!   Stack               |              Heap
//!   -----               |              ----
//!                       |
//!  +---------------+    |
//!  | ptr (8 bytes) | -------> +----------------------+
//!  | len (8 bytes) |    |     | 20          (8 bytes)|
//!  | cap (8 bytes) |    |     | 10          (8 bytes)|
//!  +---------------+    |     | 5           (8 bytes)|
//!                       |     | (unused)    (8 bytes)|
//!                       |     +----------------------+
//! ```
//!
//! A [`RawDynList`] keeps the bookkeeping in front of the elements instead:
//!
//!```text
//!   Stack                  |              Heap
//!   -----                  |              ----
//!                          |
//!  +------------------+    |    Header +----------------------+
//!  | handle (8 bytes) | ---|--+        | 3 (size)    (8 bytes)|
//!  +------------------+    |  |        | 4 (cap)     (8 bytes)|
//!                          |  |        | 8 (t_size)  (8 bytes)|
//!                          |  |        | (padding)   (8 bytes)|
//!                          |  +-> Data +----------------------+
//!                          |           | 20          (8 bytes)|
//!                          |           | ...                  |
//! ```
//!
//! # Capacity policy
//!
//! - An initialized list always has a power-of-two capacity of at least [`MIN_CAPACITY`].
//! - Inserting into a full list doubles its capacity.
//! - Removing elements may halve the capacity, but only once the list is at most a
//!   quarter full. Operations named `*_no_contract` never give memory back.
//! - Resizing and clearing only reallocate to grow. Shrinking the length keeps the
//!   storage where it is.
//!
//! Any operation that grows or shrinks the storage may move it: pointers and
//! references into a list must not be kept across mutating calls.
//!
//! # Initialization
//!
//! [`DynList::new`] produces an *uninitialized* list that owns no storage.
//! Its size and capacity read as zero, sorting it is a no-op, and every other
//! operation that needs storage is a contract violation. Lists are initialized
//! with [`DynList::create`], [`DynList::with_capacity`] or [`DynList::init`].
//!
//! # Contract violations
//!
//! Out-of-range indices, operations on uninitialized lists, double initialization
//! and element width mismatches are programmer errors: the operations panic.
//! Every such operation also has a `try_*` counterpart returning a [`DynListError`].
use std::alloc::{alloc, dealloc, handle_alloc_error, realloc};
use std::borrow::{Borrow, BorrowMut};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::{fmt, mem, ptr, slice};

pub use capacity::MIN_CAPACITY;
pub use error::DynListError;
pub use layout::{RAW_HEADER_ALIGN, RAW_HEADER_SIZE};
pub use raw::RawDynList;

use capacity::{contracted_capacity, grown_capacity, initial_capacity};
use error::contract_violation;
use header::Header;
use layout::elements_layout;

mod capacity;
mod error;
mod header;
mod layout;
mod raw;

/// Allocates the element storage for a `DynList<T>` with the given capacity.
///
/// Zero-sized layouts are never passed to the allocator: a dangling, well aligned
/// pointer stands in for them.
fn allocate_elements<T>(cap: usize) -> NonNull<T> {
    let layout = elements_layout::<T>(cap);
    if layout.size() == 0 {
        return NonNull::dangling();
    }
    // SAFETY:
    // `layout.size()` is greater than zero, as checked above.
    let ptr = unsafe { alloc(layout) } as *mut T;
    let Some(ptr) = NonNull::new(ptr) else {
        handle_alloc_error(layout)
    };
    ptr
}

/// Frees storage obtained from [`allocate_elements`].
///
/// # Safety
///
/// `ptr` must come from `allocate_elements::<T>(cap)` (or a reallocation to `cap`)
/// and must not be used afterwards.
unsafe fn free_elements<T>(ptr: NonNull<T>, cap: usize) {
    let layout = elements_layout::<T>(cap);
    if layout.size() != 0 {
        // SAFETY:
        // - The pointer was allocated via the same global allocator.
        // - The layout matches the one used for the allocation, as guaranteed by the caller.
        unsafe { dealloc(ptr.as_ptr() as *mut u8, layout) }
    }
}

/// See the crate's top level documentation for a description of this type.
pub struct DynList<T> {
    // # Invariants
    //
    // - `ptr` is `None` if and only if the list is uninitialized,
    //   in which case `header` is `Header::EMPTY`.
    // - Otherwise `ptr` was obtained from `allocate_elements::<T>(header.capacity())`
    //   (possibly followed by reallocations, the latest one to `header.capacity()`),
    //   and the first `header.len()` slots are initialized.
    ptr: Option<NonNull<T>>,
    header: Header,
    // Makes the compiler's drop check behave as if we own a `T`.
    _phantom: PhantomData<T>,
}

// SAFETY:
// `DynList<T>` uniquely owns its elements, like `Vec<T>`.
// It is `Send` under the same conditions.
unsafe impl<T: Send> Send for DynList<T> {}

// SAFETY:
// Shared access to a `DynList<T>` only hands out shared access to its elements.
unsafe impl<T: Sync> Sync for DynList<T> {}

/// Creates an initialized [`DynList`] containing the arguments.
///
/// ```rust
/// use dynlist::dynlist;
///
/// let list = dynlist![20, 10, 5];
/// assert_eq!(list.len(), 3);
/// assert_eq!(list, [20, 10, 5]);
///
/// let list = dynlist![0u8; 6];
/// assert_eq!(list, [0, 0, 0, 0, 0, 0]);
/// assert_eq!(list.capacity(), 8);
///
/// let empty: dynlist::DynList<u32> = dynlist![];
/// assert!(empty.is_initialized());
/// ```
#[macro_export]
macro_rules! dynlist {
    (@UNIT $($t:tt)*) => (());

    ($elem:expr; $n:expr) => ({
        let n = $n;
        let mut list = $crate::DynList::with_capacity(n);
        list.resize(n, $elem);
        list
    });
    () => {$crate::DynList::create()};
    ($($x:expr),*) => ({
        let len = [$($crate::dynlist!(@UNIT $x)),*].len();
        let mut list = $crate::DynList::with_capacity(len);
        $(list.push($x);)*
        list
    });
    ($($x:expr,)*) => ($crate::dynlist![$($x),*]);
}

impl<T> DynList<T> {
    /// Creates an uninitialized list. This does not allocate.
    ///
    /// ```
    /// use dynlist::DynList;
    ///
    /// let list = DynList::<u32>::new();
    /// assert!(!list.is_initialized());
    /// assert_eq!(list.len(), 0);
    /// assert_eq!(list.capacity(), 0);
    /// ```
    pub const fn new() -> DynList<T> {
        DynList {
            ptr: None,
            header: Header::EMPTY,
            _phantom: PhantomData,
        }
    }

    /// Creates an initialized, empty list with [`MIN_CAPACITY`] slots.
    pub fn create() -> DynList<T> {
        DynList::with_capacity(MIN_CAPACITY)
    }

    /// Creates an initialized, empty list able to hold at least `hint` elements
    /// without reallocating.
    ///
    /// The capacity is the smallest power of two that is at least
    /// `max(hint, MIN_CAPACITY)`.
    ///
    /// # Panics
    ///
    /// Panics if the storage would exceed `isize::MAX` bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynlist::DynList;
    ///
    /// let list = DynList::<u64>::with_capacity(10);
    /// assert_eq!(list.len(), 0);
    /// assert_eq!(list.capacity(), 16);
    ///
    /// let list = DynList::<u64>::with_capacity(0);
    /// assert_eq!(list.capacity(), dynlist::MIN_CAPACITY);
    /// ```
    pub fn with_capacity(hint: usize) -> DynList<T> {
        let mut list = DynList::new();
        list.init(hint);
        list
    }

    /// Allocates storage for at least `hint` elements.
    ///
    /// # Panics
    ///
    /// Panics if the list is already initialized.
    #[track_caller]
    pub fn init(&mut self, hint: usize) {
        if let Err(err) = self.try_init(hint) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`DynList::init`].
    pub fn try_init(&mut self, hint: usize) -> Result<(), DynListError> {
        if self.is_initialized() {
            return Err(DynListError::AlreadyInitialized);
        }
        let cap = initial_capacity(hint);
        self.ptr = Some(allocate_elements::<T>(cap));
        self.header = Header::new(0, cap);
        Ok(())
    }

    /// Drops every element, frees the storage and leaves the list uninitialized.
    ///
    /// Destroying an uninitialized list does nothing. The list can be
    /// initialized again afterwards.
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![1, 2, 3];
    /// list.destroy();
    /// assert!(!list.is_initialized());
    /// list.destroy();
    ///
    /// list.init(0);
    /// list.push(4);
    /// assert_eq!(list, [4]);
    /// ```
    pub fn destroy(&mut self) {
        let Some(ptr) = self.ptr.take() else {
            return;
        };
        let header = mem::replace(&mut self.header, Header::EMPTY);
        let elements = ptr::slice_from_raw_parts_mut(ptr.as_ptr(), header.len());
        // SAFETY:
        // - The first `header.len()` slots are initialized, per the invariants on `ptr`.
        // - The list no longer refers to them, so they can't be dropped twice.
        unsafe { ptr::drop_in_place(elements) };
        // SAFETY:
        // `ptr` was allocated for `header.capacity()` elements and has been detached from the list.
        unsafe { free_elements(ptr, header.capacity()) };
    }

    /// Returns `true` if the list owns storage.
    #[inline]
    pub const fn is_initialized(&self) -> bool {
        self.ptr.is_some()
    }

    /// Returns the number of elements in the list. Zero if uninitialized.
    #[inline]
    pub const fn len(&self) -> usize {
        self.header.len()
    }

    /// Returns `true` if the list contains no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of elements the list can hold without reallocating.
    /// Zero if uninitialized.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.header.capacity()
    }

    /// Returns the number of heap bytes owned by the list.
    ///
    /// Does not take into account any memory owned by the elements themselves.
    ///
    /// ```
    /// use dynlist::DynList;
    ///
    /// let list: DynList<i32> = DynList::with_capacity(5);
    /// assert_eq!(list.mem_usage(), 32);
    /// assert_eq!(DynList::<u64>::new().mem_usage(), 0);
    /// ```
    pub fn mem_usage(&self) -> usize {
        elements_layout::<T>(self.capacity()).size()
    }

    /// Forces the length of the list to `len`.
    ///
    /// # Safety
    ///
    /// - `len` must be less than or equal to [`capacity()`](DynList::capacity).
    /// - The first `len` elements must be initialized.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the capacity.
    pub unsafe fn set_len(&mut self, len: usize) {
        self.header.set_len(len);
    }

    /// Extracts a slice containing the entire list.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY:
        // - The pointer is aligned and valid for `self.len()` elements of the same allocation,
        //   or dangling with a length of zero when uninitialized.
        // - The first `self.len()` elements are initialized.
        // - There are no mutable references to them, since we hold `&self`.
        unsafe { slice::from_raw_parts(self.data_raw(), self.len()) }
    }

    /// Extracts a mutable slice of the entire list.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY:
        // Same as `as_slice`, and we have exclusive access through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.data_raw(), self.len()) }
    }

    /// Makes sure the list can hold at least `n` elements without reallocating.
    ///
    /// The capacity only ever grows here, doubling until `n` fits.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynlist::DynList;
    ///
    /// let mut list = DynList::<u8>::create();
    /// list.ensure(100);
    /// assert_eq!(list.capacity(), 128);
    /// list.ensure(2);
    /// assert_eq!(list.capacity(), 128);
    /// ```
    #[track_caller]
    pub fn ensure(&mut self, n: usize) {
        if let Err(err) = self.try_ensure(n) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`DynList::ensure`].
    pub fn try_ensure(&mut self, n: usize) -> Result<(), DynListError> {
        let ptr = self.initialized_ptr()?;
        let new_cap = grown_capacity(self.capacity(), n);
        // SAFETY:
        // `ptr` is the current storage and `new_cap` covers at least the current capacity.
        unsafe { self.reallocate(ptr, new_cap) };
        Ok(())
    }

    /// Inserts `value` at position `index`, shifting all elements after it to the
    /// right, and returns a reference to the inserted element.
    ///
    /// A full list doubles its capacity first.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized or if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![1, 2, 3];
    /// list.insert(1, 4);
    /// assert_eq!(list, [1, 4, 2, 3]);
    ///
    /// *list.insert(4, 0) += 5;
    /// assert_eq!(list, [1, 4, 2, 3, 5]);
    /// ```
    #[track_caller]
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        match self.try_insert(index, value) {
            Ok(slot) => slot,
            Err(err) => contract_violation(err),
        }
    }

    /// Fallible version of [`DynList::insert`]. `value` is dropped on failure.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<&mut T, DynListError> {
        let ptr = self.initialized_ptr()?;
        let len = self.len();
        if index > len {
            return Err(DynListError::IndexOutOfBounds { index, len });
        }

        if len == self.capacity() {
            let new_cap = grown_capacity(self.capacity(), len + 1);
            // SAFETY:
            // `ptr` is the current storage and `new_cap` is greater than `len`.
            unsafe { self.reallocate(ptr, new_cap) };
        }

        // SAFETY:
        // `index <= len < capacity`, so the pointer is within the allocation.
        let slot = unsafe { self.data_raw().add(index) };
        if index < len {
            // SAFETY:
            // - The source range `index..len` is initialized.
            // - The destination range `index + 1..len + 1` fits, since `len < capacity`.
            // - `ptr::copy` handles the overlap.
            unsafe { ptr::copy(slot, slot.add(1), len - index) };
        }
        // SAFETY:
        // The slot is in bounds and its previous content has been moved one slot to the right.
        unsafe { ptr::write(slot, value) };
        self.header.set_len(len + 1);

        // SAFETY:
        // The slot was just initialized and the borrow is tied to `&mut self`.
        Ok(unsafe { &mut *slot })
    }

    /// Appends `value` to the back of the list, in amortized constant time.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    #[track_caller]
    pub fn push(&mut self, value: T) -> &mut T {
        self.insert(self.len(), value)
    }

    /// Same as [`DynList::push`].
    #[track_caller]
    pub fn append(&mut self, value: T) -> &mut T {
        self.push(value)
    }

    /// Inserts `value` at the front of the list, shifting every element.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    #[track_caller]
    pub fn prepend(&mut self, value: T) -> &mut T {
        self.insert(0, value)
    }

    /// Removes and returns the element at position `index`, shifting all
    /// elements after it to the left.
    ///
    /// Once the list is at most a quarter full, its capacity is halved
    /// (see [`DynList::remove_no_contract`] to keep the storage).
    ///
    /// # Removing while iterating
    ///
    /// Every element after `index` moves down by one position, so a forward
    /// index loop must not advance after a removal, and must re-read the length:
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![1, 2, 3, 4, 5, 6];
    /// let mut i = 0;
    /// while i < list.len() {
    ///     if list[i] % 2 == 0 {
    ///         list.remove(i);
    ///     } else {
    ///         i += 1;
    ///     }
    /// }
    /// assert_eq!(list, [1, 3, 5]);
    /// ```
    ///
    /// [`DynList::retain`] does the same in a single pass.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized, empty, or if `index >= len`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        match self.try_remove(index, true) {
            Ok(value) => value,
            Err(err) => contract_violation(err),
        }
    }

    /// Like [`DynList::remove`], but never shrinks the storage.
    #[track_caller]
    pub fn remove_no_contract(&mut self, index: usize) -> T {
        match self.try_remove(index, false) {
            Ok(value) => value,
            Err(err) => contract_violation(err),
        }
    }

    /// Fallible version of [`DynList::remove`] and [`DynList::remove_no_contract`].
    pub fn try_remove(&mut self, index: usize, allow_contract: bool) -> Result<T, DynListError> {
        let ptr = self.initialized_ptr()?;
        let len = self.len();
        if len == 0 {
            return Err(DynListError::Empty);
        }
        if index >= len {
            return Err(DynListError::IndexOutOfBounds { index, len });
        }

        let new_len = len - 1;
        self.header.set_len(new_len);

        // SAFETY:
        // `index < len`, so the pointer is within the allocation.
        let slot = unsafe { self.data_raw().add(index) };
        // SAFETY:
        // The slot held an initialized element. It is logically uninitialized from now on.
        let value = unsafe { ptr::read(slot) };
        // SAFETY:
        // - The source range `index + 1..len` is initialized and in bounds.
        // - `ptr::copy` handles the overlap with the destination `index..new_len`.
        unsafe { ptr::copy(slot.add(1), slot, new_len - index) };

        if allow_contract {
            let new_cap = contracted_capacity(self.capacity(), new_len);
            // SAFETY:
            // `ptr` is still the current storage and `new_cap` covers `new_len`.
            unsafe { self.reallocate(ptr, new_cap) };
        }
        Ok(value)
    }

    /// Removes the last element and returns it, or [`None`] if the list is empty.
    ///
    /// The storage may shrink, as with [`DynList::remove`].
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![1, 2, 3];
    /// assert_eq!(list.pop(), Some(3));
    /// assert_eq!(list, [1, 2]);
    /// ```
    #[track_caller]
    pub fn pop(&mut self) -> Option<T> {
        if let Err(err) = self.initialized_ptr() {
            contract_violation(err)
        }
        match self.len() {
            0 => None,
            len => Some(self.remove(len - 1)),
        }
    }

    /// Shortens the list, keeping the first `len` elements and dropping the rest.
    ///
    /// Has no effect if `len` is greater than the current length, and never
    /// changes the capacity.
    pub fn truncate(&mut self, len: usize) {
        while len < self.len() {
            // Decrement the length *before* calling drop_in_place(),
            // so that a panic on `Drop` doesn't try to re-drop the
            // value that just failed to drop.
            let new_len = self.len() - 1;
            self.header.set_len(new_len);
            // SAFETY:
            // `new_len` was the index of the last initialized element.
            let element_ptr = unsafe { self.data_raw().add(new_len) };
            // SAFETY:
            // - The pointer is valid and aligned.
            // - We have exclusive access to the element, and the list no longer counts it.
            unsafe { ptr::drop_in_place(element_ptr) };
        }
    }

    /// Resizes the list to `new_len` elements, filling new slots with the values
    /// returned by `fill`.
    ///
    /// The storage is reallocated only if `new_len` exceeds the capacity.
    /// Shrinking drops the trailing elements and keeps the capacity.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    ///
    /// ```
    /// use dynlist::DynList;
    ///
    /// let mut list: DynList<u32> = (0..100).collect();
    /// list.resize_with(10, || 0);
    /// assert_eq!(list.len(), 10);
    /// assert_eq!(list.capacity(), 128);
    /// ```
    #[track_caller]
    pub fn resize_with<F>(&mut self, new_len: usize, fill: F)
    where
        F: FnMut() -> T,
    {
        if let Err(err) = self.try_resize_with(new_len, fill) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`DynList::resize_with`].
    pub fn try_resize_with<F>(&mut self, new_len: usize, mut fill: F) -> Result<(), DynListError>
    where
        F: FnMut() -> T,
    {
        let ptr = self.initialized_ptr()?;
        let old_len = self.len();
        match new_len.cmp(&old_len) {
            Ordering::Less | Ordering::Equal => self.truncate(new_len),
            Ordering::Greater => {
                let cap = self.capacity();
                if new_len > cap {
                    // SAFETY:
                    // `ptr` is the current storage and the grown capacity is at least `new_len`.
                    unsafe { self.reallocate(ptr, grown_capacity(cap, new_len)) };
                }
                let data = self.data_raw();
                for i in old_len..new_len {
                    // SAFETY:
                    // `i < new_len <= capacity`.
                    unsafe { ptr::write(data.add(i), fill()) };
                    // Keep the length in sync, so a panicking `fill` leaks nothing.
                    self.header.set_len(i + 1);
                }
            }
        }
        Ok(())
    }

    /// Removes every element. The capacity is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![1; 100];
    /// list.clear();
    /// assert!(list.is_empty());
    /// assert_eq!(list.capacity(), 128);
    /// ```
    #[track_caller]
    pub fn clear(&mut self) {
        if let Err(err) = self.initialized_ptr() {
            contract_violation(err)
        }
        self.truncate(0);
    }

    /// Sorts the list with a comparator, preserving the order of equal elements.
    ///
    /// Runs in *O*(*n* \* log(*n*)) and produces the same order as
    /// [`DynList::exchange_sort_by`]. Sorting an uninitialized list does nothing.
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![20, 5, 12];
    /// list.sort_by(|a, b| a.cmp(b));
    /// assert_eq!(list, [5, 12, 20]);
    /// ```
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.as_mut_slice().sort_by(compare);
    }

    /// Sorts the list with repeated passes of adjacent swaps.
    ///
    /// Quadratic, stable, and allocation free. Only worth it for small lists;
    /// prefer [`DynList::sort_by`] otherwise.
    pub fn exchange_sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let items = self.as_mut_slice();
        let len = items.len();
        for pass in 1..len {
            let mut swapped = false;
            for j in 0..len - pass {
                if compare(&items[j], &items[j + 1]) == Ordering::Greater {
                    items.swap(j, j + 1);
                    swapped = true;
                }
            }
            if !swapped {
                break;
            }
        }
    }

    /// Inserts `value` into a list already sorted by `compare`, keeping it sorted.
    ///
    /// The position is found by binary search: `value` is inserted before the first
    /// element comparing strictly greater than it, so it lands after every element
    /// comparing equal to it. Returns [`None`], dropping `value`, if the list is
    /// uninitialized. Sortedness is the caller's responsibility and isn't checked.
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![5, 20];
    /// list.insert_sorted_by(|a, b| a.cmp(b), 12);
    /// assert_eq!(list, [5, 12, 20]);
    /// ```
    pub fn insert_sorted_by<F>(&mut self, mut compare: F, value: T) -> Option<&mut T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if !self.is_initialized() {
            return None;
        }
        let index = self
            .as_slice()
            .partition_point(|item| compare(item, &value) != Ordering::Greater);
        self.try_insert(index, value).ok()
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// This is the way to remove elements while walking the list: it operates in
    /// place, preserves the order of the retained elements and never shrinks the storage.
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![1, 2, 3, 4];
    /// list.retain(|&x| x % 2 == 0);
    /// assert_eq!(list, [2, 4]);
    /// ```
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.retain_mut(|x| f(&*x));
    }

    /// Retains only the elements specified by the predicate, passing a mutable reference to it.
    pub fn retain_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        let len = self.len();
        let mut del = 0;
        {
            let items = self.as_mut_slice();
            for i in 0..len {
                if !f(&mut items[i]) {
                    del += 1;
                } else if del > 0 {
                    items.swap(i - del, i);
                }
            }
        }
        if del > 0 {
            self.truncate(len - del);
        }
    }

    fn initialized_ptr(&self) -> Result<NonNull<T>, DynListError> {
        self.ptr.ok_or(DynListError::Uninitialized)
    }

    /// Return a pointer to the first slot; dangling (but aligned) when uninitialized.
    fn data_raw(&self) -> *mut T {
        self.ptr.unwrap_or(NonNull::dangling()).as_ptr()
    }

    /// Moves the storage to an allocation of `new_cap` slots. Does nothing if the
    /// capacity wouldn't change.
    ///
    /// # Safety
    ///
    /// - `ptr` must be the current storage of the list.
    /// - `new_cap` must be at least `self.len()` and at least [`MIN_CAPACITY`].
    unsafe fn reallocate(&mut self, ptr: NonNull<T>, new_cap: usize) {
        let old_cap = self.capacity();
        if new_cap == old_cap {
            return;
        }
        debug_assert!(
            new_cap >= self.len(),
            "New capacity is smaller than the current length"
        );
        tracing::trace!(
            old_capacity = old_cap,
            new_capacity = new_cap,
            len = self.len(),
            "reallocating dynlist"
        );

        let new_layout = elements_layout::<T>(new_cap);
        let new_ptr = if new_layout.size() == 0 {
            // Zero-sized elements take no room, whatever the capacity.
            ptr
        } else {
            // SAFETY:
            // - `ptr` was allocated via the same global allocator, with the layout
            //   for `old_cap` elements, which isn't zero-sized since `T` isn't
            //   and an initialized list has at least `MIN_CAPACITY` slots.
            // - The new size doesn't exceed `isize::MAX`, since
            //   `elements_layout` would have panicked otherwise.
            let raw = unsafe {
                realloc(
                    ptr.as_ptr() as *mut u8,
                    elements_layout::<T>(old_cap),
                    new_layout.size(),
                )
            } as *mut T;
            let Some(new_ptr) = NonNull::new(raw) else {
                handle_alloc_error(new_layout)
            };
            new_ptr
        };
        self.ptr = Some(new_ptr);
        self.header.set_capacity(new_cap);
    }
}

impl<T: Clone> DynList<T> {
    /// Resizes the list to `new_len` elements, filling new slots with clones of `value`.
    ///
    /// Only growing past the capacity reallocates. Shrinking keeps the storage.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist!["hello"];
    /// list.resize(3, "world");
    /// assert_eq!(list, ["hello", "world", "world"]);
    ///
    /// let mut list = dynlist![1, 2, 3, 4, 5];
    /// list.resize(2, 0);
    /// assert_eq!(list, [1, 2]);
    /// assert_eq!(list.capacity(), 8);
    /// ```
    #[track_caller]
    pub fn resize(&mut self, new_len: usize, value: T) {
        self.resize_with(new_len, || value.clone());
    }

    /// Same as [`DynList::resize`]: growth only ever doubles the capacity, so
    /// there is nothing to contract.
    #[track_caller]
    pub fn resize_no_contract(&mut self, new_len: usize, value: T) {
        self.resize(new_len, value);
    }

    /// Returns an independent, initialized list holding clones of the elements.
    ///
    /// The copy's capacity is the smallest allowed one that fits the elements.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![1, 2, 3, 4, 5];
    /// let copy = list.copy();
    /// list[0] = 10;
    /// assert_eq!(copy, [1, 2, 3, 4, 5]);
    /// assert_eq!(copy.capacity(), 8);
    /// ```
    #[track_caller]
    pub fn copy(&self) -> DynList<T> {
        match self.try_copy() {
            Ok(copy) => copy,
            Err(err) => contract_violation(err),
        }
    }

    /// Fallible version of [`DynList::copy`].
    pub fn try_copy(&self) -> Result<DynList<T>, DynListError> {
        self.initialized_ptr()?;
        let mut copy = DynList::with_capacity(self.len());
        // SAFETY:
        // The copy is initialized and has room for `self.len()` elements.
        unsafe { copy.push_cloned_unchecked(self.as_slice()) };
        Ok(copy)
    }

    /// Appends clones of all the elements of `other`, leaving `other` untouched.
    ///
    /// # Panics
    ///
    /// Panics if either list is uninitialized.
    ///
    /// ```
    /// use dynlist::dynlist;
    ///
    /// let mut list = dynlist![1, 2];
    /// let tail = dynlist![3, 4, 5];
    /// list.append_all(&tail);
    /// assert_eq!(list, [1, 2, 3, 4, 5]);
    /// assert_eq!(tail, [3, 4, 5]);
    /// ```
    #[track_caller]
    pub fn append_all(&mut self, other: &DynList<T>) {
        if let Err(err) = self.try_append_all(other) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`DynList::append_all`].
    pub fn try_append_all(&mut self, other: &DynList<T>) -> Result<(), DynListError> {
        other.initialized_ptr()?;
        self.try_extend_from_slice(other.as_slice())
    }

    /// Appends clones of all the elements of `items`.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized.
    #[track_caller]
    pub fn extend_from_slice(&mut self, items: &[T]) {
        if let Err(err) = self.try_extend_from_slice(items) {
            contract_violation(err)
        }
    }

    /// Fallible version of [`DynList::extend_from_slice`].
    pub fn try_extend_from_slice(&mut self, items: &[T]) -> Result<(), DynListError> {
        let required = self
            .len()
            .checked_add(items.len())
            .expect("capacity overflow");
        self.try_ensure(required)?;
        // SAFETY:
        // The list is initialized and `try_ensure` made room for `items`.
        unsafe { self.push_cloned_unchecked(items) };
        Ok(())
    }

    /// Clones `items` into the slots following the last element.
    ///
    /// # Safety
    ///
    /// The list must be initialized, with room for `items.len()` more elements.
    unsafe fn push_cloned_unchecked(&mut self, items: &[T]) {
        let len = self.len();
        debug_assert!(self.is_initialized() && len + items.len() <= self.capacity());
        let data = self.data_raw();
        for (i, item) in items.iter().enumerate() {
            // SAFETY:
            // `len + i < len + items.len() <= capacity`, as guaranteed by the caller.
            unsafe { ptr::write(data.add(len + i), item.clone()) };
            self.header.set_len(len + i + 1);
        }
    }
}

impl<T> Drop for DynList<T> {
    #[inline]
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<T> Deref for DynList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for DynList<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Borrow<[T]> for DynList<T> {
    fn borrow(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> BorrowMut<[T]> for DynList<T> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for DynList<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> Extend<T> for DynList<T> {
    /// Pushes every item of the iterator.
    ///
    /// # Panics
    ///
    /// Panics if the list is uninitialized and the iterator isn't empty.
    #[track_caller]
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        let iter = iter.into_iter();
        let hint = iter.size_hint().0;
        if hint > 0 {
            self.ensure(self.len().saturating_add(hint));
        }
        for item in iter {
            self.push(item);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DynList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T: Hash> Hash for DynList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<A, B> PartialEq<DynList<B>> for DynList<A>
where
    A: PartialEq<B>,
{
    #[inline]
    fn eq(&self, other: &DynList<B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<A, B> PartialEq<Vec<B>> for DynList<A>
where
    A: PartialEq<B>,
{
    #[inline]
    fn eq(&self, other: &Vec<B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<A, B> PartialEq<[B]> for DynList<A>
where
    A: PartialEq<B>,
{
    #[inline]
    fn eq(&self, other: &[B]) -> bool {
        self.as_slice() == other
    }
}

impl<'a, A, B> PartialEq<&'a [B]> for DynList<A>
where
    A: PartialEq<B>,
{
    #[inline]
    fn eq(&self, other: &&'a [B]) -> bool {
        &self.as_slice() == other
    }
}

impl<const N: usize, A, B> PartialEq<[B; N]> for DynList<A>
where
    A: PartialEq<B>,
{
    #[inline]
    fn eq(&self, other: &[B; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynList<T> {}

impl<'a, T> IntoIterator for &'a DynList<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynList<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T: Clone> Clone for DynList<T> {
    /// Uninitialized lists clone to uninitialized lists; initialized ones are [copied](DynList::copy).
    fn clone(&self) -> DynList<T> {
        if self.is_initialized() {
            self.copy()
        } else {
            DynList::new()
        }
    }
}

impl<T> Default for DynList<T> {
    fn default() -> DynList<T> {
        DynList::new()
    }
}

impl<T> FromIterator<T> for DynList<T> {
    #[inline]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> DynList<T> {
        let mut list = DynList::create();
        list.extend(iter);
        list
    }
}

impl<T: Clone> From<&[T]> for DynList<T> {
    /// Allocates a `DynList<T>` and fills it by cloning `items`.
    ///
    /// ```
    /// use dynlist::{DynList, dynlist};
    ///
    /// assert_eq!(DynList::from(&[1, 2, 3][..]), dynlist![1, 2, 3]);
    /// ```
    fn from(items: &[T]) -> DynList<T> {
        let mut list = DynList::with_capacity(items.len());
        list.extend_from_slice(items);
        list
    }
}

impl<T, const N: usize> From<[T; N]> for DynList<T> {
    fn from(items: [T; N]) -> DynList<T> {
        let mut list = DynList::with_capacity(N);
        list.extend(items);
        list
    }
}

#[cfg(test)]
mod tests {
    //! Tests that rely on access to `DynList`'s internals.
    use super::*;

    #[test]
    fn test_data_ptr_alignment() {
        let v = DynList::<u16>::create();
        assert!(v.data_raw() as usize % 2 == 0);

        let v = DynList::<u64>::new();
        assert!(v.data_raw() as usize % 8 == 0);

        #[repr(align(128))]
        struct Funky(#[allow(dead_code)] u8);
        let v = DynList::<Funky>::create();
        assert!(v.data_raw() as usize % 128 == 0);
    }

    #[test]
    fn test_uninitialized_header() {
        let v = DynList::<u32>::new();
        assert_eq!(v.header, Header::EMPTY);
        assert!(v.ptr.is_none());
    }

    #[test]
    fn test_reallocate_same_capacity_keeps_storage() {
        let mut v = dynlist![1, 2, 3];
        let old_ptr = v.as_ptr();
        v.ensure(v.capacity());
        v.resize(3, 0);
        assert_eq!(old_ptr, v.as_ptr());
    }

    #[test]
    fn test_copy_is_disjoint() {
        let v = dynlist![1, 2, 3];
        let w = v.copy();
        assert_eq!(v, w);
        assert!(v.as_ptr() != w.as_ptr());
    }
}
