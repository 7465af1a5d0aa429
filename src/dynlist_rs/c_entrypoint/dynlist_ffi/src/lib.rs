/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! C entrypoint for [`RawDynList`].
//!
//! C code holds a list through a plain `void*` pointing at its first element,
//! or `NULL` for an uninitialized list. Functions that may move the storage take
//! a pointer to that handle (`void**`) and store the new handle back before returning.
//!
//! ```c
//! int *numbers = NULL;
//! dynlist_init((void **)&numbers, sizeof(int), 0);
//! *(int *)dynlist_append((void **)&numbers) = 20;
//! *(int *)dynlist_append((void **)&numbers) = 10;
//! dynlist_sort((void **)&numbers, cmp_int);
//! for (size_t i = 0; i < dynlist_size(numbers); i++) {
//!   printf("%d\n", numbers[i]);
//! }
//! dynlist_destroy((void **)&numbers);
//! ```
//!
//! Contract violations (out-of-bounds indices, operations that need an initialized
//! list called on `NULL`, element width mismatches) panic. Panics can't unwind
//! through `extern "C"` functions, so the process aborts after printing the diagnostic.

use std::cmp::Ordering;
use std::ffi::{c_int, c_void};
use std::mem::ManuallyDrop;
use std::slice;

use dynlist::RawDynList;
use libc::size_t;

pub mod logging;

/// Compares two elements, returning a negative value, zero or a positive value
/// if the first one is respectively less than, equal to or greater than the second one.
pub type DynlistCmpFn = unsafe extern "C" fn(a: *const c_void, b: *const c_void) -> c_int;

/// Runs `f` on the list behind `*plist`, then stores the possibly moved handle back.
///
/// # Safety
///
/// 1. `plist` must be a valid pointer to a handle.
/// 2. The handle must be null or come from this library, and not have been destroyed since.
unsafe fn with_list<R>(
    plist: *mut *mut c_void,
    caller: &str,
    f: impl FnOnce(&mut RawDynList) -> R,
) -> R {
    assert!(!plist.is_null(), "{caller} called with a null list pointer");
    // Safety: Caller must ensure 1.
    let handle = unsafe { plist.read() };
    // Safety: Caller must ensure 2. The list is handed back below, so it is never dropped here.
    let mut list = ManuallyDrop::new(unsafe { RawDynList::from_raw(handle) });
    let result = f(&mut list);
    // Safety: Caller must ensure 1.
    unsafe { plist.write(ManuallyDrop::into_inner(list).into_raw()) };
    result
}

/// Borrows the list behind a handle without taking ownership of it.
///
/// # Safety
///
/// The handle must be null or come from this library, and not have been destroyed since.
unsafe fn view(handle: *const c_void) -> ManuallyDrop<RawDynList> {
    // Safety: Guaranteed by the caller. The list is never dropped.
    ManuallyDrop::new(unsafe { RawDynList::from_raw(handle as *mut c_void) })
}

fn ordering(cmp: Option<DynlistCmpFn>, caller: &str) -> impl FnMut(&[u8], &[u8]) -> Ordering {
    let cmp = cmp.unwrap_or_else(|| panic!("{caller} called with a null comparator"));
    // Safety: The comparator is a valid C function reading one element from each pointer.
    move |a: &[u8], b: &[u8]| unsafe { cmp(a.as_ptr().cast(), b.as_ptr().cast()) }.cmp(&0)
}

/// Initializes the list behind `plist` with room for at least `cap` elements of `t_size` bytes.
///
/// Passing `0` as `cap` selects the minimum capacity.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a `NULL` handle.
///
/// Aborts if the handle is already initialized.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_init(plist: *mut *mut c_void, t_size: size_t, cap: size_t) {
    // Safety: Caller must ensure 1.
    unsafe { with_list(plist, "dynlist_init", |list| list.init(t_size, cap)) }
}

/// Frees the list behind `plist` and resets the handle to `NULL`.
/// Destroying a `NULL` handle does nothing.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a handle that is `NULL` or was created by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_destroy(plist: *mut *mut c_void) {
    // Safety: Caller must ensure 1.
    unsafe { with_list(plist, "dynlist_destroy", RawDynList::destroy) }
}

/// Returns the number of elements in the list, or 0 for a `NULL` handle.
///
/// Safety:
/// 1. `list` must be `NULL` or a live handle created by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_size(list: *const c_void) -> size_t {
    // Safety: Caller must ensure 1.
    unsafe { view(list) }.len()
}

/// Returns the capacity of the list, or 0 for a `NULL` handle.
///
/// Safety:
/// 1. `list` must be `NULL` or a live handle created by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_capacity(list: *const c_void) -> size_t {
    // Safety: Caller must ensure 1.
    unsafe { view(list) }.capacity()
}

/// Grows the list so it can hold at least `n` elements without reallocating.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_ensure(plist: *mut *mut c_void, n: size_t) {
    // Safety: Caller must ensure 1.
    unsafe { with_list(plist, "dynlist_ensure", |list| list.ensure(n)) }
}

/// Opens a slot at `index`, shifting the following elements to the right,
/// and returns a pointer to it. The caller must fill the slot.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
/// 2. The returned slot must be written before the list is read or modified again.
///
/// Aborts if `index` is greater than the size of the list.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_insert(plist: *mut *mut c_void, index: size_t) -> *mut c_void {
    // Safety: Caller must ensure 1. and 2.
    unsafe {
        with_list(plist, "dynlist_insert", |list| {
            list.insert_uninit(index).cast::<c_void>()
        })
    }
}

/// Opens a slot at the end of the list and returns a pointer to it.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
/// 2. The returned slot must be written before the list is read or modified again.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_append(plist: *mut *mut c_void) -> *mut c_void {
    // Safety: Caller must ensure 1. and 2.
    unsafe {
        with_list(plist, "dynlist_append", |list| {
            list.insert_uninit(list.len()).cast::<c_void>()
        })
    }
}

/// Opens a slot at the front of the list and returns a pointer to it.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
/// 2. The returned slot must be written before the list is read or modified again.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_prepend(plist: *mut *mut c_void) -> *mut c_void {
    // Safety: Caller must ensure 1. and 2.
    unsafe {
        with_list(plist, "dynlist_prepend", |list| {
            list.insert_uninit(0).cast::<c_void>()
        })
    }
}

/// Removes the element at `index`, copying it to `out` unless `out` is `NULL`,
/// and shrinks the storage once the list is at most a quarter full.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
/// 2. `out` must be `NULL` or valid for writes of one element, outside of the list.
///
/// Aborts if `index` is out of bounds.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_remove(plist: *mut *mut c_void, index: size_t, out: *mut c_void) {
    // Safety: Caller must ensure 1. and 2.
    unsafe { remove(plist, index, out, true, "dynlist_remove") }
}

/// Like [`dynlist_remove`], but never shrinks the storage.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
/// 2. `out` must be `NULL` or valid for writes of one element, outside of the list.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_remove_no_contract(
    plist: *mut *mut c_void,
    index: size_t,
    out: *mut c_void,
) {
    // Safety: Caller must ensure 1. and 2.
    unsafe { remove(plist, index, out, false, "dynlist_remove_no_contract") }
}

/// Removes the last element, copying it to `out` unless `out` is `NULL`.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
/// 2. `out` must be `NULL` or valid for writes of one element, outside of the list.
///
/// Aborts if the list is empty.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_pop(plist: *mut *mut c_void, out: *mut c_void) {
    // Safety: Caller must ensure 1. and 2.
    unsafe {
        with_list(plist, "dynlist_pop", |list| {
            let out = out_slot(out, list.element_size());
            list.pop(out)
        })
    }
}

/// # Safety
///
/// Same as [`dynlist_remove`].
unsafe fn remove(
    plist: *mut *mut c_void,
    index: size_t,
    out: *mut c_void,
    allow_contract: bool,
    caller: &str,
) {
    // Safety: Guaranteed by the caller.
    unsafe {
        with_list(plist, caller, |list| {
            let out = out_slot(out, list.element_size());
            if allow_contract {
                list.remove(index, out)
            } else {
                list.remove_no_contract(index, out)
            }
        })
    }
}

/// # Safety
///
/// `out` must be null or valid for writes of `t_size` bytes.
unsafe fn out_slot<'a>(out: *mut c_void, t_size: usize) -> Option<&'a mut [u8]> {
    // Safety: Guaranteed by the caller.
    (!out.is_null()).then(|| unsafe { slice::from_raw_parts_mut(out.cast::<u8>(), t_size) })
}

/// Sets the size of the list to `n`. New elements are zeroed.
///
/// The storage only moves if `n` exceeds the capacity. Shrinking keeps it in place.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_resize(plist: *mut *mut c_void, n: size_t) {
    // Safety: Caller must ensure 1.
    unsafe { with_list(plist, "dynlist_resize", |list| list.resize(n)) }
}

/// Same as [`dynlist_resize`], which never shrinks the storage either.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_resize_no_contract(plist: *mut *mut c_void, n: size_t) {
    // Safety: Caller must ensure 1.
    unsafe {
        with_list(plist, "dynlist_resize_no_contract", |list| {
            list.resize_no_contract(n)
        })
    }
}

/// Removes every element. The capacity and the handle are left untouched.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a live handle created by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_clear(plist: *mut *mut c_void) {
    // Safety: Caller must ensure 1.
    unsafe { with_list(plist, "dynlist_clear", RawDynList::clear) }
}

/// Returns a new, independent list holding the same elements.
///
/// Safety:
/// 1. `list` must be a live handle created by this library.
///
/// Aborts if `list` is `NULL`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_copy(list: *const c_void) -> *mut c_void {
    // Safety: Caller must ensure 1.
    unsafe { view(list) }.copy().into_raw()
}

/// Appends a copy of every element of `src` to the list behind `pdst`.
/// `src` may be the destination list itself.
///
/// Safety:
/// 1. `pdst` must be a valid pointer to a live handle created by this library.
/// 2. `src` must be a live handle created by this library.
///
/// Aborts if the element sizes differ.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_push_all(pdst: *mut *mut c_void, src: *const c_void) {
    // Safety: Caller must ensure 1. and 2.
    unsafe {
        with_list(pdst, "dynlist_push_all", |dst| {
            if !src.is_null() && dst.as_ptr() == src {
                let copy = dst.copy();
                dst.append_all(&copy);
            } else {
                dst.append_all(&view(src));
            }
        })
    }
}

/// Sorts the list with `cmp`. Equal elements keep their relative order.
/// Sorting a `NULL` handle does nothing.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a handle that is `NULL` or was created by this library.
/// 2. `cmp` must be safe to call with pointers to any two elements of the list.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_sort(plist: *mut *mut c_void, cmp: Option<DynlistCmpFn>) {
    let compare = ordering(cmp, "dynlist_sort");
    // Safety: Caller must ensure 1. and 2.
    unsafe { with_list(plist, "dynlist_sort", |list| list.sort_by(compare)) }
}

/// Inserts a copy of the element at `value` into a list sorted by `cmp`, after
/// every element comparing equal to it, and returns a pointer to the inserted element.
///
/// Returns `NULL` if the handle is `NULL`.
///
/// Safety:
/// 1. `plist` must be a valid pointer to a handle that is `NULL` or was created by this library.
/// 2. `cmp` must be safe to call with pointers to any two elements of the list.
/// 3. `value` must be valid for reads of one element.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dynlist_insert_sorted(
    plist: *mut *mut c_void,
    cmp: Option<DynlistCmpFn>,
    value: *const c_void,
) -> *mut c_void {
    let compare = ordering(cmp, "dynlist_insert_sorted");
    // Safety: Caller must ensure 1., 2. and 3.
    unsafe {
        with_list(plist, "dynlist_insert_sorted", |list| {
            if !list.is_initialized() {
                return std::ptr::null_mut();
            }
            assert!(!value.is_null(), "dynlist_insert_sorted called with a null value");
            // `value` may point into the list itself, which is about to move.
            let value = slice::from_raw_parts(value.cast::<u8>(), list.element_size()).to_vec();
            list.insert_sorted_by(compare, &value)
                .map_or(std::ptr::null_mut(), |slot| slot.as_mut_ptr().cast::<c_void>())
        })
    }
}

/// Installs a global `tracing` subscriber printing the library's diagnostics to
/// stderr, filtered by the `RUST_LOG` environment variable.
///
/// Returns `false` if a global subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn dynlist_init_logging() -> bool {
    match logging::try_init() {
        Ok(()) => {
            tracing::debug!("dynlist logging initialized");
            true
        }
        Err(_) => false,
    }
}
