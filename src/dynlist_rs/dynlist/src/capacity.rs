/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! The growth and shrink policy shared by every list flavour.
//!
//! Capacities are always powers of two and never drop below [`MIN_CAPACITY`].
//! Growth doubles the current capacity until the request fits, and never contracts.
//! Contraction halves the capacity only while the list would still be at most
//! half full afterwards, i.e. a list shrinks once its occupancy reaches one quarter.
//! The gap between the growth and the shrink thresholds keeps a list that
//! alternates insertions and removals around a boundary from reallocating every time.

/// The capacity floor of an initialized list.
pub const MIN_CAPACITY: usize = 4;

const _: () = assert!(MIN_CAPACITY.is_power_of_two());

/// The capacity of a freshly created list asked to hold at least `hint` elements.
///
/// # Panics
///
/// Panics if the capacity overflows `usize`.
pub(crate) fn initial_capacity(hint: usize) -> usize {
    grown_capacity(MIN_CAPACITY, hint)
}

/// The capacity of a list currently holding `current` slots that needs room for
/// `required` elements. Returns `current` when it already suffices.
///
/// # Panics
///
/// Panics if the capacity overflows `usize`.
pub(crate) fn grown_capacity(current: usize, required: usize) -> usize {
    let mut cap = current.max(MIN_CAPACITY);
    while cap < required {
        cap = cap.checked_mul(2).expect("capacity overflow");
    }
    cap
}

/// The capacity of a list with `current` slots once its length dropped to `len`.
pub(crate) const fn contracted_capacity(current: usize, len: usize) -> usize {
    let mut cap = current;
    // `cap / 4 >= len` is `cap / 2 >= 2 * len` without the overflow.
    while cap > MIN_CAPACITY && cap / 4 >= len {
        cap /= 2;
    }
    cap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_capacity() {
        assert_eq!(initial_capacity(0), MIN_CAPACITY);
        assert_eq!(initial_capacity(1), MIN_CAPACITY);
        assert_eq!(initial_capacity(4), 4);
        assert_eq!(initial_capacity(5), 8);
        assert_eq!(initial_capacity(9), 16);
        assert_eq!(initial_capacity(1024), 1024);
    }

    #[test]
    fn test_grown_capacity_doubles() {
        assert_eq!(grown_capacity(4, 5), 8);
        assert_eq!(grown_capacity(8, 9), 16);
        assert_eq!(grown_capacity(16, 100), 128);
    }

    #[test]
    fn test_grown_capacity_never_contracts() {
        assert_eq!(grown_capacity(64, 3), 64);
        assert_eq!(grown_capacity(64, 64), 64);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn test_grown_capacity_overflow() {
        grown_capacity(MIN_CAPACITY, usize::MAX);
    }

    #[test]
    fn test_contracted_capacity_hysteresis() {
        // More than a quarter full: keep the capacity.
        assert_eq!(contracted_capacity(16, 8), 16);
        assert_eq!(contracted_capacity(16, 5), 16);
        // A quarter full: halve once.
        assert_eq!(contracted_capacity(16, 4), 8);
        assert_eq!(contracted_capacity(8, 3), 8);
        assert_eq!(contracted_capacity(8, 2), 4);
        // Empty lists fall back to the floor.
        assert_eq!(contracted_capacity(1024, 0), MIN_CAPACITY);
        assert_eq!(contracted_capacity(MIN_CAPACITY, 0), MIN_CAPACITY);
    }

    #[test]
    fn test_contracted_capacity_covers_len() {
        for cap in (2..12).map(|shift| 1usize << shift) {
            for len in 0..=cap {
                let new_cap = contracted_capacity(cap, len);
                assert!(new_cap >= len);
                assert!(new_cap >= MIN_CAPACITY);
                assert!(new_cap.is_power_of_two());
            }
        }
    }
}
