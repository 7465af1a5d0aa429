/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Supporting types and functions for benchmarking dynlist operations.
//!
//! Each group measures [`DynList`], its type-erased sibling [`RawDynList`]
//! and `Vec` on the same inputs, so the cost of the capacity policy shows up
//! next to the standard library's.

use criterion::{
    BatchSize, BenchmarkGroup, Criterion,
    measurement::{Measurement, WallTime},
};
use dynlist::{DynList, RawDynList};
use std::{hint::black_box, time::Duration};

/// A helper struct for benchmarking dynlist operations against `Vec`.
pub struct OperationBencher {
    /// The values pushed, inserted or sorted by every benchmark.
    values: Vec<u32>,

    /// How long to run benchmarks overall.
    measurement_time: Duration,

    /// The prefix added to the label of each benchmark group.
    prefix: String,
}

impl OperationBencher {
    /// Creates a new `OperationBencher` working on `len` pseudo-random values.
    pub fn new(prefix: String, len: usize, measurement_time: Duration) -> Self {
        Self {
            values: generate_values(len),
            measurement_time,
            prefix,
        }
    }

    fn benchmark_group<'a>(
        &self,
        c: &'a mut Criterion,
        label: &str,
    ) -> BenchmarkGroup<'a, WallTime> {
        let mut group = c.benchmark_group(format!("{}|{}", self.prefix, label));
        group.measurement_time(self.measurement_time);
        group.warm_up_time(Duration::from_secs(2));
        group
    }

    /// Benchmark appending every value to an empty list.
    pub fn append_group(&self, c: &mut Criterion) {
        let mut group = self.benchmark_group(c, "Append");
        append_benchmark(&mut group, &self.values);
        group.finish();
    }

    /// Benchmark building a sorted list one value at a time.
    pub fn insert_sorted_group(&self, c: &mut Criterion) {
        let mut group = self.benchmark_group(c, "Insert Sorted");
        insert_sorted_benchmark(&mut group, &self.values);
        group.finish();
    }

    /// Benchmark draining a full list from the front, which shifts every
    /// remaining element and, for contracting removals, shrinks the storage.
    pub fn remove_front_group(&self, c: &mut Criterion) {
        let mut group = self.benchmark_group(c, "Remove Front");
        remove_front_benchmark(&mut group, &self.values);
        group.finish();
    }

    /// Benchmark sorting an unsorted list.
    pub fn sort_group(&self, c: &mut Criterion) {
        let mut group = self.benchmark_group(c, "Sort");
        sort_benchmark(&mut group, &self.values);
        group.finish();
    }

    /// Benchmark the quadratic exchange sort against the default one.
    ///
    /// Only meant for short lists.
    pub fn exchange_sort_group(&self, c: &mut Criterion) {
        let mut group = self.benchmark_group(c, "Exchange Sort");
        exchange_sort_benchmark(&mut group, &self.values);
        group.finish();
    }
}

/// Deterministic xorshift values, so that runs are comparable.
fn generate_values(len: usize) -> Vec<u32> {
    let mut state = 0x2545_f491_u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        })
        .collect()
}

fn raw_from(values: &[u32]) -> RawDynList {
    let mut list = RawDynList::with_capacity(size_of::<u32>(), values.len());
    for value in values {
        list.append(&value.to_ne_bytes());
    }
    list
}

fn compare_raw(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    let a = u32::from_ne_bytes([a[0], a[1], a[2], a[3]]);
    let b = u32::from_ne_bytes([b[0], b[1], b[2], b[3]]);
    a.cmp(&b)
}

fn append_benchmark<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, values: &[u32]) {
    group.bench_function("DynList", |b| {
        b.iter(|| {
            let mut list = DynList::create();
            for &value in values {
                list.append(black_box(value));
            }
            list
        })
    });
    group.bench_function("RawDynList", |b| {
        b.iter(|| {
            let mut list = RawDynList::with_capacity(size_of::<u32>(), 0);
            for value in values {
                list.append(black_box(&value.to_ne_bytes()));
            }
            list
        })
    });
    group.bench_function("Vec", |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for &value in values {
                vec.push(black_box(value));
            }
            vec
        })
    });
}

fn insert_sorted_benchmark<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, values: &[u32]) {
    group.bench_function("DynList", |b| {
        b.iter(|| {
            let mut list = DynList::create();
            for &value in values {
                list.insert_sorted_by(u32::cmp, black_box(value));
            }
            list
        })
    });
    group.bench_function("RawDynList", |b| {
        b.iter(|| {
            let mut list = RawDynList::with_capacity(size_of::<u32>(), 0);
            for value in values {
                list.insert_sorted_by(compare_raw, black_box(&value.to_ne_bytes()));
            }
            list
        })
    });
    group.bench_function("Vec", |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for &value in values {
                let index = vec.partition_point(|x| *x <= value);
                vec.insert(index, black_box(value));
            }
            vec
        })
    });
}

fn remove_front_benchmark<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, values: &[u32]) {
    group.bench_function("DynList", |b| {
        b.iter_batched(
            || DynList::from(values),
            |mut list| {
                while !list.is_empty() {
                    black_box(list.remove(0));
                }
                list
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("DynList no contract", |b| {
        b.iter_batched(
            || DynList::from(values),
            |mut list| {
                while !list.is_empty() {
                    black_box(list.remove_no_contract(0));
                }
                list
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("RawDynList", |b| {
        b.iter_batched(
            || raw_from(values),
            |mut list| {
                let mut out = [0u8; 4];
                while !list.is_empty() {
                    list.remove(0, Some(&mut out[..]));
                    black_box(out);
                }
                list
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("Vec", |b| {
        b.iter_batched(
            || values.to_vec(),
            |mut vec| {
                while !vec.is_empty() {
                    black_box(vec.remove(0));
                }
                vec
            },
            BatchSize::SmallInput,
        )
    });
}

fn sort_benchmark<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, values: &[u32]) {
    group.bench_function("DynList", |b| {
        b.iter_batched(
            || DynList::from(values),
            |mut list| {
                list.sort_by(u32::cmp);
                list
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("RawDynList", |b| {
        b.iter_batched(
            || raw_from(values),
            |mut list| {
                list.sort_by(compare_raw);
                list
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("Vec", |b| {
        b.iter_batched(
            || values.to_vec(),
            |mut vec| {
                vec.sort();
                vec
            },
            BatchSize::SmallInput,
        )
    });
}

fn exchange_sort_benchmark<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, values: &[u32]) {
    group.bench_function("Exchange", |b| {
        b.iter_batched(
            || DynList::from(values),
            |mut list| {
                list.exchange_sort_by(u32::cmp);
                list
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("Stable", |b| {
        b.iter_batched(
            || DynList::from(values),
            |mut list| {
                list.sort_by(u32::cmp);
                list
            },
            BatchSize::SmallInput,
        )
    });
}
