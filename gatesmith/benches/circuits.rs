// -*- mode: rust; -*-
//
// This file is part of `gatesmith`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

//! Benchmarks for building and evaluating library circuits.

use criterion::{criterion_group, criterion_main, Criterion};
use gatesmith::{
    util::{bytes_to_bits, RngExt},
    Circuit, Library, Optimized,
};
use std::time::Duration;

fn bench_build(c: &mut Criterion) {
    for op in [Optimized::Size, Optimized::Depth] {
        c.bench_function(&format!("build::add64 {}", op), move |bench| {
            bench.iter(|| Library::new().int_int_add(64, 64, 64, op).unwrap());
        });
        c.bench_function(&format!("build::mult32 {}", op), move |bench| {
            bench.iter(|| Library::new().int_int_mult(32, 32, 32, op).unwrap());
        });
    }
    c.bench_function("build::div16", |bench| {
        bench.iter(|| Library::new().int_int_div(16, 16, 16).unwrap());
    });
    c.bench_function("build::aes", |bench| {
        bench.iter(|| Library::new().aes_expanded(10).unwrap());
    });
}

fn bench_cached(c: &mut Criterion) {
    let lib = Library::new();
    lib.int_int_mult(32, 32, 32, Optimized::Depth).unwrap();
    c.bench_function("library::hit", |bench| {
        bench.iter(|| lib.int_int_mult(32, 32, 32, Optimized::Depth).unwrap());
    });
}

fn bench_eval(c: &mut Criterion) {
    let lib = Library::new();
    let mut rng = rand::thread_rng();
    let mult = lib.int_int_mult(32, 32, 32, Optimized::Size).unwrap();
    let (x, y) = (rng.gen_bits(32), rng.gen_bits(32));
    c.bench_function("eval::mult32", move |bench| {
        bench.iter(|| mult.eval_u128(&[x, y]).unwrap());
    });

    let aes = lib.aes_expanded(10).unwrap();
    let inputs = vec![
        bytes_to_bits(&rng.gen_bytes(16)),
        bytes_to_bits(&rng.gen_bytes(176)),
    ];
    c.bench_function("eval::aes", move |bench| {
        bench.iter(|| Circuit::eval_plain(&aes, &inputs).unwrap());
    });
}

criterion_group! {
    name = circuits;
    config = Criterion::default().warm_up_time(Duration::from_millis(100));
    targets = bench_build, bench_cached, bench_eval
}
criterion_main!(circuits);
