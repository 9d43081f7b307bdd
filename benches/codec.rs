// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for id derivation and context header handling.
//!
//! Run with: `cargo bench --bench codec`

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use servicegraph::codec::{decode, encode};
use servicegraph::identity::{derive, service_id, transaction_id, DEFAULT_SERVICE_NAMESPACE};
use servicegraph::CallContext;

fn bench_identity(c: &mut Criterion) {
    let mut group = c.benchmark_group("identity");

    group.bench_function("service_id", |b| {
        b.iter(|| service_id(black_box(DEFAULT_SERVICE_NAMESPACE), black_box("checkout-service")))
    });

    let parent = service_id(DEFAULT_SERVICE_NAMESPACE, "shop");
    group.bench_function("transaction_id", |b| {
        b.iter(|| transaction_id(black_box(parent), black_box("/api/v1/cart/checkout")))
    });

    group.finish();
}

fn bench_header(c: &mut Criterion) {
    let service = derive(DEFAULT_SERVICE_NAMESPACE, "shop");
    let ctx = CallContext::new(service, Some(transaction_id(service, "checkout")));
    let header = encode(&ctx).unwrap_or_default();

    let mut group = c.benchmark_group("context_header");

    group.bench_function("encode", |b| b.iter(|| encode(black_box(&ctx))));
    group.bench_function("decode", |b| b.iter(|| decode(black_box(&header))));

    let noisy = format!("foo=bar service-node=not-an-id {header} trailing");
    group.bench_function("decode_noisy", |b| b.iter(|| decode(black_box(&noisy))));

    group.finish();
}

criterion_group!(benches, bench_identity, bench_header);
criterion_main!(benches);
