// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the flickwerk-security crate: the byte-level
// marker scan and SHA-256 fingerprint hashing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use flickwerk_security::{SecurityScanner, hash_bytes};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Benchmark the full byte scan at representative document sizes.
///
/// The buffers carry no markers, so the scan walks the whole window set —
/// the worst case for the pattern search.
fn bench_scan_bytes(c: &mut Criterion) {
    let sizes: &[(&str, usize)] = &[
        ("64 KiB", 64 * 1024),
        ("512 KiB", 512 * 1024),
        ("2 MiB", 2 * 1024 * 1024),
    ];

    let scanner = SecurityScanner::new();
    let mut group = c.benchmark_group("scan_bytes");
    for &(label, size) in sizes {
        let mut data = vec![b'A'; size];
        data[0..9].copy_from_slice(b"%PDF-1.4\n");
        group.bench_function(label, |b| {
            b.iter(|| {
                let result = scanner.scan_bytes(black_box(&data));
                black_box(result);
            });
        });
    }
    group.finish();
}

/// Benchmark SHA-256 fingerprint hashing at various document sizes.
///
/// Sizes: 1 KiB, 10 KiB, 100 KiB, 1 MiB -- covering the range from small
/// receipts to full-page scanned documents.
fn bench_fingerprint_hash(c: &mut Criterion) {
    let sizes: &[(&str, usize)] = &[
        ("1 KiB", 1024),
        ("10 KiB", 10 * 1024),
        ("100 KiB", 100 * 1024),
        ("1 MiB", 1024 * 1024),
    ];

    let mut group = c.benchmark_group("fingerprint_sha256");
    for &(label, size) in sizes {
        let data = vec![0xABu8; size];
        group.bench_function(label, |b| {
            b.iter(|| {
                let hex = hash_bytes(black_box(&data));
                black_box(hex);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scan_bytes, bench_fingerprint_hash);
criterion_main!(benches);
