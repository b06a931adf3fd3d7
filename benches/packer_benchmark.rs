// SPDX-License-Identifier: MIT
//! Benchmarks for packing and random-access reads

use criterion::{criterion_group, criterion_main, Criterion};
use resource_packer::{PackageReader, PackageWriter};
use std::fs;
use std::hint::black_box;
use tempfile::TempDir;

fn populate_source() -> TempDir {
    let source = TempDir::new().unwrap();

    // Text entries that compress
    for i in 0..16 {
        let content = format!("entry {i}: ").repeat(512);
        fs::write(source.path().join(format!("text_{i}.txt")), content).unwrap();
    }

    // 1MB of incompressible data stored raw
    let mut state = 0x243f_6a88_85a3_08d3u64;
    let noise: Vec<u8> = (0..1024 * 1024)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 32) as u8
        })
        .collect();
    fs::write(source.path().join("noise.bin"), noise).unwrap();

    source
}

fn benchmark_pack(c: &mut Criterion) {
    let source = populate_source();
    let out = TempDir::new().unwrap();
    let output = out.path().join("bench.dat");

    c.bench_function("pack_directory", |b| {
        b.iter(|| {
            let writer = PackageWriter::new(black_box(source.path())).unwrap();
            writer.pack(&output).unwrap();
        })
    });
}

fn benchmark_read_bytes(c: &mut Criterion) {
    let source = populate_source();
    let output = source.path().join("bench.dat");
    PackageWriter::new(source.path())
        .unwrap()
        .pack(&output)
        .unwrap();

    let reader = PackageReader::open(&output).unwrap();

    c.bench_function("read_compressed_entry", |b| {
        b.iter(|| {
            let bytes = reader.read_bytes(black_box("text_7")).unwrap();
            black_box(bytes);
        })
    });

    c.bench_function("read_raw_entry", |b| {
        b.iter(|| {
            let bytes = reader.read_bytes(black_box("noise")).unwrap();
            black_box(bytes);
        })
    });
}

fn benchmark_index_load(c: &mut Criterion) {
    let source = populate_source();
    let output = source.path().join("bench.dat");
    PackageWriter::new(source.path())
        .unwrap()
        .pack(&output)
        .unwrap();

    c.bench_function("open_reader", |b| {
        b.iter(|| {
            let reader = PackageReader::open(black_box(&output)).unwrap();
            black_box(reader.len());
        })
    });
}

criterion_group!(
    benches,
    benchmark_pack,
    benchmark_read_bytes,
    benchmark_index_load
);
criterion_main!(benches);
