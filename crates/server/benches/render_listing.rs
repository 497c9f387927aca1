//! Performance benchmarks for the listing path.
//!
//! These benchmarks measure the per-request hot path:
//! - Directory enumeration with metadata and permission probes
//! - HTML page rendering
//! - Size formatting

use std::fs;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use server::files::DirectoryBrowser;
use server::ui::render_listing;

/// A directory with `files` files and `dirs` subdirectories.
fn populated_dir(files: usize, dirs: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for i in 0..files {
        fs::write(temp_dir.path().join(format!("file-{i:04}.txt")), b"contents").unwrap();
    }
    for i in 0..dirs {
        fs::create_dir(temp_dir.path().join(format!("dir-{i:03}"))).unwrap();
    }
    temp_dir
}

/// Benchmark directory enumeration.
fn bench_list_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_directory");

    for (label, files, dirs) in [("small_10", 8, 2), ("medium_100", 80, 20), ("large_1000", 900, 100)] {
        let temp_dir = populated_dir(files, dirs);
        let browser = DirectoryBrowser::new(temp_dir.path()).unwrap();

        group.bench_function(label, |b| {
            b.iter(|| browser.list_directory(black_box(browser.root())).unwrap());
        });
    }

    group.finish();
}

/// Benchmark HTML page rendering over pre-listed entries.
fn bench_render_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_listing");

    for (label, files, dirs) in [("small_10", 8, 2), ("medium_100", 80, 20), ("large_1000", 900, 100)] {
        let temp_dir = populated_dir(files, dirs);
        let browser = DirectoryBrowser::new(temp_dir.path()).unwrap();
        let entries = browser.list_directory(browser.root()).unwrap();

        group.bench_function(label, |b| {
            b.iter(|| render_listing(black_box("bench/dir"), black_box(&entries), true));
        });
    }

    group.finish();
}

/// Benchmark the size formatter across magnitudes.
fn bench_format_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_size");

    group.bench_function("mixed_magnitudes", |b| {
        b.iter(|| {
            for size in [0u64, 512, 4096, 1 << 20, 5 << 30, u64::MAX] {
                black_box(server::ui::format::format_size(black_box(size)));
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_list_directory,
    bench_render_listing,
    bench_format_size
);
criterion_main!(benches);
