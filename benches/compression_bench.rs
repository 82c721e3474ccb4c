use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pk_zip::{crc32, ArchiveOptions, ZipArchive};
use tempfile::NamedTempFile;

fn generate_compressible_data(size: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let mut data = Vec::with_capacity(size);
    while data.len() < size {
        data.extend_from_slice(pattern);
    }
    data.truncate(size);
    data
}

fn generate_random_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state = 0x12345678u32;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

fn write_single(path: &std::path::Path, level: u32, data: &[u8]) {
    let options = ArchiveOptions::default().compression_level(level);
    let mut archive = ZipArchive::with_options(path, options).unwrap();
    archive.add_bytes("test.bin", black_box(data).to_vec()).unwrap();
    archive.save().unwrap();
}

fn bench_compression_levels(c: &mut Criterion) {
    let sizes = vec![
        1024,            // 1KB
        100 * 1024,      // 100KB
        1024 * 1024,     // 1MB
        8 * 1024 * 1024, // 8MB
    ];

    for size in sizes {
        let mut group = c.benchmark_group(format!("write_compressible_{}", format_size(size)));
        group.throughput(Throughput::Bytes(size as u64));

        let data = generate_compressible_data(size);

        for level in [1u32, 6, 9] {
            group.bench_with_input(
                BenchmarkId::new(format!("deflate_level_{}", level), size),
                &data,
                |b, data| {
                    b.iter(|| {
                        let temp = NamedTempFile::new().unwrap();
                        write_single(temp.path(), level, data);
                    });
                },
            );
        }

        group.finish();
    }
}

fn bench_random_data_compression(c: &mut Criterion) {
    let sizes = vec![100 * 1024, 1024 * 1024];

    for size in sizes {
        let mut group = c.benchmark_group(format!("write_random_{}", format_size(size)));
        group.throughput(Throughput::Bytes(size as u64));

        let data = generate_random_data(size);

        group.bench_with_input(BenchmarkId::new("in_memory", size), &data, |b, data| {
            b.iter(|| {
                let mut archive = ZipArchive::in_memory();
                archive.add_bytes("random.bin", black_box(data).clone()).unwrap();
                archive.save().unwrap();
                archive.into_saved_bytes()
            });
        });

        group.finish();
    }
}

fn bench_multiple_entries(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_multiple_entries");

    let entry_count = 100;
    let entry_size = 10 * 1024;
    group.throughput(Throughput::Bytes((entry_count * entry_size) as u64));

    let data = generate_compressible_data(entry_size);

    group.bench_function("deflate_100_entries", |b| {
        b.iter(|| {
            let temp = NamedTempFile::new().unwrap();
            let mut archive = ZipArchive::new(temp.path()).unwrap();
            for i in 0..entry_count {
                archive
                    .add_bytes(format!("file_{}.txt", i), black_box(&data).clone())
                    .unwrap();
            }
            archive.save().unwrap();
        });
    });

    group.finish();
}

fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32");
    let data = generate_random_data(1024 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("table_driven", |b| {
        b.iter(|| crc32::checksum(black_box(&data)));
    });
    group.bench_function("crc32fast", |b| {
        b.iter(|| crc32fast::hash(black_box(&data)));
    });

    group.finish();
}

fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{}MB", bytes / (1024 * 1024))
    }
}

criterion_group!(
    benches,
    bench_compression_levels,
    bench_random_data_compression,
    bench_multiple_entries,
    bench_checksum
);
criterion_main!(benches);
