use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Cursor;
use utl::reverse::{reverse_blocks, reverse_lines, ReverseOptions};
use utl::{Resource, TextEncoding};

fn log_lines(count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| format!("2024-01-01T00:00:{:02}Z INFO request {} served in {}ms\n", i % 60, i, i % 97).into_bytes())
        .collect()
}

fn bench_reverse_lines(c: &mut Criterion) {
    let data = log_lines(20_000);

    for block_size in [512usize, 4096, 65536] {
        c.bench_function(&format!("reverse_lines_bs{}", block_size), |b| {
            b.iter(|| {
                let mut res = Resource::binary(Cursor::new(black_box(&data)));
                let options = ReverseOptions { block_size, ..Default::default() };
                reverse_lines(&mut res, options).unwrap().count()
            })
        });
    }

    c.bench_function("reverse_lines_utf8_4k", |b| {
        b.iter(|| {
            let mut res = Resource::binary(Cursor::new(black_box(&data)));
            let options = ReverseOptions { encoding: TextEncoding::Utf8, ..Default::default() };
            reverse_lines(&mut res, options).unwrap().count()
        })
    });
}

fn bench_tail(c: &mut Criterion) {
    let data = log_lines(200_000);

    c.bench_function("last_10_lines_of_200k", |b| {
        b.iter(|| {
            let mut res = Resource::binary(Cursor::new(black_box(&data)));
            reverse_lines(&mut res, ReverseOptions::default()).unwrap().take(10).count()
        })
    });
}

fn bench_reverse_blocks(c: &mut Criterion) {
    let data = vec![b'x'; 4 * 1024 * 1024];

    c.bench_function("reverse_blocks_4mb", |b| {
        b.iter(|| {
            let mut res = Resource::binary(Cursor::new(black_box(&data)));
            reverse_blocks(&mut res, 4096).unwrap().count()
        })
    });
}

criterion_group!(benches, bench_reverse_lines, bench_tail, bench_reverse_blocks);
criterion_main!(benches);
