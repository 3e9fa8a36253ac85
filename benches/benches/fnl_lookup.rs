//! Benchmark suite for FNL glyph lookup and inflation
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml --bench fnl_lookup

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use sys4_benches::generate_test_fnl_data;
use sys4_types::file::{
	FnlFile,
	fnl::{char_to_index, index::INDEX_LIMIT, index_to_char},
};

fn bench_index_mapping(c: &mut Criterion) {
	let mut group = c.benchmark_group("fnl_index");
	group.throughput(Throughput::Elements(u64::from(INDEX_LIMIT)));

	group.bench_function("index_to_char_to_index", |b| {
		b.iter(|| {
			let mut sum = 0u32;
			for index in 0..INDEX_LIMIT {
				sum = sum.wrapping_add(char_to_index(index_to_char(black_box(index))));
			}
			sum
		});
	});

	group.finish();
}

fn bench_glyph_data(c: &mut Criterion) {
	let mut group = c.benchmark_group("fnl_glyph");

	for height in [16u32, 32] {
		let fnl = match FnlFile::from_bytes(generate_test_fnl_data(height, 2000)) {
			Ok(fnl) => fnl,
			Err(e) => panic!("invalid benchmark font: {}", e),
		};
		let face = &fnl.fonts()[0].faces()[0];

		group.bench_function(format!("lookup_and_inflate_{}px", height), |b| {
			b.iter(|| {
				let glyph = face.glyph(black_box(0x82a0));
				glyph.map(|g| fnl.glyph_data(g).map(|d| d.len()))
			});
		});
	}

	group.finish();
}

criterion_group!(benches, bench_index_mapping, bench_glyph_data);
criterion_main!(benches);
