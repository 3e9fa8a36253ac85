//! Benchmark suite for CG decoding
//!
//! Measures QNT decoding against the standard codecs on synthetic images,
//! plus the QNT encoder and header-only metrics.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use sys4_benches::{generate_test_cg_data, generate_test_image, sizes};
use sys4_types::file::{CgType, cg};

fn bench_decode(c: &mut Criterion) {
	let mut group = c.benchmark_group("cg_decode");

	for (label, (w, h)) in [("tiny", sizes::TINY), ("small", sizes::SMALL), ("screen", sizes::SCREEN)] {
		group.throughput(Throughput::Elements(u64::from(w) * u64::from(h)));
		for kind in [CgType::Qnt, CgType::Png, CgType::Webp] {
			let data = generate_test_cg_data(w, h, kind);
			group.bench_with_input(BenchmarkId::new(kind.to_string(), label), &data, |b, data| {
				b.iter(|| black_box(cg::load_buffer(black_box(data))));
			});
		}
	}

	group.finish();
}

fn bench_qnt_encode(c: &mut Criterion) {
	let mut group = c.benchmark_group("qnt_encode");

	for (label, (w, h)) in [("small", sizes::SMALL), ("hd", sizes::HD)] {
		let image = generate_test_image(w, h);
		group.throughput(Throughput::Elements(u64::from(w) * u64::from(h)));
		group.bench_with_input(BenchmarkId::from_parameter(label), &image, |b, image| {
			b.iter(|| {
				let mut out = Vec::new();
				black_box(cg::write(black_box(image), CgType::Qnt, &mut out)).ok();
				out
			});
		});
	}

	group.finish();
}

fn bench_metrics(c: &mut Criterion) {
	let mut group = c.benchmark_group("cg_metrics");

	for kind in [CgType::Qnt, CgType::Png] {
		let data = generate_test_cg_data(sizes::HD.0, sizes::HD.1, kind);
		group.bench_with_input(BenchmarkId::from_parameter(kind), &data, |b, data| {
			b.iter(|| black_box(cg::get_metrics(black_box(data))));
		});
	}

	group.bench_function("sniff", |b| {
		let data = generate_test_cg_data(8, 8, CgType::Webp);
		b.iter(|| black_box(cg::check_format(black_box(&data))));
	});

	group.finish();
}

criterion_group!(benches, bench_decode, bench_qnt_encode, bench_metrics);
criterion_main!(benches);
