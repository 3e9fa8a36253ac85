//! CG decoding through archives

use std::io::Write;

use flate2::{Compression, write::ZlibEncoder};
use sys4_rs::prelude::*;

use crate::{single_volume, write_volumes};

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Cg {
	let pixels = rgba.repeat((width * height) as usize);
	Cg::from_rgba(CgType::Unknown, Metrics::rgba(width, height), pixels).unwrap()
}

fn encode(cg: &Cg, kind: CgType) -> Vec<u8> {
	let mut out = Vec::new();
	cg::write(cg, kind, &mut out).unwrap();
	out
}

/// DCF wrapper around `embedded`, naming `base` as its base image
fn dcf(width: u32, height: u32, base: &str, chunk_map: &[u8], embedded: &[u8]) -> Vec<u8> {
	let rot = (base.len() % 7) as u32 + 1;
	let name: Vec<u8> = base.bytes().map(|b| b.rotate_right(rot)).collect();

	let mut out = b"dcf ".to_vec();
	out.extend_from_slice(&(20 + name.len() as i32).to_le_bytes());
	for v in [1, width as i32, height as i32, 32, name.len() as i32] {
		out.extend_from_slice(&v.to_le_bytes());
	}
	out.extend_from_slice(&name);

	let mut map = (chunk_map.len() as u32).to_le_bytes().to_vec();
	map.extend_from_slice(chunk_map);
	let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
	z.write_all(&map).unwrap();
	let compressed = z.finish().unwrap();
	out.extend_from_slice(b"dfdl");
	out.extend_from_slice(&(compressed.len() as i32 + 4).to_le_bytes());
	out.extend_from_slice(&(map.len() as u32).to_le_bytes());
	out.extend_from_slice(&compressed);

	out.extend_from_slice(b"dcgd");
	out.extend_from_slice(&(embedded.len() as i32).to_le_bytes());
	out.extend_from_slice(embedded);
	out
}

/// Lossless WEBP with an `OVER` chunk naming 1-based entry `base`
fn webp_overlay(cg: &Cg, base: i32) -> Vec<u8> {
	let mut out = encode(cg, CgType::Webp);
	out.extend_from_slice(b"OVER");
	out.extend_from_slice(&4u32.to_le_bytes());
	out.extend_from_slice(&base.to_le_bytes());
	let riff_size = out.len() as u32 - 8;
	out[4..8].copy_from_slice(&riff_size.to_le_bytes());
	out
}

#[test]
fn test_wrapper_sniffs_before_embedded_png() {
	let png = encode(&solid(2, 2, [1, 2, 3, 4]), CgType::Png);
	let data = dcf(2, 2, "base", &[], &png);
	assert_eq!(cg::check_format(&png), CgType::Png);
	assert_eq!(cg::check_format(&data), CgType::Dcf);
	// standalone DCF decoding only accepts an embedded QNT
	assert!(matches!(cg::load_buffer(&data), Err(CgError::Malformed { .. })));
}

#[test]
fn test_load_from_archive() {
	let qnt = encode(&solid(5, 3, [9, 8, 7, 255]), CgType::Qnt);
	let volume = single_volume(&[(b"CG0001.QNT", &qnt), (b"JUNK.BIN", b"not an image")]);
	let dir = tempfile::tempdir().unwrap();
	let paths = write_volumes(dir.path(), &[volume]);
	let archive = AldArchive::open(&[Some(&paths[0])], true).unwrap();

	let metrics = cg::get_metrics_no(&archive, 0).unwrap();
	assert_eq!((metrics.width, metrics.height, metrics.bpp), (5, 3, 24));

	let cg = cg::load(&archive, 0).unwrap();
	assert_eq!(cg.kind(), CgType::Qnt);
	assert_eq!(cg.pixel(4, 2), Some([9, 8, 7, 255]));

	let entry = archive.get(0).unwrap();
	assert_eq!(cg::load_entry(&entry).unwrap().pixels(), cg.pixels());

	assert!(matches!(cg::load(&archive, 1), Err(CgError::UnknownFormat)));
	assert!(matches!(cg::load(&archive, 40), Err(CgError::NotFound { no: 40 })));
	assert!(matches!(cg::get_metrics_no(&archive, 1), Err(CgError::UnknownFormat)));
}

#[test]
fn test_dcf_applies_difference_over_base() {
	let base = encode(&solid(32, 16, [10, 20, 30, 255]), CgType::Qnt);
	let diff = encode(&solid(32, 16, [200, 100, 50, 255]), CgType::Qnt);
	// chunk 0 keeps the base, chunk 1 comes from the difference
	let wrapper = dcf(32, 16, "base.qnt", &[1, 0], &diff);

	let volume = single_volume(&[(b"BASE.QNT", &base), (b"DIFF.DCF", &wrapper)]);
	let dir = tempfile::tempdir().unwrap();
	let paths = write_volumes(dir.path(), &[volume]);
	let archive = AldArchive::open(&[Some(&paths[0])], false).unwrap();

	let cg = cg::load(&archive, 1).unwrap();
	assert_eq!(cg.kind(), CgType::Dcf);
	assert_eq!(cg.pixel(0, 0), Some([10, 20, 30, 255]));
	assert_eq!(cg.pixel(15, 15), Some([10, 20, 30, 255]));
	assert_eq!(cg.pixel(16, 0), Some([200, 100, 50, 255]));
	assert_eq!(cg.pixel(31, 15), Some([200, 100, 50, 255]));

	let metrics = cg::get_metrics_no(&archive, 1).unwrap();
	assert_eq!((metrics.width, metrics.height), (32, 16));

	// without the archive only the difference is decoded
	let alone = cg::load_buffer(&wrapper).unwrap();
	assert_eq!(alone.kind(), CgType::Dcf);
	assert_eq!(alone.pixel(0, 0), Some([200, 100, 50, 255]));
}

#[test]
fn test_dcf_with_missing_base_decodes_difference() {
	let diff = encode(&solid(4, 4, [1, 1, 1, 255]), CgType::Qnt);
	let wrapper = dcf(4, 4, "nowhere", &[], &diff);
	let volume = single_volume(&[(b"DIFF.DCF", &wrapper)]);
	let dir = tempfile::tempdir().unwrap();
	let paths = write_volumes(dir.path(), &[volume]);
	let archive = AldArchive::open(&[Some(&paths[0])], false).unwrap();

	let cg = cg::load(&archive, 0).unwrap();
	assert_eq!(cg.kind(), CgType::Dcf);
	assert_eq!(cg.pixel(3, 3), Some([1, 1, 1, 255]));
}

#[test]
fn test_webp_overlay_shows_base_through_magenta() {
	let base = encode(
		&Cg::from_rgba(CgType::Unknown, Metrics::rgba(2, 1), vec![1, 2, 3, 255, 4, 5, 6, 255]).unwrap(),
		CgType::Qnt,
	);
	let overlay = Cg::from_rgba(CgType::Unknown, Metrics::rgba(2, 1), vec![255, 0, 255, 255, 9, 9, 9, 255])
		.unwrap();
	let overlay = webp_overlay(&overlay, 1);

	let volume = single_volume(&[(b"BASE.QNT", &base), (b"OVER.WEBP", &overlay)]);
	let dir = tempfile::tempdir().unwrap();
	let paths = write_volumes(dir.path(), &[volume]);
	let archive = AldArchive::open(&[Some(&paths[0])], true).unwrap();

	let cg = cg::load(&archive, 1).unwrap();
	assert_eq!(cg.kind(), CgType::Webp);
	assert_eq!(cg.pixel(0, 0), Some([1, 2, 3, 255]));
	assert_eq!(cg.pixel(1, 0), Some([9, 9, 9, 255]));

	// decoded on its own, magenta stays
	let alone = cg::load_buffer(&overlay).unwrap();
	assert_eq!(alone.pixel(0, 0), Some([255, 0, 255, 255]));
}

#[test]
fn test_self_referencing_webp_is_bounded() {
	let overlay = webp_overlay(&solid(1, 1, [255, 0, 255, 255]), 1);
	let volume = single_volume(&[(b"LOOP.WEBP", &overlay)]);
	let dir = tempfile::tempdir().unwrap();
	let paths = write_volumes(dir.path(), &[volume]);
	let archive = AldArchive::open(&[Some(&paths[0])], false).unwrap();

	assert!(matches!(cg::load(&archive, 0), Err(CgError::RecursionLimit(_))));
}

#[test]
fn test_png_round_trip_through_file() {
	let image = solid(3, 2, [40, 50, 60, 128]);
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("out.png");
	std::fs::write(&path, encode(&image, CgType::Png)).unwrap();

	let cg = cg::load_file(&path).unwrap();
	assert_eq!(cg.kind(), CgType::Png);
	assert_eq!(cg.pixels(), image.pixels());
	assert_eq!(cg.pixels().len(), 3 * 2 * 4);
	assert!(cg.metrics().has_pixel);
}
