//! FNL font library tests

use std::io::Write;

use flate2::{Compression, write::ZlibEncoder};
use sys4_rs::prelude::*;

fn zlib(data: &[u8]) -> Vec<u8> {
	let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
	z.write_all(data).unwrap();
	z.finish().unwrap()
}

/// Index of 'あ' (Shift-JIS 0x82a0)
const HIRAGANA_A: usize = 441;

/// One font with an 8px face (slot 0 and 'A' present) and a 16px face
/// ('あ' present)
fn library() -> (Vec<u8>, Vec<u8>, Vec<u8>) {
	let small: Vec<u8> = (0..8).map(|i| i * 30).collect();
	let large: Vec<u8> = (0..32).collect();
	let (small_z, large_z) = (zlib(&small), zlib(&large));

	let faces = [(8u32, 40usize), (16, HIRAGANA_A + 1)];
	let tables: usize = faces.iter().map(|&(_, n)| 12 + n * 10).sum();
	let data_start = (20 + 4 + tables) as u32;
	let small_at = data_start;
	let large_at = data_start + small_z.len() as u32;

	let mut out = b"FNA\0".to_vec();
	for v in [0, 0, data_start, 1, faces.len() as u32] {
		out.extend_from_slice(&v.to_le_bytes());
	}
	for &(height, count) in &faces {
		for v in [height, 0, count as u32] {
			out.extend_from_slice(&v.to_le_bytes());
		}
		for i in 0..count {
			let (width, offset, size) = match (height, i) {
				(8, 0 | 33) => (5u16, small_at, small_z.len() as u32),
				(16, HIRAGANA_A) => (16, large_at, large_z.len() as u32),
				_ => (0, 0, 0),
			};
			out.extend_from_slice(&width.to_le_bytes());
			out.extend_from_slice(&offset.to_le_bytes());
			out.extend_from_slice(&size.to_le_bytes());
		}
	}
	out.extend_from_slice(&small_z);
	out.extend_from_slice(&large_z);
	let len = out.len() as u32;
	out[8..12].copy_from_slice(&len.to_le_bytes());
	(out, small, large)
}

#[test]
fn test_open_and_render() {
	let (data, small, large) = library();
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("fonts.fnl");
	std::fs::write(&path, &data).unwrap();

	let fnl = FnlFile::open(&path).unwrap();
	assert_eq!(fnl.file_size() as usize, data.len());
	assert_eq!(fnl.fonts().len(), 1);
	let font = &fnl.fonts()[0];
	assert_eq!(font.faces().len(), 2);
	assert!(font.face_by_height(12).is_none());

	let face = font.face_by_height(8).unwrap();
	let glyph = face.glyph(u16::from(b'A')).unwrap();
	assert_eq!(glyph.real_width(), 5);
	assert_eq!(glyph.height(), 8);
	assert_eq!(fnl.glyph_data(glyph).unwrap(), small);

	let face = font.face_by_height(16).unwrap();
	let code = sjis_code(&encoding_rs::SHIFT_JIS.encode("あ").0).unwrap();
	assert_eq!(code, 0x82a0);
	assert_eq!(char_to_index(code) as usize, HIRAGANA_A);
	let glyph = face.glyph(code).unwrap();
	assert_eq!(fnl.glyph_data(glyph).unwrap(), large);
}

#[test]
fn test_missing_glyphs_fall_back_to_slot_zero() {
	let (data, small, _) = library();
	let fnl = FnlFile::try_from(data).unwrap();
	let face = fnl.fonts()[0].face_by_height(8).unwrap();

	// no slot, past the end of the face, and a slot without data
	for code in [0x7f, 0x82a0, u16::from(b'B')] {
		let glyph = face.glyph(code).unwrap();
		assert_eq!(glyph, &face.glyphs()[0], "code {:#x}", code);
		assert_eq!(fnl.glyph_data(glyph).unwrap(), small);
	}
}

#[test]
fn test_index_round_trip() {
	for index in 0..9500 {
		assert_eq!(char_to_index(index_to_char(index)), index);
	}
}
