//! Benchmark helper utilities for sys4-rs
//!
//! Generates synthetic CG and FNL data, so the benchmarks run without game
//! files. Images are produced through the library's own encoders.

use std::io::Write;

use flate2::{Compression, write::ZlibEncoder};
use sys4_types::file::{Cg, CgType, Metrics, cg};

/// Gradient with a diagonal alpha ramp, which keeps the QNT filter busy
pub fn generate_test_image(width: u32, height: u32) -> Cg {
	let mut pixels = Vec::with_capacity((width * height * 4) as usize);
	for y in 0..height {
		for x in 0..width {
			pixels.extend_from_slice(&[
				(x * 255 / width.max(1)) as u8,
				(y * 255 / height.max(1)) as u8,
				((x ^ y) & 0xff) as u8,
				((x + y) & 0xff) as u8,
			]);
		}
	}
	// dimensions are positive and the buffer matches them
	match Cg::from_rgba(CgType::Unknown, Metrics::rgba(width, height), pixels) {
		Ok(cg) => cg,
		Err(e) => panic!("invalid benchmark image {}x{}: {}", width, height, e),
	}
}

/// Encodes a synthetic image as `kind` (QNT, PNG or WEBP)
pub fn generate_test_cg_data(width: u32, height: u32, kind: CgType) -> Vec<u8> {
	let mut out = Vec::new();
	if let Err(e) = cg::write(&generate_test_image(width, height), kind, &mut out) {
		panic!("failed to encode benchmark image as {}: {}", kind, e);
	}
	out
}

fn zlib(data: &[u8]) -> Vec<u8> {
	let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
	// writes into a Vec cannot fail
	let _ = z.write_all(data);
	z.finish().unwrap_or_default()
}

/// Builds an FNL file with one font and one face of `height` pixels.
///
/// Every one of the `glyphs` slots points at the same compressed bitmap.
pub fn generate_test_fnl_data(height: u32, glyphs: u32) -> Vec<u8> {
	let bitmap: Vec<u8> = (0..height * height).map(|i| (i * 7) as u8).collect();
	let compressed = zlib(&bitmap);
	let data_offset = 20 + 4 + 12 + glyphs * 10;

	let mut data = b"FNA\0".to_vec();
	for v in [0, 0, data_offset, 1, 1, height, 0, glyphs] {
		data.extend_from_slice(&v.to_le_bytes());
	}
	for _ in 0..glyphs {
		data.extend_from_slice(&(height as u16).to_le_bytes());
		data.extend_from_slice(&data_offset.to_le_bytes());
		data.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
	}
	data.extend_from_slice(&compressed);

	let file_size = data.len() as u32;
	data[8..12].copy_from_slice(&file_size.to_le_bytes());
	data
}

/// Common benchmark sizes for synthetic test data
pub mod sizes {
	/// Tiny image: 64x64 (4,096 pixels)
	pub const TINY: (u32, u32) = (64, 64);
	/// Small image: 256x256 (65,536 pixels)
	pub const SMALL: (u32, u32) = (256, 256);
	/// Typical game screen: 800x600 (480,000 pixels)
	pub const SCREEN: (u32, u32) = (800, 600);
	/// HD resolution: 1280x720 (921,600 pixels)
	pub const HD: (u32, u32) = (1280, 720);
}

#[cfg(test)]
mod tests {
	use super::*;
	use sys4_types::file::FnlFile;

	#[test]
	fn test_generate_qnt() {
		let data = generate_test_cg_data(33, 17, CgType::Qnt);
		assert_eq!(cg::check_format(&data), CgType::Qnt);
		let decoded = cg::load_buffer(&data).unwrap();
		assert_eq!((decoded.width(), decoded.height()), (33, 17));
	}

	#[test]
	fn test_generate_fnl() {
		let fnl = FnlFile::from_bytes(generate_test_fnl_data(16, 200)).unwrap();
		let face = &fnl.fonts()[0].faces()[0];
		assert_eq!(face.glyphs().len(), 200);
		let glyph = face.glyph(u16::from(b'z')).unwrap();
		assert_eq!(fnl.glyph_data(glyph).unwrap().len(), 256);
	}
}
