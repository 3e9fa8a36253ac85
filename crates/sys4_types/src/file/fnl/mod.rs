//! FNL font container support.
//!
//! An FNL file holds one or more fonts, each with faces of several pixel
//! heights. Glyph bitmaps are individually zlib-compressed and inflated on
//! demand with [`File::glyph_data`].

use std::path::Path;

use flate2::{Decompress, FlushDecompress, Status};
use log::{debug, warn};

use crate::file::{error::FnlError, reader::Reader};

pub mod glyph;
pub mod index;

pub use glyph::{Face, Font, Glyph};
pub use index::{char_to_index, index_to_char, sjis_code};

/// FNL file constants.
pub mod constants {
	/// File signature
	pub const MAGIC: [u8; 4] = *b"FNA\0";

	/// Size of the file header in bytes
	pub const HEADER_SIZE: usize = 20;
}

/// A parsed FNL container. The raw file is kept for lazy glyph inflation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct File {
	data: Vec<u8>,
	reserved: u32,
	file_size: u32,
	data_offset: u32,
	fonts: Vec<Font>,
}

impl File {
	/// Opens an FNL file from the specified path.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read or is not a valid FNL
	/// container.
	pub fn open(path: impl AsRef<Path>) -> Result<Self, FnlError> {
		Self::from_bytes(std::fs::read(path)?)
	}

	/// Parses an FNL container, taking ownership of its bytes.
	///
	/// # Errors
	///
	/// Returns [`FnlError::InvalidMagic`] for a missing signature and
	/// [`FnlError::InsufficientData`] when the tables run past the end.
	pub fn from_bytes(data: Vec<u8>) -> Result<Self, FnlError> {
		let mut r = Reader::new(&data);
		let magic = r.array::<4>()?;
		if magic != constants::MAGIC {
			return Err(FnlError::InvalidMagic(magic));
		}

		let reserved = r.u32()?;
		if reserved != 0 {
			warn!("Unexpected value for FNL reserved field: {}", reserved);
		}
		let file_size = r.u32()?;
		let data_offset = r.u32()?;
		let count = r.u32()? as usize;

		let mut fonts = Vec::with_capacity(count.min(r.remaining().len() / 4));
		for _ in 0..count {
			fonts.push(Font::parse(&mut r)?);
		}
		debug!("FNL: {} fonts, {} bytes", fonts.len(), data.len());
		if file_size as usize != data.len() {
			debug!("FNL header size {} differs from actual size {}", file_size, data.len());
		}

		Ok(Self {
			data,
			reserved,
			file_size,
			data_offset,
			fonts,
		})
	}

	/// Returns the unidentified field following the signature.
	pub fn reserved(&self) -> u32 {
		self.reserved
	}

	/// Returns the file size recorded in the header.
	pub fn file_size(&self) -> u32 {
		self.file_size
	}

	/// Returns the data offset recorded in the header.
	pub fn data_offset(&self) -> u32 {
		self.data_offset
	}

	/// Returns the fonts in the container.
	pub fn fonts(&self) -> &[Font] {
		&self.fonts
	}

	/// Returns the raw container bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.data
	}

	/// Inflates a glyph bitmap.
	///
	/// A glyph with no data yields an empty buffer. The output is bounded by
	/// [`Glyph::capacity`]; a stream that is corrupt or does not fit is an
	/// error.
	pub fn glyph_data(&self, glyph: &Glyph) -> Result<Vec<u8>, FnlError> {
		if !glyph.is_present() {
			return Ok(Vec::new());
		}

		let start = glyph.data_offset() as usize;
		let input = start
			.checked_add(glyph.compressed_size() as usize)
			.and_then(|end| self.data.get(start..end))
			.ok_or(FnlError::GlyphOverflow {
				offset: glyph.data_offset(),
				size: glyph.compressed_size(),
				available: self.data.len(),
			})?;

		let mut out = Vec::with_capacity(glyph.capacity());
		let status = Decompress::new(true)
			.decompress_vec(input, &mut out, FlushDecompress::Finish)
			.map_err(|e| FnlError::Inflate {
				status: e.to_string(),
			})?;
		if status != Status::StreamEnd {
			return Err(FnlError::Inflate {
				status: format!("{:?}", status),
			});
		}
		Ok(out)
	}
}

impl TryFrom<Vec<u8>> for File {
	type Error = FnlError;

	fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
		Self::from_bytes(value)
	}
}

impl TryFrom<&[u8]> for File {
	type Error = FnlError;

	fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
		Self::from_bytes(value.to_vec())
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use flate2::{Compression, write::ZlibEncoder};

	use super::*;

	fn zlib(data: &[u8]) -> Vec<u8> {
		let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
		z.write_all(data).unwrap();
		z.finish().unwrap()
	}

	/// One font, one face of height 2, glyph 0 and 'A' present
	fn sample(bitmap: &[u8]) -> Vec<u8> {
		let compressed = zlib(bitmap);
		let glyph_count = 34u32;
		let table_end = (constants::HEADER_SIZE + 4 + 12 + glyph_count as usize * 10) as u32;

		let mut out = constants::MAGIC.to_vec();
		for v in [0, 0, table_end, 1, 1, 2, 0, glyph_count] {
			out.extend_from_slice(&v.to_le_bytes());
		}
		for i in 0..glyph_count {
			let (offset, size) = if i == 0 || i == 33 {
				(table_end, compressed.len() as u32)
			} else {
				(0, 0)
			};
			out.extend_from_slice(&2u16.to_le_bytes());
			out.extend_from_slice(&offset.to_le_bytes());
			out.extend_from_slice(&size.to_le_bytes());
		}
		out.extend_from_slice(&compressed);
		let len = out.len() as u32;
		out[8..12].copy_from_slice(&len.to_le_bytes());
		out
	}

	#[test]
	fn test_parse_and_inflate() {
		let fnl = File::from_bytes(sample(&[0, 255, 255, 0])).unwrap();
		assert_eq!(fnl.file_size() as usize, fnl.as_bytes().len());
		assert_eq!(fnl.fonts().len(), 1);
		let face = &fnl.fonts()[0].faces()[0];
		assert_eq!(face.height(), 2);
		assert_eq!(face.glyphs().len(), 34);

		let glyph = face.glyph(u16::from(b'A')).unwrap();
		assert_eq!(fnl.glyph_data(glyph).unwrap(), vec![0, 255, 255, 0]);
		let glyph = face.glyph(u16::from(b'B')).unwrap();
		assert_eq!(glyph, &face.glyphs()[0]);
	}

	#[test]
	fn test_absent_glyph_is_empty() {
		let fnl = File::from_bytes(sample(&[1])).unwrap();
		let glyph = Glyph::new(2, 0, 0, 0);
		assert!(fnl.glyph_data(&glyph).unwrap().is_empty());
	}

	#[test]
	fn test_bad_magic() {
		let mut data = sample(&[1]);
		data[0] = b'X';
		assert!(matches!(File::from_bytes(data), Err(FnlError::InvalidMagic(_))));
		assert!(matches!(File::try_from(&b"FN"[..]), Err(FnlError::InsufficientData { .. })));
	}

	#[test]
	fn test_truncated_tables() {
		let data = sample(&[1]);
		assert!(matches!(File::from_bytes(data[..60].to_vec()), Err(FnlError::InsufficientData { .. })));
	}

	#[test]
	fn test_glyph_overflow_and_corruption() {
		let fnl = File::from_bytes(sample(&[1, 2, 3, 4])).unwrap();
		let glyph = Glyph::new(2, 0, 10, u32::MAX);
		assert!(matches!(fnl.glyph_data(&glyph), Err(FnlError::GlyphOverflow { .. })));

		// points at the glyph table instead of a zlib stream
		let glyph = Glyph::new(2, 0, 40, 20);
		assert!(matches!(fnl.glyph_data(&glyph), Err(FnlError::Inflate { .. })));
	}

	#[test]
	fn test_bitmap_larger_than_bound() {
		// height 2 allows at most 16 bytes
		let fnl = File::from_bytes(sample(&[7; 64])).unwrap();
		let glyph = fnl.fonts()[0].faces()[0].glyphs()[0];
		assert!(matches!(fnl.glyph_data(&glyph), Err(FnlError::Inflate { .. })));
	}

	#[test_log::test]
	fn test_reserved_warns_but_parses() {
		let mut data = sample(&[1]);
		data[4] = 1;
		let fnl = File::from_bytes(data).unwrap();
		assert_eq!(fnl.reserved(), 1);
	}
}
