//! Fonts, faces and glyph records of an FNL container.

use log::warn;

use super::index::char_to_index;
use crate::file::{error::FnlError, reader::Reader};

/// Size of a glyph record in bytes
pub const GLYPH_RECORD_SIZE: usize = 10;

/// Size of a face header in bytes
pub const FACE_HEADER_SIZE: usize = 12;

/// A glyph record. The bitmap itself stays compressed in the container until
/// [`super::File::glyph_data`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Glyph {
	/// Pixel height, taken from the face
	height: u32,

	/// Advance width in pixels
	real_width: u16,

	/// Offset of the compressed bitmap, 0 if the glyph is absent
	data_offset: u32,

	/// Size of the compressed bitmap
	compressed_size: u32,
}

impl Glyph {
	/// Creates a glyph record.
	pub fn new(height: u32, real_width: u16, data_offset: u32, compressed_size: u32) -> Self {
		Self {
			height,
			real_width,
			data_offset,
			compressed_size,
		}
	}

	fn parse(r: &mut Reader<'_>, height: u32) -> Result<Self, FnlError> {
		Ok(Self {
			height,
			real_width: r.u16()?,
			data_offset: r.u32()?,
			compressed_size: r.u32()?,
		})
	}

	/// Returns the pixel height of the glyph.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Returns the advance width of the glyph.
	pub fn real_width(&self) -> u16 {
		self.real_width
	}

	/// Returns the offset of the compressed bitmap.
	pub fn data_offset(&self) -> u32 {
		self.data_offset
	}

	/// Returns the size of the compressed bitmap.
	pub fn compressed_size(&self) -> u32 {
		self.compressed_size
	}

	/// Whether the glyph has bitmap data.
	pub fn is_present(&self) -> bool {
		self.data_offset != 0
	}

	/// Upper bound on the inflated bitmap size.
	pub fn capacity(&self) -> usize {
		let h = self.height as usize;
		h * h * 4
	}
}

/// One size of a font
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Face {
	height: u32,
	reserved: u32,
	glyphs: Vec<Glyph>,
}

impl Face {
	pub(super) fn parse(r: &mut Reader<'_>) -> Result<Self, FnlError> {
		let height = r.u32()?;
		let reserved = r.u32()?;
		if reserved != 0 {
			warn!("Unexpected value for FNL face reserved field: {}", reserved);
		}
		let count = r.u32()? as usize;

		let mut glyphs = Vec::with_capacity(count.min(r.remaining().len() / GLYPH_RECORD_SIZE));
		for _ in 0..count {
			glyphs.push(Glyph::parse(r, height)?);
		}

		Ok(Self {
			height,
			reserved,
			glyphs,
		})
	}

	/// Returns the pixel height of the face.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Returns the unidentified field following the height.
	pub fn reserved(&self) -> u32 {
		self.reserved
	}

	/// Returns all glyph records in index order.
	pub fn glyphs(&self) -> &[Glyph] {
		&self.glyphs
	}

	/// Looks up the glyph for a character code.
	///
	/// Codes without a slot, slots past the end of the face and slots with
	/// no data all resolve to glyph 0. Returns `None` only for an empty face.
	pub fn glyph(&self, code: u16) -> Option<&Glyph> {
		let index = char_to_index(code) as usize;
		match self.glyphs.get(index) {
			Some(glyph) if glyph.is_present() => Some(glyph),
			_ => self.glyphs.first(),
		}
	}
}

/// A font: a set of faces of different heights
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
	faces: Vec<Face>,
}

impl Font {
	pub(super) fn parse(r: &mut Reader<'_>) -> Result<Self, FnlError> {
		let count = r.u32()? as usize;
		let mut faces = Vec::with_capacity(count.min(r.remaining().len() / FACE_HEADER_SIZE));
		for _ in 0..count {
			faces.push(Face::parse(r)?);
		}
		Ok(Self {
			faces,
		})
	}

	/// Returns the faces of the font.
	pub fn faces(&self) -> &[Face] {
		&self.faces
	}

	/// Returns the face with exactly this height.
	pub fn face_by_height(&self, height: u32) -> Option<&Face> {
		self.faces.iter().find(|face| face.height == height)
	}
}
