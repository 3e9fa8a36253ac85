//! Little-endian cursor over a byte slice.
//!
//! Every read is bounds-checked and fails with [`ShortRead`] instead of
//! panicking, so decoders can turn truncated input into a format error.

use std::fmt;

/// A read that ran past the end of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortRead {
	/// Bytes the read needed, counted from the start of the buffer
	pub expected: usize,

	/// Length of the buffer
	pub actual: usize,
}

impl fmt::Display for ShortRead {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "read needs {} bytes, buffer has {}", self.expected, self.actual)
	}
}

impl std::error::Error for ShortRead {}

/// Cursor reader with little-endian integer accessors
#[derive(Debug, Clone)]
pub struct Reader<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> Reader<'a> {
	/// Starts reading at the beginning of `data`
	pub fn new(data: &'a [u8]) -> Self {
		Self {
			data,
			pos: 0,
		}
	}

	/// Current cursor position
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Moves the cursor to an absolute position
	pub fn seek(&mut self, pos: usize) -> Result<(), ShortRead> {
		if pos > self.data.len() {
			return Err(ShortRead {
				expected: pos,
				actual: self.data.len(),
			});
		}
		self.pos = pos;
		Ok(())
	}

	/// Advances the cursor by `n` bytes
	pub fn skip(&mut self, n: usize) -> Result<(), ShortRead> {
		self.bytes(n).map(|_| ())
	}

	/// Bytes from the cursor to the end of the buffer
	pub fn remaining(&self) -> &'a [u8] {
		&self.data[self.pos..]
	}

	/// Returns `true` if the next bytes equal `magic`, without advancing
	pub fn peek_is(&self, magic: &[u8]) -> bool {
		self.remaining().starts_with(magic)
	}

	/// Reads `n` raw bytes
	pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], ShortRead> {
		let end = self.pos.checked_add(n).filter(|&end| end <= self.data.len()).ok_or(ShortRead {
			expected: self.pos.saturating_add(n),
			actual: self.data.len(),
		})?;
		let out = &self.data[self.pos..end];
		self.pos = end;
		Ok(out)
	}

	/// Reads a fixed-size array
	pub fn array<const N: usize>(&mut self) -> Result<[u8; N], ShortRead> {
		let mut out = [0u8; N];
		out.copy_from_slice(self.bytes(N)?);
		Ok(out)
	}

	/// Reads one byte
	pub fn u8(&mut self) -> Result<u8, ShortRead> {
		Ok(self.array::<1>()?[0])
	}

	/// Reads a little-endian `u16`
	pub fn u16(&mut self) -> Result<u16, ShortRead> {
		self.array().map(u16::from_le_bytes)
	}

	/// Reads a little-endian `u32`
	pub fn u32(&mut self) -> Result<u32, ShortRead> {
		self.array().map(u32::from_le_bytes)
	}

	/// Reads a little-endian `i32`
	pub fn i32(&mut self) -> Result<i32, ShortRead> {
		self.array().map(i32::from_le_bytes)
	}
}

/// Reads a little-endian `u32` at an absolute offset
pub fn le32_at(data: &[u8], offset: usize) -> Result<u32, ShortRead> {
	let mut reader = Reader::new(data);
	reader.seek(offset)?;
	reader.u32()
}
