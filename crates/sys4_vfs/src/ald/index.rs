//! Index structures of the multi-disk container.
//!
//! Every volume starts with a pointer map (`ptr_blocks` blocks) followed by a
//! file map (`map_blocks` blocks). All sizes and offsets are expressed in
//! 256-byte blocks and stored as 3-byte little-endian integers.

/// Size of one index block in bytes
pub const BLOCK_SIZE: u64 = 0x100;

/// Reads a 3-byte little-endian integer at `offset`. The caller guarantees
/// `offset + 3 <= buf.len()`.
fn get3b(buf: &[u8], offset: usize) -> u32 {
	u32::from(buf[offset]) | u32::from(buf[offset + 1]) << 8 | u32::from(buf[offset + 2]) << 16
}

/// Volume header: `[3B ptr_blocks][3B total_blocks]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
	/// Size of the pointer map in blocks
	pub ptr_blocks: u32,

	/// Size of the file map in blocks
	pub map_blocks: u32,
}

impl Header {
	/// Size of the encoded header in bytes
	pub const SIZE: usize = 6;

	/// Decodes and validates a header against the size of its volume
	pub fn parse(raw: &[u8; Self::SIZE], file_len: u64) -> Result<Self, String> {
		let ptr_blocks = i64::from(get3b(raw, 0));
		let map_blocks = i64::from(get3b(raw, 3)) - ptr_blocks;
		let file_blocks = file_len.div_ceil(BLOCK_SIZE) as i64;

		if ptr_blocks > file_blocks {
			return Err(format!(
				"pointer map spans {} blocks, volume has {}",
				ptr_blocks, file_blocks
			));
		}
		if !(0..=file_blocks).contains(&map_blocks) {
			return Err(format!("file map spans {} blocks, volume has {}", map_blocks, file_blocks));
		}

		Ok(Self {
			ptr_blocks: ptr_blocks as u32,
			map_blocks: map_blocks as u32,
		})
	}

	/// Byte length of the pointer map
	pub fn ptr_len(&self) -> u64 {
		u64::from(self.ptr_blocks) * BLOCK_SIZE
	}

	/// Byte offset of the file map
	pub fn map_offset(&self) -> u64 {
		self.ptr_len()
	}

	/// Byte length of the file map
	pub fn map_len(&self) -> u64 {
		u64::from(self.map_blocks) * BLOCK_SIZE
	}
}

/// Where a logical file lives: 0-based volume index and slot within it
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapEntry {
	/// Volume index, `None` if the file is absent
	pub disk: Option<usize>,

	/// Slot in the volume's pointer map, `None` if the file is absent
	pub slot: Option<usize>,
}

/// Logical file number to `(disk, slot)` translation table
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileMap {
	entries: Vec<MapEntry>,
}

impl FileMap {
	/// Decodes the file map from its raw blocks.
	///
	/// Records are `[1B disk][2B slot]`, both 1-based with `0` meaning absent.
	pub fn parse(buf: &[u8]) -> Self {
		let entries = buf
			.chunks_exact(3)
			.map(|rec| MapEntry {
				disk: usize::from(rec[0]).checked_sub(1),
				slot: usize::from(u16::from_le_bytes([rec[1], rec[2]])).checked_sub(1),
			})
			.collect();
		Self {
			entries,
		}
	}

	/// Number of logical file numbers covered by the map
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if the map covers no files
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Looks up a logical file number
	pub fn get(&self, no: usize) -> Option<MapEntry> {
		self.entries.get(no).copied()
	}
}

/// Per-volume slot to byte offset table
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PointerMap {
	offsets: Vec<u64>,
}

impl PointerMap {
	/// Decodes the pointer map from its raw blocks.
	///
	/// Slot `i` is the block offset stored at byte `3 + 3 * i`. A slot whose
	/// record would run past the buffer decodes as unused.
	pub fn parse(buf: &[u8]) -> Self {
		let count = buf.len() / 3;
		let offsets = (0..count)
			.map(|i| {
				let at = i * 3 + 3;
				if at + 3 <= buf.len() {
					u64::from(get3b(buf, at)) * BLOCK_SIZE
				} else {
					0
				}
			})
			.collect();
		Self {
			offsets,
		}
	}

	/// Number of slots
	pub fn len(&self) -> usize {
		self.offsets.len()
	}

	/// Returns `true` if the map has no slots
	pub fn is_empty(&self) -> bool {
		self.offsets.is_empty()
	}

	/// Returns the `(start, end)` byte range of `slot`, or `None` for unused,
	/// deleted or empty slots
	pub fn span(&self, slot: usize) -> Option<(u64, u64)> {
		let start = *self.offsets.get(slot)?;
		let end = *self.offsets.get(slot.checked_add(1)?)?;
		if start == 0 || end == 0 || start == end {
			return None;
		}
		Some((start, end))
	}
}
