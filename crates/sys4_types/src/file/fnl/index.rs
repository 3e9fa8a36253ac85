//! Character code to glyph index mapping.
//!
//! Glyphs are stored in the sequential order of the code points Shift-JIS
//! can encode, starting from the ASCII space. Slot 0 doubles as the
//! fallback glyph for anything unencodable.

/// Number of single-byte slots (`0x20..0x7f` then `0xa1..0xe0`)
pub const SINGLE_BYTE_GLYPHS: u32 = 158;

/// Code points per lead byte: `0x40..=0xfc` without `0x7f`
pub const TRAIL_BYTES: u32 = 188;

/// Lead bytes `0x81..0xa0`
const LOW_LEAD_BYTES: u32 = 31;

/// One past the highest index with a valid code (lead byte `0xfc`, trail `0xfc`)
pub const INDEX_LIMIT: u32 = SINGLE_BYTE_GLYPHS + (LOW_LEAD_BYTES + 29) * TRAIL_BYTES;

/// Maps a character code to its glyph index, or 0 for codes with no slot
pub fn char_to_index(code: u16) -> u32 {
	let code32 = u32::from(code);
	match code {
		0..0x20 => return 0,
		0x20..0x7f => return code32 - 0x20,
		0x7f..0xa1 => return 0,
		0xa1..0xe0 => return code32 - 0x42,
		_ => {}
	}

	let [lead, trail] = code.to_be_bytes();
	if trail < 0x40 || trail == 0x7f || trail > 0xfc {
		return 0;
	}
	let trail_index = u32::from(trail) - 0x40 - u32::from(trail > 0x7f);
	let lead_index = match lead {
		0x81..0xa0 => u32::from(lead) - 0x81,
		0xe0..0xfd => u32::from(lead) - 0xe0 + LOW_LEAD_BYTES,
		_ => return 0,
	};
	SINGLE_BYTE_GLYPHS + lead_index * TRAIL_BYTES + trail_index
}

/// Maps a glyph index back to its character code
///
/// Indices at or past [`INDEX_LIMIT`] have no Shift-JIS code; the result for
/// them is unspecified.
pub fn index_to_char(index: u32) -> u16 {
	if index < 95 {
		return (index + 0x20) as u16;
	}
	if index < SINGLE_BYTE_GLYPHS {
		return (index - 95 + 0xa1) as u16;
	}

	let index = index - SINGLE_BYTE_GLYPHS;
	let lead_index = index / TRAIL_BYTES;
	let lead = if lead_index < LOW_LEAD_BYTES {
		0x81 + lead_index
	} else {
		0xe0 + (lead_index - LOW_LEAD_BYTES)
	};
	let mut trail = 0x40 + index % TRAIL_BYTES;
	if trail >= 0x7f {
		trail += 1;
	}
	((lead << 8) | trail) as u16
}

/// Returns the code of the first Shift-JIS character in `bytes`, if any
pub fn sjis_code(bytes: &[u8]) -> Option<u16> {
	let (&first, rest) = bytes.split_first()?;
	match first {
		0x81..=0x9f | 0xe0..=0xfc => rest.first().map(|&second| u16::from_be_bytes([first, second])),
		_ => Some(u16::from(first)),
	}
}
