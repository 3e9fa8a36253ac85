//! DCF: a difference image applied over a named base CG.
//!
//! The file holds three sections: `dcf ` (size and the scrambled base name),
//! `dfdl` (a zlib-compressed map of 16x16 chunks) and `dcgd` (the embedded
//! difference image, normally QNT). Chunks whose map byte is zero are taken
//! from the difference image, the rest from the base.

use log::warn;

use super::{Cg, CgType, Loader, Metrics, inflate, qnt};
use crate::file::{
	CgError,
	reader::{Reader, le32_at},
};

const KIND: CgType = CgType::Dcf;
const CHUNK: usize = 16;

const MAX_HEADER_SIZE: i32 = 4096;
const MAX_NAME_LEN: i32 = 2000;
const MAX_DFDL_SIZE: i32 = 10000;
const MAX_CHUNK_MAP: u32 = 40000;

pub(super) fn check(data: &[u8]) -> bool {
	data.starts_with(b"dcf ")
}

fn expect_magic(r: &mut Reader<'_>, magic: &[u8; 4]) -> Result<(), CgError> {
	let actual = r.array::<4>()?;
	if &actual != magic {
		warn!("Expected DCF {} section", String::from_utf8_lossy(magic).trim_end());
		return Err(CgError::InvalidMagic {
			expected: *magic,
			actual,
		});
	}
	Ok(())
}

/// Reads a section size, bounded by `max`
fn section_size(r: &mut Reader<'_>, max: i32, what: &str) -> Result<usize, CgError> {
	let size = r.i32()?;
	if !(0..=max).contains(&size) {
		warn!("Invalid DCF {} size: {}", what, size);
		return Err(CgError::malformed(KIND, format!("invalid {} size {}", what, size)));
	}
	Ok(size as usize)
}

/// Undoes the per-byte rotation applied to the base name
fn unscramble_name(raw: &[u8]) -> Vec<u8> {
	let rot = (raw.len() % 7) as u32 + 1;
	raw.iter().map(|b| b.rotate_left(rot)).collect()
}

#[derive(Debug)]
struct Dcf<'d> {
	width: u32,
	height: u32,
	base_name: Vec<u8>,
	chunk_map: Vec<u8>,
	diff: &'d [u8],
}

impl<'d> Dcf<'d> {
	fn parse(data: &'d [u8]) -> Result<Self, CgError> {
		let mut r = Reader::new(data);

		expect_magic(&mut r, b"dcf ")?;
		let header_size = section_size(&mut r, MAX_HEADER_SIZE, "header")?;
		let next = r.pos() + header_size;
		let version = r.i32()?;
		if version != 1 {
			warn!("Unsupported DCF version: {}", version);
			return Err(CgError::unsupported(KIND, format!("version {}", version)));
		}
		let width = r.u32()?;
		let height = r.u32()?;
		let bpp = r.i32()?;
		if bpp != 32 {
			warn!("Unsupported DCF bpp: {}", bpp);
			return Err(CgError::unsupported(KIND, format!("{} bits per pixel", bpp)));
		}
		let name_len = section_size(&mut r, MAX_NAME_LEN, "base name")?;
		let base_name = unscramble_name(r.bytes(name_len)?);
		if r.pos() != next {
			warn!("Extra data at end of DCF header");
			r.seek(next)?;
		}

		expect_magic(&mut r, b"dfdl")?;
		let dfdl_size = section_size(&mut r, MAX_DFDL_SIZE, "dfdl")?;
		let next = r.pos() + dfdl_size;
		let map_size = r.u32()?;
		if map_size > MAX_CHUNK_MAP {
			warn!("Invalid DCF chunk map size: {}", map_size);
			return Err(CgError::malformed(KIND, format!("chunk map size {}", map_size)));
		}
		let compressed = r.bytes(dfdl_size.saturating_sub(4))?;
		let map = inflate(KIND, compressed, map_size as usize)?;
		if map.len() < 4 || le32_at(&map, 0)? as usize != map.len() - 4 {
			warn!("Invalid size in DCF chunk map");
			return Err(CgError::malformed(KIND, "chunk map size mismatch"));
		}
		r.seek(next)?;

		expect_magic(&mut r, b"dcgd")?;
		let dcgd_size = r.i32()?;
		if dcgd_size < 0 || dcgd_size as usize > r.remaining().len() {
			warn!("Invalid DCF dcgd size: {}", dcgd_size);
			return Err(CgError::malformed(KIND, format!("invalid dcgd size {}", dcgd_size)));
		}
		let diff = r.bytes(dcgd_size as usize)?;

		Ok(Self {
			width,
			height,
			base_name,
			chunk_map: map[4..].to_vec(),
			diff,
		})
	}
}

/// Copies a `w`x`h` rectangle at (`x`, `y`) from `diff` into `base`
fn blit(base: &mut Cg, diff: &Cg, x: usize, y: usize, w: usize, h: usize) {
	let stride = base.width() as usize * 4;
	for row in y..y + h {
		let start = row * stride + x * 4;
		let end = start + w * 4;
		base.pixels[start..end].copy_from_slice(&diff.pixels[start..end]);
	}
}

fn apply_diff(base: &mut Cg, diff: &Cg, chunk_map: &[u8]) {
	if (base.width(), base.height()) != (diff.width(), diff.height()) {
		warn!(
			"DCF base CG is {}x{}, difference is {}x{}",
			base.width(),
			base.height(),
			diff.width(),
			diff.height()
		);
		return;
	}

	let (w, h) = (base.width() as usize, base.height() as usize);
	let (chunks_w, chunks_h) = (w / CHUNK, h / CHUNK);
	if chunks_w > 0 {
		for (i, _) in chunk_map.iter().enumerate().filter(|&(_, &keep)| keep == 0) {
			let (cx, cy) = (i % chunks_w, i / chunks_w);
			if cy >= chunks_h {
				break;
			}
			blit(base, diff, cx * CHUNK, cy * CHUNK, CHUNK, CHUNK);
		}
	}

	// pixels past the last whole chunk always come from the difference
	if w % CHUNK != 0 {
		blit(base, diff, chunks_w * CHUNK, 0, w % CHUNK, h);
	}
	if h % CHUNK != 0 {
		blit(base, diff, 0, chunks_h * CHUNK, w, h % CHUNK);
	}
}

fn extract_standalone(diff: &[u8]) -> Result<Cg, CgError> {
	if !qnt::check(diff) {
		return Err(CgError::malformed(KIND, "embedded image is not QNT"));
	}
	Ok(qnt::extract(diff)?.with_kind(KIND))
}

pub(super) fn extract(data: &[u8], loader: &Loader<'_>) -> Result<Cg, CgError> {
	let dcf = Dcf::parse(data)?;
	if (dcf.width, dcf.height) == (0, 0) {
		warn!("DCF header has no dimensions");
	}

	let Some(archive) = loader.archive() else {
		return extract_standalone(dcf.diff);
	};

	let name = archive.conv_name(&dcf.base_name);
	let base = match archive.get_by_basename(&name) {
		Some(entry) => match loader.extract_entry(&entry) {
			Ok(base) => Some(base),
			Err(e @ CgError::RecursionLimit(_)) => return Err(e),
			Err(e) => {
				warn!("Failed to decode DCF base CG '{}': {}", name, e);
				None
			}
		},
		None => None,
	};
	let Some(mut base) = base else {
		warn!("Failed to load DCF base CG '{}'", name);
		return extract_standalone(dcf.diff);
	};

	match loader.extract_embedded(dcf.diff) {
		Ok(diff) => apply_diff(&mut base, &diff, &dcf.chunk_map),
		Err(e @ CgError::RecursionLimit(_)) => return Err(e),
		Err(e) => warn!("Failed to load DCF difference CG: {}", e),
	}
	Ok(base.with_kind(KIND))
}

/// Reads the metrics of the embedded QNT without decoding anything
pub(super) fn metrics(data: &[u8]) -> Result<Metrics, CgError> {
	let section = |at: usize, magic: &[u8; 4]| -> Result<usize, CgError> {
		let actual = data
			.get(at..at + 4)
			.and_then(|s| <[u8; 4]>::try_from(s).ok())
			.ok_or(CgError::InsufficientData {
				expected: at + 4,
				actual: data.len(),
			})?;
		if &actual != magic {
			return Err(CgError::InvalidMagic {
				expected: *magic,
				actual,
			});
		}
		Ok(le32_at(data, at + 4)? as usize)
	};

	let dfdl = 8 + section(0, b"dcf ")?;
	let dcgd = dfdl + 8 + section(dfdl, b"dfdl")?;
	section(dcgd, b"dcgd")?;
	let embedded = &data[dcgd + 8..];
	if !qnt::check(embedded) {
		return Err(CgError::malformed(KIND, "embedded image is not QNT"));
	}
	qnt::metrics(embedded)
}
