//! QNT: zlib-compressed planar RGB plus an optional alpha plane.
//!
//! Color data is stored as three planes (blue, green, red) of 2x2 blocks over
//! a grid padded to even dimensions; alpha is a padded row-major grid. Both
//! are delta filtered against the average of the upper and left neighbours.

use std::io::Write;

use flate2::{Compression, write::ZlibEncoder};
use log::warn;

use super::{Cg, CgType, Metrics, dimensions, inflate};
use crate::file::{CgError, reader::Reader};

mod constants {
	/// Signature, checked on its first three bytes
	pub const MAGIC: &[u8; 4] = b"QNT\0";

	/// Header size of version 0 files, which do not store it
	pub const V0_HEADER_SIZE: u32 = 48;

	/// Header size written by the encoder
	pub const V1_HEADER_SIZE: u32 = 52;

	/// Slack allowed past the padded plane size when inflating
	pub const ZLIB_MARGIN: usize = 5 * 1024;
}

pub(super) fn check(data: &[u8]) -> bool {
	data.starts_with(&constants::MAGIC[..3])
}

/// Full four-byte signature match, required of images nested in PCF
pub(super) fn check_strict(data: &[u8]) -> bool {
	data.starts_with(constants::MAGIC)
}

/// QNT header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
	header_size: u32,
	x: i32,
	y: i32,
	width: u32,
	height: u32,
	bpp: u32,
	pixel_size: u32,
	alpha_size: u32,
}

impl Header {
	fn parse(data: &[u8]) -> Result<Self, CgError> {
		let mut r = Reader::new(data);
		r.skip(4)?;
		let version = r.u32()?;
		let header_size = if version == 0 {
			constants::V0_HEADER_SIZE
		} else {
			r.u32()?
		};
		let x = r.i32()?;
		let y = r.i32()?;
		let width = r.u32()?;
		let height = r.u32()?;
		let bpp = r.u32()?;
		let _reserved = r.u32()?;
		let pixel_size = r.u32()?;
		let alpha_size = r.u32()?;

		if bpp != 24 {
			warn!("Unsupported QNT bits-per-pixel: {}", bpp);
		}

		Ok(Self {
			header_size,
			x,
			y,
			width,
			height,
			bpp,
			pixel_size,
			alpha_size,
		})
	}

	fn metrics(&self) -> Metrics {
		Metrics {
			x: self.x,
			y: self.y,
			width: self.width,
			height: self.height,
			bpp: self.bpp,
			has_pixel: self.pixel_size > 0,
			has_alpha: self.alpha_size > 0,
			pixel_pitch: self.width.wrapping_mul(self.bpp / 8),
			alpha_pitch: 1,
		}
	}
}

pub(super) fn metrics(data: &[u8]) -> Result<Metrics, CgError> {
	Header::parse(data).map(|header| header.metrics())
}

pub(super) fn extract(data: &[u8]) -> Result<Cg, CgError> {
	let header = Header::parse(data)?;
	let (w, h) = dimensions(CgType::Qnt, header.width.into(), header.height.into())?;

	let pixel_start = header.header_size as usize;
	let pixel_end = pixel_start + header.pixel_size as usize;
	let alpha_end = pixel_end + header.alpha_size as usize;
	if alpha_end > data.len() {
		return Err(CgError::InsufficientData {
			expected: alpha_end,
			actual: data.len(),
		});
	}

	let rgb = if header.pixel_size > 0 {
		decode_pixels(&data[pixel_start..pixel_end], w, h)?
	} else {
		vec![0; w * h * 3]
	};
	let alpha = if header.alpha_size > 0 {
		decode_alpha(&data[pixel_end..alpha_end], w, h)?
	} else {
		vec![0xff; w * h]
	};

	let mut pixels = Vec::with_capacity(w * h * 4);
	for (rgb, a) in rgb.chunks_exact(3).zip(alpha) {
		pixels.extend_from_slice(rgb);
		pixels.push(a);
	}
	Cg::from_rgba(CgType::Qnt, header.metrics(), pixels)
}

fn decode_pixels(compressed: &[u8], w: usize, h: usize) -> Result<Vec<u8>, CgError> {
	let (pw, ph) = (w.next_multiple_of(2), h.next_multiple_of(2));
	let mut raw = inflate(CgType::Qnt, compressed, (w + 1) * (h + 1) * 3 + constants::ZLIB_MARGIN)?;
	raw.resize(pw * ph * 3, 0);

	let mut pic = vec![0u8; w * h * 3];
	let mut blocks = raw.chunks_exact(4);
	for c in (0..3).rev() {
		for y in (0..h).step_by(2) {
			for x in (0..w).step_by(2) {
				let Some(block) = blocks.next() else {
					break;
				};
				pic[(y * w + x) * 3 + c] = block[0];
				if y + 1 < h {
					pic[((y + 1) * w + x) * 3 + c] = block[1];
				}
				if x + 1 < w {
					pic[(y * w + x + 1) * 3 + c] = block[2];
					if y + 1 < h {
						pic[((y + 1) * w + x + 1) * 3 + c] = block[3];
					}
				}
			}
		}
	}

	unfilter(&mut pic, w, h, 3);
	Ok(pic)
}

fn decode_alpha(compressed: &[u8], w: usize, h: usize) -> Result<Vec<u8>, CgError> {
	let pw = w.next_multiple_of(2);
	let mut raw = inflate(CgType::Qnt, compressed, (w + 1) * (h + 1) + constants::ZLIB_MARGIN)?;
	raw.resize(pw * h, 0);

	let mut pic = Vec::with_capacity(w * h);
	for row in raw.chunks_exact(pw) {
		pic.extend_from_slice(&row[..w]);
	}
	unfilter(&mut pic, w, h, 1);
	Ok(pic)
}

/// Reverses the delta filter in place over a `w` x `h` grid of `ch` channels
fn unfilter(pic: &mut [u8], w: usize, h: usize, ch: usize) {
	let stride = w * ch;
	for i in ch..stride {
		pic[i] = pic[i - ch].wrapping_sub(pic[i]);
	}
	for y in 1..h {
		let row = y * stride;
		for i in row..row + ch {
			pic[i] = pic[i - stride].wrapping_sub(pic[i]);
		}
		for i in row + ch..row + stride {
			let avg = ((u16::from(pic[i - stride]) + u16::from(pic[i - ch])) >> 1) as u8;
			pic[i] = avg.wrapping_sub(pic[i]);
		}
	}
}

/// Applies the delta filter in place to RGBA rows of `stride` pixels,
/// covering the top-left `w` x `h` region
fn filter(rows: &mut [u8], stride: usize, w: usize, h: usize) {
	let s = stride * 4;
	for y in (1..h).rev() {
		for x in (1..w).rev() {
			for c in 0..4 {
				let i = y * s + x * 4 + c;
				let avg = ((u16::from(rows[i - s]) + u16::from(rows[i - 4])) >> 1) as u8;
				rows[i] = avg.wrapping_sub(rows[i]);
			}
		}
		for c in 0..4 {
			rows[y * s + c] = rows[(y - 1) * s + c].wrapping_sub(rows[y * s + c]);
		}
	}
	for x in (1..w).rev() {
		for c in 0..4 {
			rows[x * 4 + c] = rows[(x - 1) * 4 + c].wrapping_sub(rows[x * 4 + c]);
		}
	}
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, CgError> {
	let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
	encoder.write_all(data)?;
	Ok(encoder.finish()?)
}

pub(super) fn write<W: Write>(cg: &Cg, mut writer: W) -> Result<(), CgError> {
	let (w, h) = (cg.width() as usize, cg.height() as usize);
	let (pw, ph) = (w.next_multiple_of(2), h.next_multiple_of(2));

	let mut rows = vec![0u8; pw * ph * 4];
	for (dst, src) in rows.chunks_exact_mut(pw * 4).zip(cg.pixels().chunks_exact(w * 4)) {
		dst[..w * 4].copy_from_slice(src);
	}
	filter(&mut rows, pw, w, h);

	let mut planes = Vec::with_capacity(pw * ph * 3);
	for c in (0..3).rev() {
		for y in (0..ph).step_by(2) {
			for x in (0..pw).step_by(2) {
				planes.push(rows[(y * pw + x) * 4 + c]);
				planes.push(rows[((y + 1) * pw + x) * 4 + c]);
				planes.push(rows[(y * pw + x + 1) * 4 + c]);
				planes.push(rows[((y + 1) * pw + x + 1) * 4 + c]);
			}
		}
	}
	let alpha: Vec<u8> = rows.chunks_exact(4).map(|px| px[3]).collect();

	let pixel_data = deflate(&planes)?;
	let alpha_data = deflate(&alpha)?;

	let metrics = cg.metrics();
	let mut header = Vec::with_capacity(constants::V1_HEADER_SIZE as usize);
	header.extend_from_slice(constants::MAGIC);
	header.extend_from_slice(&1u32.to_le_bytes());
	header.extend_from_slice(&constants::V1_HEADER_SIZE.to_le_bytes());
	header.extend_from_slice(&metrics.x.to_le_bytes());
	header.extend_from_slice(&metrics.y.to_le_bytes());
	header.extend_from_slice(&metrics.width.to_le_bytes());
	header.extend_from_slice(&metrics.height.to_le_bytes());
	header.extend_from_slice(&24u32.to_le_bytes());
	header.extend_from_slice(&1u32.to_le_bytes());
	header.extend_from_slice(&(pixel_data.len() as u32).to_le_bytes());
	header.extend_from_slice(&(alpha_data.len() as u32).to_le_bytes());
	header.resize(constants::V1_HEADER_SIZE as usize, 0);

	writer.write_all(&header)?;
	writer.write_all(&pixel_data)?;
	writer.write_all(&alpha_data)?;
	Ok(())
}
