//! AJP: a JPEG with its first bytes scrambled, plus an optional alpha mask.

use image::ImageFormat;
use log::warn;

use super::{Cg, CgType, Metrics, dimensions, inflate, pms};
use crate::file::{CgError, reader::Reader};

const MAGIC: &[u8; 4] = b"AJP\0";

/// XOR key applied to the first bytes of both the JPEG and the mask
const KEY: [u8; 16] = [
	0x5d, 0x91, 0xae, 0x87, 0x4a, 0x56, 0x41, 0xcd, 0x83, 0xec, 0x4c, 0x92, 0xb5, 0xcb, 0x16, 0x34,
];

pub(super) fn check(data: &[u8]) -> bool {
	data.starts_with(MAGIC)
}

#[derive(Debug, Clone, Copy)]
struct Header {
	width: u32,
	height: u32,
	jpeg_offset: u32,
	jpeg_size: u32,
	mask_offset: u32,
	mask_size: u32,
}

impl Header {
	fn parse(data: &[u8]) -> Result<Self, CgError> {
		let mut r = Reader::new(data);
		r.skip(12)?;
		Ok(Self {
			width: r.u32()?,
			height: r.u32()?,
			jpeg_offset: r.u32()?,
			jpeg_size: r.u32()?,
			mask_offset: r.u32()?,
			mask_size: r.u32()?,
		})
	}

	fn metrics(&self) -> Metrics {
		Metrics {
			width: self.width,
			height: self.height,
			bpp: 24,
			has_pixel: true,
			has_alpha: self.mask_size > 0,
			pixel_pitch: self.width.wrapping_mul(3),
			alpha_pitch: 1,
			..Default::default()
		}
	}
}

/// Copies a section out of `data` and undoes the scrambling
fn section(data: &[u8], offset: u32, size: u32, what: &str) -> Result<Vec<u8>, CgError> {
	let start = offset as usize;
	let end = start.checked_add(size as usize).filter(|&end| end <= data.len());
	let Some(end) = end else {
		warn!("AJP {} out of bounds", what);
		return Err(CgError::malformed(CgType::Ajp, format!("{} out of bounds", what)));
	};
	let mut buf = data[start..end].to_vec();
	descramble(&mut buf);
	Ok(buf)
}

fn descramble(buf: &mut [u8]) {
	for (b, k) in buf.iter_mut().zip(KEY) {
		*b ^= k;
	}
}

fn decode_mask(mask: &[u8], len: usize) -> Vec<u8> {
	let mut alpha = if pms::check8(mask) {
		match pms::extract_mask(mask) {
			Ok(alpha) => alpha,
			Err(e) => {
				warn!("Failed to decode AJP mask: {}", e);
				Vec::new()
			}
		}
	} else if mask.first() == Some(&0x78) {
		match inflate(CgType::Ajp, mask, len) {
			Ok(alpha) => {
				if alpha.len() != len {
					warn!("AJP mask size mismatch: expected {}, got {}", len, alpha.len());
				}
				alpha
			}
			Err(e) => {
				warn!("Failed to inflate AJP mask: {}", e);
				Vec::new()
			}
		}
	} else {
		if !mask.is_empty() {
			warn!("Unsupported AJP mask format");
		}
		Vec::new()
	};
	alpha.resize(len, 0xff);
	alpha
}

pub(super) fn extract(data: &[u8]) -> Result<Cg, CgError> {
	let header = Header::parse(data)?;
	dimensions(CgType::Ajp, header.width.into(), header.height.into())?;

	let jpeg = section(data, header.jpeg_offset, header.jpeg_size, "JPEG data")?;
	let mask = section(data, header.mask_offset, header.mask_size, "mask")?;

	let image = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)?.to_rgb8();
	let (width, height) = image.dimensions();
	if (width, height) != (header.width, header.height) {
		warn!(
			"AJP JPEG size {}x{} does not match header {}x{}",
			width, height, header.width, header.height
		);
	}

	let len = width as usize * height as usize;
	let alpha = decode_mask(&mask, len);
	let pixels = image.pixels().zip(alpha).flat_map(|(px, a)| [px[0], px[1], px[2], a]).collect();

	let metrics = Metrics {
		width,
		height,
		pixel_pitch: width * 3,
		..header.metrics()
	};
	Cg::from_rgba(CgType::Ajp, metrics, pixels)
}
