//! PMS: run-length and line-copy compressed images.
//!
//! 8-bit PMS files are alpha maps (with an RGB palette that the engine does
//! not use for display); 16-bit files are RGB565 with an optional 8-bit alpha
//! plane compressed the same way as an 8-bit image.

use log::warn;

use super::{Cg, CgType, Metrics, Palette, dimensions};
use crate::file::{CgError, reader::Reader};

/// Size of the fixed header
const HEADER_SIZE: usize = 44;

/// Extra rows and columns of slack in the decode buffer; runs may spill
/// past the end of a scanline
const MARGIN: usize = 10;

fn check(data: &[u8]) -> bool {
	if !data.starts_with(b"PM") || data.len() < 32 {
		return false;
	}
	(16..32).step_by(4).all(|at| i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]) >= 0)
}

pub(super) fn check8(data: &[u8]) -> bool {
	check(data) && data[6] == 8
}

pub(super) fn check16(data: &[u8]) -> bool {
	check(data) && data[6] == 16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
	bpp: u8,
	x: i32,
	y: i32,
	width: i32,
	height: i32,
	/// Offset of the pixel data
	dp: u32,
	/// Offset of the palette (8-bit) or alpha plane (16-bit, 0 if none)
	pp: u32,
}

impl Header {
	fn parse(data: &[u8]) -> Result<Self, CgError> {
		let mut r = Reader::new(data);
		r.skip(6)?;
		let bpp = r.u8()?;
		r.skip(16 - 7)?;
		let x = r.i32()?;
		let y = r.i32()?;
		let width = r.i32()?;
		let height = r.i32()?;
		let dp = r.u32()?;
		let pp = r.u32()?;
		let _comment = r.u32()?;
		debug_assert_eq!(r.pos(), HEADER_SIZE);

		Ok(Self {
			bpp,
			x,
			y,
			width,
			height,
			dp,
			pp,
		})
	}

	fn kind(&self) -> CgType {
		if self.bpp == 16 {
			CgType::Pms16
		} else {
			CgType::Pms8
		}
	}

	fn metrics(&self) -> Metrics {
		let bpp = u32::from(self.bpp);
		Metrics {
			x: self.x,
			y: self.y,
			width: self.width.max(0) as u32,
			height: self.height.max(0) as u32,
			bpp,
			has_pixel: self.bpp != 8,
			has_alpha: self.bpp == 8 || self.pp != 0,
			pixel_pitch: (self.width.max(0) as u32).wrapping_mul(bpp / 8),
			alpha_pitch: 1,
		}
	}

	/// Validates the data offsets against the buffer
	fn check_offsets(&self, len: usize) -> Result<(), CgError> {
		if self.dp as usize > len {
			warn!("PMS pixel offset out of bounds");
			return Err(CgError::malformed(self.kind(), "pixel offset out of bounds"));
		}
		if self.pp as usize > len {
			warn!("PMS palette/alpha offset out of bounds");
			return Err(CgError::malformed(self.kind(), "palette/alpha offset out of bounds"));
		}
		Ok(())
	}
}

pub(super) fn metrics(data: &[u8]) -> Result<Metrics, CgError> {
	Header::parse(data).map(|header| header.metrics())
}

/// Copies `n` values from `back` positions earlier, front to back so that
/// overlapping runs repeat
fn copy_back<T: Copy>(pic: &mut [T], loc: usize, back: usize, n: usize, kind: CgType) -> Result<(), CgError> {
	let src = loc.checked_sub(back).ok_or_else(|| CgError::malformed(kind, "copy before first line"))?;
	check_run(pic, loc, n, kind)?;
	for i in 0..n {
		pic[loc + i] = pic[src + i];
	}
	Ok(())
}

fn check_run<T>(pic: &[T], loc: usize, n: usize, kind: CgType) -> Result<(), CgError> {
	if loc + n > pic.len() {
		return Err(CgError::malformed(kind, "run overflows image"));
	}
	Ok(())
}

fn decode8(data: &[u8], w: usize, h: usize) -> Result<Vec<u8>, CgError> {
	const KIND: CgType = CgType::Pms8;
	let mut pic = vec![0u8; (w + MARGIN) * (h + MARGIN)];
	let mut r = Reader::new(data);

	for y in 0..h {
		let mut x = 0;
		while x < w {
			let loc = y * w + x;
			let c0 = r.u8()?;
			let n = match c0 {
				// copy n+3 pixels from the previous line
				0xff => {
					let n = usize::from(r.u8()?) + 3;
					copy_back(&mut pic, loc, w, n, KIND)?;
					n
				}
				// copy n+3 pixels from two lines up
				0xfe => {
					let n = usize::from(r.u8()?) + 3;
					copy_back(&mut pic, loc, w * 2, n, KIND)?;
					n
				}
				// repeat one pixel n+4 times
				0xfd => {
					let n = usize::from(r.u8()?) + 4;
					let c = r.u8()?;
					check_run(&pic, loc, n, KIND)?;
					pic[loc..loc + n].fill(c);
					n
				}
				// repeat a pixel pair n+3 times
				0xfc => {
					let n = (usize::from(r.u8()?) + 3) * 2;
					let pair = [r.u8()?, r.u8()?];
					check_run(&pic, loc, n, KIND)?;
					for (i, px) in pic[loc..loc + n].iter_mut().enumerate() {
						*px = pair[i % 2];
					}
					n
				}
				// escaped literal
				0xf8..=0xfb => {
					pic[loc] = r.u8()?;
					1
				}
				_ => {
					pic[loc] = c0;
					1
				}
			};
			x += n;
		}
	}

	pic.truncate(w * h);
	Ok(pic)
}

fn decode16(data: &[u8], w: usize, h: usize) -> Result<Vec<u16>, CgError> {
	const KIND: CgType = CgType::Pms16;
	let mut pic = vec![0u16; (w + MARGIN) * (h + MARGIN)];
	let mut r = Reader::new(data);

	for y in 0..h {
		let mut x = 0;
		while x < w {
			let loc = y * w + x;
			let c0 = r.u8()?;
			let n = match c0 {
				// copy n+2 pixels from the previous line
				0xff => {
					let n = usize::from(r.u8()?) + 2;
					copy_back(&mut pic, loc, w, n, KIND)?;
					n
				}
				// copy n+2 pixels from two lines up
				0xfe => {
					let n = usize::from(r.u8()?) + 2;
					copy_back(&mut pic, loc, w * 2, n, KIND)?;
					n
				}
				// repeat one pixel n+3 times
				0xfd => {
					let n = usize::from(r.u8()?) + 3;
					let px = r.u16()?;
					check_run(&pic, loc, n, KIND)?;
					pic[loc..loc + n].fill(px);
					n
				}
				// repeat a pixel pair n+2 times
				0xfc => {
					let n = (usize::from(r.u8()?) + 2) * 2;
					let pair = [r.u16()?, r.u16()?];
					check_run(&pic, loc, n, KIND)?;
					for (i, px) in pic[loc..loc + n].iter_mut().enumerate() {
						*px = pair[i % 2];
					}
					n
				}
				// up-left neighbour
				0xfb => {
					copy_back(&mut pic, loc, w + 1, 1, KIND)?;
					1
				}
				// up-right neighbour
				0xfa => {
					let back = w.checked_sub(1).ok_or_else(|| CgError::malformed(KIND, "zero width"))?;
					copy_back(&mut pic, loc, back, 1, KIND)?;
					1
				}
				// shared high bits, then n+1 low-bit bytes
				0xf9 => {
					let n = usize::from(r.u8()?) + 1;
					let hi = r.u8()?;
					let lo = r.u8()?;
					check_run(&pic, loc, n, KIND)?;
					let base = (u16::from(hi & 0xe0) << 8) + (u16::from(hi & 0x18) << 6) + (u16::from(hi & 0x07) << 2);
					pic[loc] = base + low_bits(lo);
					for i in 1..n {
						pic[loc + i] = base | low_bits(r.u8()?);
					}
					n
				}
				// escaped literal
				0xf8 => {
					pic[loc] = r.u16()?;
					1
				}
				_ => {
					pic[loc] = u16::from(c0) | u16::from(r.u8()?) << 8;
					1
				}
			};
			x += n;
		}
	}

	pic.truncate(w * h);
	Ok(pic)
}

fn low_bits(c: u8) -> u16 {
	(u16::from(c & 0xc0) << 5) + (u16::from(c & 0x3c) << 3) + u16::from(c & 0x03)
}

fn rgb565_to_rgba(pc: u16, a: u8) -> [u8; 4] {
	let r = pc & 0xf800;
	let g = pc & 0x07e0;
	let b = pc & 0x001f;
	[(r >> 8 | r >> 13) as u8, (g >> 3 | g >> 9) as u8, (b << 3 | b >> 2) as u8, a]
}

fn read_palette(data: &[u8]) -> Result<Palette, CgError> {
	let mut r = Reader::new(data);
	let mut colors = [[0u8; 3]; 256];
	for color in colors.iter_mut() {
		*color = r.array()?;
	}
	Ok(Palette {
		colors,
	})
}

pub(super) fn extract(data: &[u8]) -> Result<Cg, CgError> {
	let header = Header::parse(data)?;
	let kind = header.kind();
	let (w, h) = dimensions(kind, header.width.into(), header.height.into())?;
	header.check_offsets(data.len())?;

	match header.bpp {
		8 => {
			let palette = read_palette(&data[header.pp as usize..])?;
			let alpha = decode8(&data[header.dp as usize..], w, h)?;
			let pixels = alpha.iter().flat_map(|&a| [0, 0, 0, a]).collect();
			Ok(Cg::from_rgba(kind, header.metrics(), pixels)?.with_palette(palette))
		}
		16 => {
			let colors = decode16(&data[header.dp as usize..], w, h)?;
			let alpha = if header.pp != 0 {
				Some(decode8(&data[header.pp as usize..], w, h)?)
			} else {
				None
			};
			let pixels = colors
				.iter()
				.enumerate()
				.flat_map(|(i, &pc)| rgb565_to_rgba(pc, alpha.as_ref().map_or(0xff, |a| a[i])))
				.collect();
			Cg::from_rgba(kind, header.metrics(), pixels)
		}
		bpp => {
			warn!("Unsupported PMS bpp: {}", bpp);
			Err(CgError::unsupported(kind, format!("{} bits per pixel", bpp)))
		}
	}
}

/// Decodes an 8-bit PMS image as a bare `width * height` alpha mask
pub(super) fn extract_mask(data: &[u8]) -> Result<Vec<u8>, CgError> {
	let header = Header::parse(data)?;
	header.check_offsets(data.len())?;
	if header.bpp != 8 {
		warn!("PMS mask is not 8bpp");
		return Err(CgError::unsupported(header.kind(), "mask is not 8bpp"));
	}
	let (w, h) = dimensions(CgType::Pms8, header.width.into(), header.height.into())?;
	decode8(&data[header.dp as usize..], w, h)
}
