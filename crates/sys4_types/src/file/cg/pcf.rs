//! PCF: a QNT image placed at an offset on a larger transparent canvas.

use log::warn;

use super::{Cg, CgType, Loader, Metrics, dimensions, qnt};
use crate::file::{CgError, reader::Reader};

const KIND: CgType = CgType::Pcf;

pub(super) fn check(data: &[u8]) -> bool {
	data.starts_with(b"pcf ")
}

#[derive(Debug, Default)]
struct Header {
	width: i32,
	height: i32,
	bpp: i32,
	x: i32,
	y: i32,
}

impl Header {
	fn metrics(&self) -> Metrics {
		let width = self.width.max(0) as u32;
		Metrics {
			width,
			height: self.height.max(0) as u32,
			bpp: self.bpp.max(0) as u32,
			has_pixel: true,
			has_alpha: true,
			pixel_pitch: width.wrapping_mul(self.bpp.max(0) as u32 / 8),
			alpha_pitch: 1,
			..Default::default()
		}
	}
}

/// Reads a section tag and size, returning the position the section ends at
fn begin_section(r: &mut Reader<'_>, magic: &[u8; 4]) -> Result<usize, CgError> {
	let actual = r.array::<4>()?;
	if &actual != magic {
		warn!("Expected PCF {} section", String::from_utf8_lossy(magic).trim_end());
		return Err(CgError::InvalidMagic {
			expected: *magic,
			actual,
		});
	}
	let size = r.i32()?;
	if size < 0 {
		return Err(CgError::malformed(KIND, format!("negative section size {}", size)));
	}
	Ok(r.pos() + size as usize)
}

fn end_section(r: &mut Reader<'_>, end: usize, what: &str) -> Result<(), CgError> {
	if r.pos() != end {
		warn!("PCF {} size didn't match", what);
		r.seek(end)?;
	}
	Ok(())
}

fn read_pcf(r: &mut Reader<'_>, header: &mut Header) -> Result<(), CgError> {
	let end = begin_section(r, b"pcf ")?;
	let version = r.i32()?;
	if version != 1 {
		warn!("Unsupported PCF version: {}", version);
		return Err(CgError::unsupported(KIND, format!("version {}", version)));
	}
	header.width = r.i32()?;
	header.height = r.i32()?;
	header.bpp = r.i32()?;
	let name_len = r.i32()?;
	if name_len < 0 {
		return Err(CgError::malformed(KIND, format!("negative string length {}", name_len)));
	}
	r.skip(name_len as usize)?;
	end_section(r, end, "header")
}

fn read_ptdl(r: &mut Reader<'_>, header: &mut Header) -> Result<(), CgError> {
	let end = begin_section(r, b"ptdl")?;
	header.x = r.i32()?;
	header.y = r.i32()?;
	let _unknown = (r.i32()?, r.i32()?);
	end_section(r, end, "ptdl")
}

/// Copies `src` onto `dst` at (`x`, `y`), clipped to `dst`
fn place(dst: &mut [u8], dst_w: usize, dst_h: usize, src: &Cg, x: i64, y: i64) {
	let (src_w, src_h) = (i64::from(src.width()), i64::from(src.height()));
	for row in 0..src_h {
		let dy = y + row;
		if dy < 0 || dy >= dst_h as i64 {
			continue;
		}
		let x0 = x.max(0);
		let x1 = (x + src_w).min(dst_w as i64);
		if x0 >= x1 {
			return;
		}
		let n = (x1 - x0) as usize * 4;
		let s = ((row * src_w + (x0 - x)) * 4) as usize;
		let d = (dy as usize * dst_w + x0 as usize) * 4;
		dst[d..d + n].copy_from_slice(&src.pixels()[s..s + n]);
	}
}

pub(super) fn extract(data: &[u8], loader: &Loader<'_>) -> Result<Cg, CgError> {
	let mut r = Reader::new(data);
	let mut header = Header::default();
	read_pcf(&mut r, &mut header)?;
	read_ptdl(&mut r, &mut header)?;

	r.array::<4>()
		.ok()
		.filter(|tag| tag == b"pcgd")
		.ok_or_else(|| CgError::malformed(KIND, "missing pcgd section"))?;
	let size = r.i32()?;
	if size < 4 || !qnt::check_strict(r.remaining()) {
		warn!("PCF CG isn't QNT format");
		return Err(CgError::malformed(KIND, "embedded image is not QNT"));
	}
	let part = loader.extract_embedded(r.remaining())?;

	let (w, h) = dimensions(KIND, header.width.into(), header.height.into())?;
	let mut pixels = vec![0u8; w * h * 4];
	place(&mut pixels, w, h, &part, header.x.into(), header.y.into());
	Cg::from_rgba(KIND, header.metrics(), pixels)
}

pub(super) fn metrics(data: &[u8]) -> Result<Metrics, CgError> {
	let mut header = Header::default();
	read_pcf(&mut Reader::new(data), &mut header)?;
	Ok(header.metrics())
}
