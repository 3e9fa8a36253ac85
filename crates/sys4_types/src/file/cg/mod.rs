//! CG image support.
//!
//! Every supported encoding is identified from its leading bytes by
//! [`CgType::sniff`] and decoded into a [`Cg`]: a canonical RGBA8 buffer of
//! `width * height * 4` bytes, whatever the source channel layout.
//!
//! Some formats pull companion images from the archive they were loaded from
//! (WEBP overlays, DCF difference images). Those lookups go through
//! [`sys4_vfs::Archive`] and are bounded to [`MAX_DEPTH`] nested loads.
//!
//! # Examples
//!
//! ```no_run
//! use sys4_types::file::cg;
//! use sys4_vfs::AldArchive;
//!
//! let archive = AldArchive::open(&[Some("GameCA.ald")], true)?;
//! let image = cg::load(&archive, 12)?;
//! println!("{}: {}x{}", image.kind(), image.width(), image.height());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod ajp;
mod dcf;
mod pcf;
mod pms;
mod qnt;
mod standard;
mod webp;

use std::{
	fmt,
	io::{Read, Write},
	path::Path,
};

use flate2::read::ZlibDecoder;
use log::warn;
use sys4_vfs::{Archive, Entry};

use crate::file::CgError;

/// Maximum depth of nested loads (base images, embedded images)
pub const MAX_DEPTH: usize = 8;

/// Largest accepted pixel count; protects against absurd header dimensions
pub const MAX_PIXELS: usize = 1 << 26;

/// Supported CG encodings, in sniffing priority order
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CgType {
	/// No signature matched
	#[default]
	Unknown,

	/// Zlib-compressed planar RGB with optional alpha plane
	Qnt,

	/// Obfuscated JPEG with a separate alpha mask
	Ajp,

	/// Standard PNG
	Png,

	/// Run-length compressed 8-bit indexed image
	Pms8,

	/// Run-length compressed RGB565 image
	Pms16,

	/// Standard WEBP, optionally overlaid on a base CG
	Webp,

	/// Difference image applied over a base CG
	Dcf,

	/// Standard JPEG
	Jpeg,

	/// Positioned QNT on a larger canvas
	Pcf,

	/// Standard BMP
	Bmp,
}

impl CgType {
	/// Identifies the encoding of `data`. Buffers too short for a signature
	/// never match it.
	pub fn sniff(data: &[u8]) -> Self {
		if qnt::check(data) {
			CgType::Qnt
		} else if ajp::check(data) {
			CgType::Ajp
		} else if standard::check_png(data) {
			CgType::Png
		} else if webp::check(data) {
			CgType::Webp
		} else if dcf::check(data) {
			CgType::Dcf
		} else if pms::check8(data) {
			CgType::Pms8
		} else if pms::check16(data) {
			CgType::Pms16
		} else if standard::check_jpeg(data) {
			CgType::Jpeg
		} else if pcf::check(data) {
			CgType::Pcf
		} else if standard::check_bmp(data) {
			CgType::Bmp
		} else {
			CgType::Unknown
		}
	}

	/// Canonical file extension, without the dot
	pub fn extension(self) -> &'static str {
		match self {
			CgType::Unknown => "",
			CgType::Qnt => "qnt",
			CgType::Ajp => "ajp",
			CgType::Png => "png",
			CgType::Pms8 | CgType::Pms16 => "pms",
			CgType::Webp => "webp",
			CgType::Dcf => "dcf",
			CgType::Jpeg => "jpg",
			CgType::Pcf => "pcf",
			CgType::Bmp => "bmp",
		}
	}
}

impl fmt::Display for CgType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			CgType::Unknown => "unknown",
			CgType::Qnt => "QNT",
			CgType::Ajp => "AJP",
			CgType::Png => "PNG",
			CgType::Pms8 => "PMS8",
			CgType::Pms16 => "PMS16",
			CgType::Webp => "WEBP",
			CgType::Dcf => "DCF",
			CgType::Jpeg => "JPEG",
			CgType::Pcf => "PCF",
			CgType::Bmp => "BMP",
		};
		f.write_str(name)
	}
}

/// Header-level description of an image
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Metrics {
	/// Display x offset
	pub x: i32,

	/// Display y offset
	pub y: i32,

	/// Width in pixels
	pub width: u32,

	/// Height in pixels
	pub height: u32,

	/// Bits per pixel of the source encoding
	pub bpp: u32,

	/// Source carries color data
	pub has_pixel: bool,

	/// Source carries alpha data
	pub has_alpha: bool,

	/// Bytes per row of source color data
	pub pixel_pitch: u32,

	/// Bytes per row of source alpha data, per pixel
	pub alpha_pitch: u32,
}

impl Metrics {
	/// Metrics describing a plain RGBA8 image
	pub fn rgba(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			bpp: 32,
			has_pixel: true,
			has_alpha: true,
			pixel_pitch: width * 4,
			alpha_pitch: 1,
			..Default::default()
		}
	}
}

/// 256-color RGB palette carried by indexed images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
	/// Palette entries as `[r, g, b]`
	pub colors: [[u8; 3]; 256],
}

/// A decoded image in canonical RGBA8 layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cg {
	kind: CgType,
	metrics: Metrics,
	palette: Option<Box<Palette>>,
	pixels: Vec<u8>,
}

impl Cg {
	/// Wraps an RGBA8 buffer.
	///
	/// Fails unless both dimensions are positive and `pixels` holds exactly
	/// `width * height * 4` bytes. `has_pixel` is always set.
	pub fn from_rgba(kind: CgType, mut metrics: Metrics, pixels: Vec<u8>) -> Result<Self, CgError> {
		if metrics.width == 0 || metrics.height == 0 {
			return Err(CgError::malformed(kind, "image has no pixels"));
		}
		let expected = metrics.width as usize * metrics.height as usize * 4;
		if pixels.len() != expected {
			return Err(CgError::malformed(
				kind,
				format!("pixel buffer is {} bytes, expected {}", pixels.len(), expected),
			));
		}
		metrics.has_pixel = true;
		Ok(Self {
			kind,
			metrics,
			palette: None,
			pixels,
		})
	}

	pub(crate) fn with_palette(mut self, palette: Palette) -> Self {
		self.palette = Some(Box::new(palette));
		self
	}

	pub(crate) fn with_kind(mut self, kind: CgType) -> Self {
		self.kind = kind;
		self
	}

	/// Encoding the image was decoded from
	pub fn kind(&self) -> CgType {
		self.kind
	}

	/// Image metrics
	pub fn metrics(&self) -> &Metrics {
		&self.metrics
	}

	/// Palette, for indexed sources
	pub fn palette(&self) -> Option<&Palette> {
		self.palette.as_deref()
	}

	/// Width in pixels
	pub fn width(&self) -> u32 {
		self.metrics.width
	}

	/// Height in pixels
	pub fn height(&self) -> u32 {
		self.metrics.height
	}

	/// Interleaved RGBA8 pixels, row-major
	pub fn pixels(&self) -> &[u8] {
		&self.pixels
	}

	/// Consumes the image, returning its pixel buffer
	pub fn into_pixels(self) -> Vec<u8> {
		self.pixels
	}

	/// Returns the RGBA value at `(x, y)`
	pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
		if x >= self.width() || y >= self.height() {
			return None;
		}
		let at = (y as usize * self.width() as usize + x as usize) * 4;
		let mut out = [0u8; 4];
		out.copy_from_slice(&self.pixels[at..at + 4]);
		Some(out)
	}
}

/// Identifies the encoding of `data`
pub fn check_format(data: &[u8]) -> CgType {
	CgType::sniff(data)
}

/// Reads image metrics without decoding pixels
pub fn get_metrics(data: &[u8]) -> Result<Metrics, CgError> {
	let kind = CgType::sniff(data);
	match kind {
		CgType::Qnt => qnt::metrics(data),
		CgType::Ajp => {
			warn!("AJP metrics not implemented");
			Err(CgError::MetricsUnimplemented(kind))
		}
		CgType::Png | CgType::Jpeg | CgType::Bmp => standard::metrics(data, kind),
		CgType::Webp => webp::metrics(data),
		CgType::Dcf => dcf::metrics(data),
		CgType::Pms8 | CgType::Pms16 => pms::metrics(data),
		CgType::Pcf => pcf::metrics(data),
		CgType::Unknown => {
			warn!("Unknown CG type");
			Err(CgError::UnknownFormat)
		}
	}
}

/// Reads the metrics of an archive entry, loading a copy if needed
pub fn get_metrics_entry(entry: &Entry<'_>) -> Result<Metrics, CgError> {
	match entry.data() {
		Some(data) => get_metrics(data),
		None => {
			let mut copy = entry.copy_descriptor();
			copy.load()?;
			get_metrics(copy.data().unwrap_or_default())
		}
	}
}

/// Reads the metrics of archive entry `no`
pub fn get_metrics_no(archive: &dyn Archive, no: usize) -> Result<Metrics, CgError> {
	let entry = archive.get(no).ok_or(CgError::NotFound {
		no,
	})?;
	get_metrics_entry(&entry)
}

/// Decodes `data`. Formats that reference companion images resolve them
/// through `archive` when one is given.
pub fn extract(data: &[u8], archive: Option<&dyn Archive>) -> Result<Cg, CgError> {
	Loader::new(archive).extract(data)
}

/// Decodes a standalone buffer
pub fn load_buffer(data: &[u8]) -> Result<Cg, CgError> {
	extract(data, None)
}

/// Decodes an archive entry, resolving companion images in its archive
pub fn load_entry(entry: &Entry<'_>) -> Result<Cg, CgError> {
	match entry.data() {
		Some(data) => extract(data, Some(entry.archive())),
		None => {
			let mut copy = entry.copy_descriptor();
			copy.load()?;
			extract(copy.data().unwrap_or_default(), Some(entry.archive()))
		}
	}
}

/// Decodes archive entry `no`
pub fn load(archive: &dyn Archive, no: usize) -> Result<Cg, CgError> {
	let Some(entry) = archive.get(no) else {
		warn!("Failed to load CG {}", no);
		return Err(CgError::NotFound {
			no,
		});
	};
	load_entry(&entry)
}

/// Reads and decodes an image file
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Cg, CgError> {
	let data = std::fs::read(path)?;
	load_buffer(&data)
}

/// Encodes `cg` as `kind`. Only QNT, PNG and WEBP (lossless) can be written.
pub fn write<W: Write>(cg: &Cg, kind: CgType, writer: W) -> Result<(), CgError> {
	match kind {
		CgType::Qnt => qnt::write(cg, writer),
		CgType::Png | CgType::Webp => standard::write(cg, kind, writer),
		_ => {
			warn!("Encoding not supported for {}", kind);
			Err(CgError::EncodeUnsupported(kind))
		}
	}
}

/// Decode context: the archive companion images come from, and the current
/// nesting depth
#[derive(Clone, Copy)]
pub(crate) struct Loader<'a> {
	archive: Option<&'a dyn Archive>,
	depth: usize,
}

impl<'a> Loader<'a> {
	pub(crate) fn new(archive: Option<&'a dyn Archive>) -> Self {
		Self {
			archive,
			depth: 0,
		}
	}

	pub(crate) fn archive(&self) -> Option<&'a dyn Archive> {
		self.archive
	}

	fn nested(&self, archive: Option<&'a dyn Archive>) -> Result<Self, CgError> {
		if self.depth >= MAX_DEPTH {
			return Err(CgError::RecursionLimit(MAX_DEPTH));
		}
		Ok(Self {
			archive,
			depth: self.depth + 1,
		})
	}

	pub(crate) fn extract(&self, data: &[u8]) -> Result<Cg, CgError> {
		let kind = CgType::sniff(data);
		match kind {
			CgType::Qnt => qnt::extract(data),
			CgType::Ajp => ajp::extract(data),
			CgType::Png | CgType::Jpeg | CgType::Bmp => standard::extract(data, kind),
			CgType::Webp => webp::extract(data, self),
			CgType::Dcf => dcf::extract(data, self),
			CgType::Pms8 | CgType::Pms16 => pms::extract(data),
			CgType::Pcf => pcf::extract(data, self),
			CgType::Unknown => {
				warn!("Unknown CG type");
				Err(CgError::UnknownFormat)
			}
		}
	}

	/// Decodes an image embedded in another, without archive access
	pub(crate) fn extract_embedded(&self, data: &[u8]) -> Result<Cg, CgError> {
		self.nested(None)?.extract(data)
	}

	/// Decodes a companion entry from the same archive
	pub(crate) fn extract_entry(&self, entry: &Entry<'a>) -> Result<Cg, CgError> {
		self.nested(Some(entry.archive()))?.extract(entry.data().unwrap_or_default())
	}
}

/// Inflates a zlib stream whose output may not exceed `limit` bytes
pub(crate) fn inflate(kind: CgType, data: &[u8], limit: usize) -> Result<Vec<u8>, CgError> {
	let mut out = Vec::with_capacity(limit.min(MAX_PIXELS));
	ZlibDecoder::new(data).take(limit as u64 + 1).read_to_end(&mut out).map_err(|source| {
		CgError::Decompress {
			source,
		}
	})?;
	if out.len() > limit {
		warn!("{} zlib stream inflates past {} bytes", kind, limit);
		return Err(CgError::malformed(kind, format!("inflated data exceeds {} bytes", limit)));
	}
	Ok(out)
}

/// Validates header dimensions, returning them as `usize`
pub(crate) fn dimensions(kind: CgType, width: i64, height: i64) -> Result<(usize, usize), CgError> {
	if width <= 0 || height <= 0 {
		return Err(CgError::malformed(kind, format!("invalid dimensions {}x{}", width, height)));
	}
	let (w, h) = (width as usize, height as usize);
	if w.saturating_mul(h) > MAX_PIXELS {
		return Err(CgError::unsupported(kind, format!("image too large: {}x{}", w, h)));
	}
	Ok((w, h))
}
