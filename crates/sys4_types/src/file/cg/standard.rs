//! Standard formats (PNG, JPEG, BMP, WEBP) through the `image` codecs.

use std::io::{Cursor, Write};

use image::{
	ExtendedColorType, ImageDecoder, ImageEncoder, ImageFormat,
	codecs::{
		bmp::BmpDecoder, jpeg::JpegDecoder, png::PngDecoder, png::PngEncoder, webp::WebPDecoder,
		webp::WebPEncoder,
	},
};

use super::{Cg, CgType, Metrics};
use crate::file::CgError;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub(super) fn check_png(data: &[u8]) -> bool {
	data.starts_with(&PNG_MAGIC)
}

pub(super) fn check_jpeg(data: &[u8]) -> bool {
	data.starts_with(&[0xFF, 0xD8])
}

pub(super) fn check_bmp(data: &[u8]) -> bool {
	data.starts_with(b"BM")
}

fn image_format(kind: CgType) -> Result<ImageFormat, CgError> {
	match kind {
		CgType::Png => Ok(ImageFormat::Png),
		CgType::Jpeg => Ok(ImageFormat::Jpeg),
		CgType::Bmp => Ok(ImageFormat::Bmp),
		CgType::Webp => Ok(ImageFormat::WebP),
		_ => Err(CgError::unsupported(kind, "not a standard format")),
	}
}

fn metrics_for(width: u32, height: u32, channels: u8) -> Metrics {
	let channels = u32::from(channels);
	Metrics {
		width,
		height,
		bpp: channels * 8,
		has_pixel: true,
		has_alpha: channels >= 4,
		pixel_pitch: width * channels,
		alpha_pitch: 1,
		..Default::default()
	}
}

fn decoder_info(decoder: impl ImageDecoder) -> (u32, u32, u8) {
	let (width, height) = decoder.dimensions();
	(width, height, decoder.color_type().channel_count())
}

/// Header-only dimensions and channel count
pub(super) fn info(data: &[u8], kind: CgType) -> Result<(u32, u32, u8), CgError> {
	let reader = Cursor::new(data);
	Ok(match kind {
		CgType::Png => decoder_info(PngDecoder::new(reader)?),
		CgType::Jpeg => decoder_info(JpegDecoder::new(reader)?),
		CgType::Bmp => decoder_info(BmpDecoder::new(reader)?),
		CgType::Webp => decoder_info(WebPDecoder::new(reader)?),
		_ => return Err(CgError::unsupported(kind, "not a standard format")),
	})
}

pub(super) fn metrics(data: &[u8], kind: CgType) -> Result<Metrics, CgError> {
	let (width, height, channels) = info(data, kind)?;
	Ok(metrics_for(width, height, channels))
}

/// Decodes to RGBA8, returning the source channel count alongside
pub(super) fn decode_rgba(data: &[u8], kind: CgType) -> Result<(image::RgbaImage, u8), CgError> {
	let image = image::load_from_memory_with_format(data, image_format(kind)?)?;
	let channels = image.color().channel_count();
	Ok((image.to_rgba8(), channels))
}

pub(super) fn extract(data: &[u8], kind: CgType) -> Result<Cg, CgError> {
	let (image, channels) = decode_rgba(data, kind)?;
	let (width, height) = image.dimensions();
	Cg::from_rgba(kind, metrics_for(width, height, channels), image.into_raw())
}

pub(super) fn write<W: Write>(cg: &Cg, kind: CgType, writer: W) -> Result<(), CgError> {
	let (width, height) = (cg.width(), cg.height());
	match kind {
		CgType::Png => {
			PngEncoder::new(writer).write_image(cg.pixels(), width, height, ExtendedColorType::Rgba8)?
		}
		CgType::Webp => WebPEncoder::new_lossless(writer).write_image(
			cg.pixels(),
			width,
			height,
			ExtendedColorType::Rgba8,
		)?,
		_ => return Err(CgError::EncodeUnsupported(kind)),
	}
	Ok(())
}
