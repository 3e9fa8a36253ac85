//! WEBP images, optionally overlaid on a base image from the same archive.
//!
//! An overlay carries an `OVER` trailer naming the base by its 1-based
//! archive number; pixels of the overlay that are exactly magenta
//! (255, 0, 255) show the base through.

use log::warn;

use super::{Cg, CgType, Loader, Metrics, standard};
use crate::file::{CgError, reader::le32_at};

const TRANSPARENT: [u8; 3] = [0xff, 0x00, 0xff];

pub(super) fn check(data: &[u8]) -> bool {
	data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

pub(super) fn metrics(data: &[u8]) -> Result<Metrics, CgError> {
	let (width, height, _) = standard::info(data, CgType::Webp)?;
	Ok(metrics_for(width, height))
}

/// Finds the `OVER` trailer and returns the base image number it names
fn overlay_base(data: &[u8]) -> Option<i32> {
	let len = data.len();
	let at = [(20, 12), (32, 24)]
		.into_iter()
		.find(|&(min, back)| len >= min && &data[len - back..len - back + 4] == b"OVER")
		.map(|(_, back)| len - back)?;

	let size = le32_at(data, at + 4).ok()?;
	if size != 4 {
		warn!("Unexpected WEBP OVER chunk size: {}", size);
	}
	le32_at(data, at + 8).ok().map(|base| base as i32)
}

fn composite(cg: &mut Cg, base: &Cg) {
	for (px, bp) in cg.pixels.chunks_exact_mut(4).zip(base.pixels().chunks_exact(4)) {
		if px[..3] == TRANSPARENT {
			px.copy_from_slice(bp);
		}
	}
}

pub(super) fn extract(data: &[u8], loader: &Loader<'_>) -> Result<Cg, CgError> {
	let (image, _) = standard::decode_rgba(data, CgType::Webp)?;
	let (width, height) = image.dimensions();
	let mut cg = Cg::from_rgba(CgType::Webp, metrics_for(width, height), image.into_raw())?;

	let Some(archive) = loader.archive() else {
		return Ok(cg);
	};
	let Some(base_no) = overlay_base(data) else {
		return Ok(cg);
	};
	if base_no <= 0 {
		if base_no == 0 {
			warn!("WEBP overlay names no base image");
		}
		return Ok(cg);
	}

	let Some(entry) = archive.get(base_no as usize - 1) else {
		warn!("Failed to load WEBP base CG {}", base_no);
		return Ok(cg);
	};
	let base = match loader.extract_entry(&entry) {
		Ok(base) => base,
		Err(e @ CgError::RecursionLimit(_)) => return Err(e),
		Err(e) => {
			warn!("Failed to decode WEBP base CG {}: {}", base_no, e);
			return Ok(cg);
		}
	};

	if (base.width(), base.height()) != (width, height) {
		warn!(
			"WEBP base CG {} is {}x{}, overlay is {}x{}",
			base_no,
			base.width(),
			base.height(),
			width,
			height
		);
		return Ok(cg);
	}
	composite(&mut cg, &base);
	Ok(cg)
}

fn metrics_for(width: u32, height: u32) -> Metrics {
	Metrics {
		width,
		height,
		bpp: 24,
		has_pixel: true,
		has_alpha: true,
		pixel_pitch: width * 3,
		alpha_pitch: 1,
		..Default::default()
	}
}
