//! FNL (font library) CLI Utility
//!
//! # Features
//!
//! - **info**: Show fonts, faces and glyph counts
//! - **glyph**: Render one character as ASCII art or a grayscale PNG
//!
//! # Usage Examples
//!
//! ```bash
//! cargo run --example fnl_utils -- info fonts.fnl
//! cargo run --example fnl_utils -- glyph fonts.fnl あ --height 24
//! cargo run --example fnl_utils -- glyph fonts.fnl A --font 1 -o A.png
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use encoding_rs::SHIFT_JIS;
use sys4_rs::prelude::*;

#[derive(Parser)]
#[command(name = "fnl_utils")]
#[command(author = "sys4-rs project")]
#[command(version)]
#[command(about = "FNL font library utility - inspect and render glyphs", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Show fonts, faces and glyph counts
	Info {
		/// Font library file
		#[arg(value_name = "FILE")]
		file: PathBuf,

		/// Also count glyphs with bitmap data
		#[arg(short, long)]
		detailed: bool,
	},

	/// Render a single character
	Glyph {
		/// Font library file
		#[arg(value_name = "FILE")]
		file: PathBuf,

		/// Character to render
		#[arg(value_name = "CHAR")]
		character: String,

		/// Font index
		#[arg(short, long, default_value_t = 0)]
		font: usize,

		/// Face height in pixels (defaults to the first face)
		#[arg(long)]
		height: Option<u32>,

		/// Write a grayscale PNG instead of printing ASCII art
		#[arg(short, long, value_name = "OUTPUT")]
		output: Option<PathBuf>,
	},
}

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	match cli.command {
		Commands::Info {
			file,
			detailed,
		} => handle_info(&file, detailed),
		Commands::Glyph {
			file,
			character,
			font,
			height,
			output,
		} => handle_glyph(&file, &character, font, height, output.as_deref()),
	}
}

fn open(path: &Path) -> Result<FnlFile> {
	FnlFile::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
	let fnl = open(path)?;

	println!("=== FNL Information ===");
	println!("  File size:   {} bytes (header: {})", fnl.as_bytes().len(), fnl.file_size());
	println!("  Data offset: {:#x}", fnl.data_offset());
	println!("  Fonts:       {}", fnl.fonts().len());

	for (i, font) in fnl.fonts().iter().enumerate() {
		println!("\n  Font {}: {} faces", i, font.faces().len());
		for face in font.faces() {
			print!("    height {:>3}: {:>6} glyphs", face.height(), face.glyphs().len());
			if detailed {
				let present = face.glyphs().iter().filter(|g| g.is_present()).count();
				print!(", {} with data", present);
			}
			println!();
		}
	}
	Ok(())
}

/// Shift-JIS code of the first character of `s`
fn char_code(s: &str) -> Result<u16> {
	let first = s.chars().next().ok_or_else(|| anyhow!("Empty character"))?;
	let mut buf = [0u8; 4];
	let (bytes, _, unmappable) = SHIFT_JIS.encode(first.encode_utf8(&mut buf));
	if unmappable {
		bail!("'{}' has no Shift-JIS encoding", first);
	}
	sjis_code(&bytes).ok_or_else(|| anyhow!("'{}' has no Shift-JIS encoding", first))
}

fn handle_glyph(path: &Path, character: &str, font: usize, height: Option<u32>, output: Option<&Path>) -> Result<()> {
	let fnl = open(path)?;
	let font = fnl.fonts().get(font).ok_or_else(|| anyhow!("No font {}", font))?;
	let face = match height {
		Some(h) => font.face_by_height(h).ok_or_else(|| anyhow!("No face of height {}", h))?,
		None => font.faces().first().ok_or_else(|| anyhow!("Font has no faces"))?,
	};

	let code = char_code(character)?;
	let glyph = face.glyph(code).ok_or_else(|| anyhow!("Face has no glyphs"))?;
	let data = fnl.glyph_data(glyph)?;
	println!(
		"code {:#06x} -> index {}, advance {}, {} bytes",
		code,
		char_to_index(code),
		glyph.real_width(),
		data.len()
	);

	let rows = glyph.height().max(1);
	let width = data.len() as u32 / rows;
	if width == 0 {
		println!("(empty glyph)");
		return Ok(());
	}

	match output {
		Some(output) => {
			let pixels = data[..(width * rows) as usize].to_vec();
			let image = image::GrayImage::from_raw(width, rows, pixels)
				.ok_or_else(|| anyhow!("Glyph buffer does not match {}x{}", width, rows))?;
			image.save(output).with_context(|| format!("Failed to write {}", output.display()))?;
			println!("Wrote {}x{} glyph to {}", width, rows, output.display());
		}
		None => {
			for row in data.chunks_exact(width as usize) {
				let line: String = row
					.iter()
					.map(|&v| match v {
						0..=63 => ' ',
						64..=127 => '.',
						128..=191 => '+',
						_ => '#',
					})
					.collect();
				println!("{}", line);
			}
		}
	}
	Ok(())
}
