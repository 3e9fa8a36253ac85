//! CG (System4 image) CLI Utility
//!
//! # Features
//!
//! - **info**: Show the detected format and header metrics of image files
//! - **convert**: Decode any supported image and write it as PNG, WEBP or QNT
//!
//! # Usage Examples
//!
//! ```bash
//! # Inspect a few files
//! cargo run --example cg_utils -- info CG0001.qnt CG0002.ajp
//!
//! # Convert to PNG
//! cargo run --example cg_utils -- convert CG0001.qnt -o CG0001.png
//!
//! # Convert a DCF, resolving its base image from an archive
//! cargo run --example cg_utils -- convert CG0102.dcf -o CG0102.png --archive GameCG_A.ald
//!
//! # Convert archive entry 12 directly
//! cargo run --example cg_utils -- convert 12 -o out.webp --archive GameCG_A.ald GameCG_B.ald
//! ```

use std::{
	fs,
	io::{BufWriter, Write},
	path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use sys4_rs::prelude::*;

#[derive(Parser)]
#[command(name = "cg_utils")]
#[command(author = "sys4-rs project")]
#[command(version)]
#[command(about = "CG image utility - inspect and convert", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Show format and metrics of image files
	Info {
		/// Image files
		#[arg(value_name = "FILES", required = true)]
		files: Vec<PathBuf>,
	},

	/// Decode an image and write it in another format
	Convert {
		/// Image file, or an entry number when --archive is given
		#[arg(value_name = "INPUT")]
		input: String,

		/// Output file
		#[arg(short, long, value_name = "OUTPUT")]
		output: PathBuf,

		/// Output format (defaults to the output extension)
		#[arg(short, long, value_enum)]
		format: Option<Format>,

		/// Archive volumes used to resolve base images and entry numbers
		#[arg(short, long, value_name = "VOLUMES", num_args = 1..)]
		archive: Vec<PathBuf>,
	},
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
	Png,
	Webp,
	Qnt,
}

impl From<Format> for CgType {
	fn from(format: Format) -> Self {
		match format {
			Format::Png => CgType::Png,
			Format::Webp => CgType::Webp,
			Format::Qnt => CgType::Qnt,
		}
	}
}

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	match cli.command {
		Commands::Info {
			files,
		} => handle_info(&files),
		Commands::Convert {
			input,
			output,
			format,
			archive,
		} => handle_convert(&input, &output, format, &archive),
	}
}

fn print_metrics(kind: CgType, m: &Metrics) {
	println!("  Type:        {}", kind);
	println!("  Size:        {}x{}", m.width, m.height);
	println!("  Offset:      ({}, {})", m.x, m.y);
	println!("  BPP:         {}", m.bpp);
	println!("  Has pixel:   {}", m.has_pixel);
	println!("  Has alpha:   {}", m.has_alpha);
	println!("  Pixel pitch: {}", m.pixel_pitch);
}

fn handle_info(files: &[PathBuf]) -> Result<()> {
	for path in files {
		let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
		let kind = cg::check_format(&data);
		println!("{}:", path.display());
		match cg::get_metrics(&data) {
			Ok(metrics) => print_metrics(kind, &metrics),
			Err(CgError::MetricsUnimplemented(_)) => {
				// fall back to a full decode
				let cg = cg::load_buffer(&data)?;
				print_metrics(kind, cg.metrics());
			}
			Err(e) => println!("  Error: {}", e),
		}
	}
	Ok(())
}

fn output_format(output: &Path, format: Option<Format>) -> Result<CgType> {
	if let Some(format) = format {
		return Ok(format.into());
	}
	let ext = output.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
	Ok(match ext.as_deref() {
		Some("png") => CgType::Png,
		Some("webp") => CgType::Webp,
		Some("qnt") => CgType::Qnt,
		_ => bail!("Cannot infer output format from {}; pass --format", output.display()),
	})
}

fn handle_convert(input: &str, output: &Path, format: Option<Format>, volumes: &[PathBuf]) -> Result<()> {
	let kind = output_format(output, format)?;

	let archive = if volumes.is_empty() {
		None
	} else {
		let paths: Vec<Option<&PathBuf>> = volumes.iter().map(Some).collect();
		Some(AldArchive::open(&paths, true).context("Failed to open archive")?)
	};

	let cg = match (&archive, input.parse::<usize>()) {
		(Some(archive), Ok(no)) => cg::load(archive, no)?,
		(archive, _) => {
			let data = fs::read(input).with_context(|| format!("Failed to read {}", input))?;
			cg::extract(&data, archive.as_ref().map(|a| a as &dyn Archive))?
		}
	};
	info!("Decoded {} {}x{}", cg.kind(), cg.width(), cg.height());

	let file = fs::File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
	let mut writer = BufWriter::new(file);
	cg::write(&cg, kind, &mut writer)?;
	writer.flush()?;
	println!("Wrote {} as {}", output.display(), kind);
	Ok(())
}
