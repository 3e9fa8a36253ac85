//! ALD (multi-volume archive) CLI Utility
//!
//! # Features
//!
//! - **info**: Display volume and entry statistics
//! - **list**: List all entries as a table or JSON
//! - **extract**: Extract entries by number, by name, or all of them
//!
//! Volumes are given in order; use `-` for a volume that is not present.
//!
//! # Usage Examples
//!
//! ```bash
//! # Display information about a two-volume archive
//! cargo run --example ald_utils -- info GameCG_A.ald GameCG_B.ald
//!
//! # List entries as JSON, decoding Shift-JIS names
//! cargo run --example ald_utils -- list GameCG_A.ald - GameCG_C.ald --sjis --format json
//!
//! # Extract entry 12 and a named entry
//! cargo run --example ald_utils -- extract GameCG_A.ald -f 12 -f CG0001.QNT -o output/
//! ```

use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use sys4_rs::prelude::*;

#[derive(Parser)]
#[command(name = "ald_utils")]
#[command(author = "sys4-rs project")]
#[command(version)]
#[command(about = "ALD archive utility - inspect, list and extract", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Display archive information and statistics
	Info(ArchiveArgs),

	/// List all entries in the archive
	List {
		#[command(flatten)]
		archive: ArchiveArgs,

		/// Output format
		#[arg(short, long, value_enum, default_value = "table")]
		format: OutputFormat,

		/// Filter by name pattern (case-insensitive)
		#[arg(short = 'p', long, value_name = "PATTERN")]
		filter: Option<String>,
	},

	/// Extract entries from the archive
	Extract {
		#[command(flatten)]
		archive: ArchiveArgs,

		/// Entries to extract (logical numbers or names)
		#[arg(short, long = "file", value_name = "FILE")]
		files: Vec<String>,

		/// Extract all entries
		#[arg(short, long)]
		all: bool,

		/// Output directory
		#[arg(short, long, value_name = "OUTPUT_DIR", default_value = "extracted")]
		output: PathBuf,
	},
}

#[derive(Args)]
struct ArchiveArgs {
	/// Volume files in order; `-` marks a missing volume
	#[arg(value_name = "VOLUMES", required = true)]
	volumes: Vec<String>,

	/// Memory-map the volumes instead of buffered reads
	#[arg(short, long)]
	mmap: bool,

	/// Decode entry names as Shift-JIS
	#[arg(short, long)]
	sjis: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
	Table,
	Json,
}

#[derive(Serialize)]
struct EntryInfo {
	no: usize,
	name: String,
	size: u32,
	volume: usize,
	offset: u64,
}

impl From<&Entry<'_>> for EntryInfo {
	fn from(entry: &Entry<'_>) -> Self {
		Self {
			no: entry.no(),
			name: entry.name().to_string(),
			size: entry.size(),
			volume: entry.location().volume + 1,
			offset: entry.location().offset,
		}
	}
}

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	match cli.command {
		Commands::Info(args) => handle_info(&args),
		Commands::List {
			archive,
			format,
			filter,
		} => handle_list(&archive, format, filter.as_deref()),
		Commands::Extract {
			archive,
			files,
			all,
			output,
		} => handle_extract(&archive, &files, all, &output),
	}
}

fn open(args: &ArchiveArgs) -> Result<AldArchive> {
	let paths: Vec<Option<PathBuf>> =
		args.volumes.iter().map(|v| (v != "-").then(|| PathBuf::from(v))).collect();
	let name_conv: NameConv = if args.sjis {
		sjis_name
	} else {
		identity_name
	};
	OpenOptions::new()
		.mmap(args.mmap)
		.name_conv(name_conv)
		.open(&paths)
		.with_context(|| format!("Failed to open archive {:?}", args.volumes))
}

fn handle_info(args: &ArchiveArgs) -> Result<()> {
	let archive = open(args)?;

	println!("=== Volumes ===");
	for i in 0..archive.volume_count() {
		match (archive.volume_path(i), archive.volume_size(i)) {
			(Some(path), Some(size)) => println!("  {:>3}: {} ({} bytes)", i + 1, path.display(), size),
			_ => println!("  {:>3}: <missing>", i + 1),
		}
	}

	let mut per_volume = vec![(0usize, 0u64); archive.volume_count()];
	let mut count = 0;
	for entry in archive.iter() {
		count += 1;
		if let Some(slot) = per_volume.get_mut(entry.location().volume) {
			slot.0 += 1;
			slot.1 += u64::from(entry.size());
		}
	}

	println!("\n=== Entries ===");
	println!("  Slots:      {}", archive.max_file());
	println!("  Present:    {}", count);
	println!("  Memory-mapped: {}", archive.is_mmapped());
	for (i, (n, bytes)) in per_volume.iter().enumerate().filter(|(_, (n, _))| *n > 0) {
		println!("  Volume {:>3}: {} entries, {} bytes", i + 1, n, bytes);
	}
	Ok(())
}

fn handle_list(args: &ArchiveArgs, format: OutputFormat, filter: Option<&str>) -> Result<()> {
	let archive = open(args)?;

	let pattern = filter.map(str::to_lowercase);
	let entries: Vec<EntryInfo> = archive
		.iter()
		.filter(|e| pattern.as_ref().is_none_or(|p| e.name().to_lowercase().contains(p)))
		.map(|e| EntryInfo::from(&e))
		.collect();

	match format {
		OutputFormat::Table => {
			println!("\n{:>6} | {:32} | {:>10} | {:>3} | {:>10}", "No", "Name", "Size", "Vol", "Offset");
			println!("{:-<6}-+-{:-<32}-+-{:-<10}-+-{:-<3}-+-{:-<10}", "", "", "", "", "");
			for e in &entries {
				println!("{:>6} | {:32} | {:>10} | {:>3} | {:>10}", e.no, e.name, e.size, e.volume, e.offset);
			}
			println!("\nTotal: {} entries", entries.len());
		}
		OutputFormat::Json => {
			println!("{}", serde_json::to_string_pretty(&entries)?);
		}
	}
	Ok(())
}

/// Output file name for an entry; archive names may use `\` separators
fn output_name(entry: &Entry<'_>) -> String {
	let name = entry.name().rsplit(['\\', '/']).next().unwrap_or_default();
	if name.is_empty() {
		format!("{:05}.bin", entry.no())
	} else {
		name.to_string()
	}
}

fn handle_extract(args: &ArchiveArgs, files: &[String], all: bool, output: &PathBuf) -> Result<()> {
	if !all && files.is_empty() {
		bail!("Nothing to extract: pass --all or at least one --file");
	}
	let archive = open(args)?;
	fs::create_dir_all(output)
		.with_context(|| format!("Failed to create output directory {}", output.display()))?;

	let mut extracted = 0;
	let mut write = |entry: &Entry<'_>| -> Result<()> {
		let path = output.join(output_name(entry));
		fs::write(&path, entry.data().unwrap_or_default())
			.with_context(|| format!("Failed to write {}", path.display()))?;
		info!("{:>6} {} -> {}", entry.no(), entry.name(), path.display());
		extracted += 1;
		Ok(())
	};

	if all {
		for mut entry in archive.iter() {
			match entry.load() {
				Ok(()) => write(&entry)?,
				Err(e) => warn!("Skipping {}: {}", entry.no(), e),
			}
		}
	} else {
		for file in files {
			let entry = match file.parse::<usize>() {
				Ok(no) => archive.get(no),
				Err(_) => archive.get_by_name(file),
			};
			match entry {
				Some(entry) => write(&entry)?,
				None => warn!("Entry not found: {}", file),
			}
		}
	}

	println!("Extracted {} entries to {}", extracted, output.display());
	Ok(())
}
