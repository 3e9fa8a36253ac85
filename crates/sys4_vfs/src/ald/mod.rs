//! Multi-disk container (`.ald`) support.
//!
//! One logical archive is split across up to [`MAX_VOLUMES`] numbered volume
//! files. The first present volume carries the file map that translates a
//! logical file number into a `(disk, slot)` pair; every volume carries its own
//! pointer map that translates a slot into the byte offset of the entry header.
//!
//! Entry layout at the resolved offset:
//!
//! ```text
//! [4B header_size][4B payload_size][8B reserved][name, NUL padded][payload...]
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use sys4_vfs::{Archive, ald::OpenOptions, sjis_name};
//!
//! let archive = OpenOptions::new()
//! 	.mmap(true)
//! 	.name_conv(sjis_name)
//! 	.open(&[Some("GameCA.ald"), Some("GameCB.ald")])?;
//!
//! if let Some(entry) = archive.get(3) {
//! 	println!("{}: {} bytes", entry.name(), entry.size());
//! }
//! # Ok::<(), sys4_vfs::ArchiveError>(())
//! ```

pub mod index;
mod volume;

use std::{fmt, io, path::Path};

use log::{debug, warn};

use crate::{
	archive::{Archive, Entry, Location, NameConv, Payload, identity_name},
	error::ArchiveError,
};
use index::FileMap;
use volume::Volume;

/// Maximum number of volume slots a container can address
pub const MAX_VOLUMES: usize = 255;

/// Minimum entry header size: two length fields plus 8 reserved bytes
const ENTRY_HEADER_MIN: u32 = 16;

/// Options for opening a multi-disk container
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
	mmap: bool,
	name_conv: NameConv,
}

impl Default for OpenOptions {
	fn default() -> Self {
		Self {
			mmap: false,
			name_conv: identity_name,
		}
	}
}

impl OpenOptions {
	/// Buffered I/O with identity name conversion
	pub fn new() -> Self {
		Self::default()
	}

	/// Selects memory-mapped I/O. Ignored on targets without mmap support.
	pub fn mmap(mut self, mmap: bool) -> Self {
		self.mmap = mmap;
		self
	}

	/// Sets the converter applied to stored entry names
	pub fn name_conv(mut self, name_conv: NameConv) -> Self {
		self.name_conv = name_conv;
		self
	}

	/// Opens a container from its volume paths.
	///
	/// `paths[i]` is volume `i`; `None` leaves that slot unused. Any volume
	/// that fails to open or validate aborts the whole open.
	pub fn open<P: AsRef<Path>>(&self, paths: &[Option<P>]) -> Result<AldArchive, ArchiveError> {
		if paths.len() > MAX_VOLUMES {
			return Err(ArchiveError::TooManyVolumes {
				count: paths.len(),
				max: MAX_VOLUMES,
			});
		}

		let mut volumes = Vec::with_capacity(paths.len());
		let mut files = None;
		for path in paths {
			let Some(path) = path else {
				volumes.push(None);
				continue;
			};
			let volume = Volume::open(path.as_ref(), self.mmap)?;
			if files.is_none() {
				let header = volume.header();
				let raw = volume.read_padded(header.map_offset(), header.map_len())?;
				files = Some(FileMap::parse(&raw));
			}
			volumes.push(Some(volume));
		}

		let files = files.unwrap_or_default();
		debug!("Opened archive: {} volume slots, {} files", volumes.len(), files.len());

		Ok(AldArchive {
			volumes,
			files,
			name_conv: self.name_conv,
			mmap: self.mmap && cfg!(not(target_family = "wasm")),
		})
	}
}

/// An opened multi-disk container
pub struct AldArchive {
	volumes: Vec<Option<Volume>>,
	files: FileMap,
	name_conv: NameConv,
	mmap: bool,
}

impl AldArchive {
	/// Opens a container with default options and the given I/O mode
	pub fn open<P: AsRef<Path>>(paths: &[Option<P>], mmap: bool) -> Result<Self, ArchiveError> {
		OpenOptions::new().mmap(mmap).open(paths)
	}

	/// Number of volume slots, present or not
	pub fn volume_count(&self) -> usize {
		self.volumes.len()
	}

	/// Path of volume `index`, if that slot is present
	pub fn volume_path(&self, index: usize) -> Option<&Path> {
		self.volume(index).map(Volume::path)
	}

	/// Size in bytes of volume `index`, if that slot is present
	pub fn volume_size(&self, index: usize) -> Option<u64> {
		self.volume(index).map(Volume::len)
	}

	/// Iterates over present entries in ascending logical order, unloaded
	pub fn iter(&self) -> impl Iterator<Item = Entry<'_>> + '_ {
		(0..self.files.len()).filter_map(move |no| self.descriptor(no))
	}

	fn volume(&self, index: usize) -> Option<&Volume> {
		self.volumes.get(index).and_then(Option::as_ref)
	}

	/// Resolves `no` to its volume index and header offset
	fn resolve(&self, no: usize) -> Option<(usize, u64)> {
		let entry = self.files.get(no)?;
		let disk = entry.disk?;
		let slot = entry.slot?;
		let (start, _end) = self.volume(disk)?.pointers().span(slot)?;
		Some((disk, start))
	}

	fn read_descriptor(&self, no: usize) -> Result<Option<Entry<'_>>, ArchiveError> {
		let Some((disk, start)) = self.resolve(no) else {
			return Ok(None);
		};
		let Some(volume) = self.volume(disk) else {
			return Ok(None);
		};

		let head = volume.read_at(start, 8)?;
		let header_size = u32::from_le_bytes([head[0], head[1], head[2], head[3]]);
		let size = u32::from_le_bytes([head[4], head[5], head[6], head[7]]);
		if header_size < ENTRY_HEADER_MIN {
			warn!("Entry {} has a truncated header ({} bytes)", no, header_size);
			return Ok(None);
		}

		let raw_name = volume.read_at(
			start + u64::from(ENTRY_HEADER_MIN),
			(header_size - ENTRY_HEADER_MIN) as usize,
		)?;
		let location = Location {
			volume: disk,
			offset: start,
			header_size,
		};
		Ok(Some(Entry::new(self, no, (self.name_conv)(&raw_name), size, location)))
	}
}

impl Archive for AldArchive {
	fn is_mmapped(&self) -> bool {
		self.mmap
	}

	fn conv_name(&self, raw: &[u8]) -> String {
		(self.name_conv)(raw)
	}

	fn max_file(&self) -> usize {
		self.files.len()
	}

	fn exists(&self, no: usize) -> bool {
		self.resolve(no).is_some()
	}

	fn descriptor(&self, no: usize) -> Option<Entry<'_>> {
		match self.read_descriptor(no) {
			Ok(entry) => entry,
			Err(e) => {
				warn!("Failed to read header of entry {}: {}", no, e);
				None
			}
		}
	}

	fn load_file<'a>(&'a self, entry: &mut Entry<'a>) -> Result<(), ArchiveError> {
		let location = entry.location();
		let volume = self.volume(location.volume).ok_or_else(|| {
			io::Error::new(io::ErrorKind::NotFound, format!("volume {} is not open", location.volume))
		})?;

		let len = entry.size() as usize;
		let payload = match volume.slice(location.data_offset(), len)? {
			Some(data) => Payload::Mapped(data),
			None => Payload::Owned(volume.read_at(location.data_offset(), len)?),
		};
		entry.set_payload(payload);
		Ok(())
	}
}

impl fmt::Debug for AldArchive {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let volumes: Vec<_> =
			self.volumes.iter().map(|v| v.as_ref().map(|v| v.path().display().to_string())).collect();
		f.debug_struct("AldArchive")
			.field("volumes", &volumes)
			.field("files", &self.files.len())
			.field("mmap", &self.mmap)
			.finish()
	}
}
