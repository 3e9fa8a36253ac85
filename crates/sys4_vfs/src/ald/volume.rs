//! One physical volume of a multi-disk container.

use std::{
	fs,
	io::{self, Read, Seek, SeekFrom},
	path::{Path, PathBuf},
};

use log::debug;
use parking_lot::Mutex;

use super::index::{Header, PointerMap};
use crate::error::ArchiveError;

/// How a volume's bytes are reached
enum Backing {
	/// Whole volume mapped read-only
	#[cfg(not(target_family = "wasm"))]
	Mapped(memmap2::Mmap),

	/// Open file handle; seek and read happen under the lock
	File(Mutex<fs::File>),
}

/// An opened and validated volume
pub(crate) struct Volume {
	path: PathBuf,
	len: u64,
	header: Header,
	backing: Backing,
	pointers: PointerMap,
}

impl Volume {
	/// Opens `path`, validates its header and loads its pointer map
	pub fn open(path: &Path, mmap: bool) -> Result<Self, ArchiveError> {
		let mut file = fs::File::open(path).map_err(|e| ArchiveError::file(path, e))?;
		let len = file.metadata().map_err(|e| ArchiveError::file(path, e))?.len();

		let mut raw = [0u8; Header::SIZE];
		if let Err(e) = file.read_exact(&mut raw) {
			return Err(if e.kind() == io::ErrorKind::UnexpectedEof {
				ArchiveError::bad_archive(path, "volume too short for header")
			} else {
				ArchiveError::file(path, e)
			});
		}
		let header = Header::parse(&raw, len).map_err(|reason| ArchiveError::bad_archive(path, reason))?;
		debug!(
			"Opened volume {}: {} bytes, ptr_blocks={}, map_blocks={}",
			path.display(),
			len,
			header.ptr_blocks,
			header.map_blocks
		);

		let backing = Backing::new(file, path, mmap)?;
		let mut volume = Self {
			path: path.to_path_buf(),
			len,
			header,
			backing,
			pointers: PointerMap::default(),
		};
		let raw_pointers = volume.read_padded(0, header.ptr_len())?;
		volume.pointers = PointerMap::parse(&raw_pointers);

		Ok(volume)
	}

	/// Path the volume was opened from
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Size of the volume file in bytes
	pub fn len(&self) -> u64 {
		self.len
	}

	/// Validated volume header
	pub fn header(&self) -> Header {
		self.header
	}

	/// Slot offsets of this volume
	pub fn pointers(&self) -> &PointerMap {
		&self.pointers
	}

	/// Borrows `len` bytes at `offset` from the mapping, if mapped
	pub fn slice(&self, offset: u64, len: usize) -> Result<Option<&[u8]>, ArchiveError> {
		match &self.backing {
			#[cfg(not(target_family = "wasm"))]
			Backing::Mapped(map) => {
				let (start, end) = self.bounds(offset, len)?;
				Ok(Some(&map[start..end]))
			}
			Backing::File(_) => Ok(None),
		}
	}

	/// Copies exactly `len` bytes at `offset`
	pub fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, ArchiveError> {
		let (start, end) = self.bounds(offset, len)?;
		match &self.backing {
			#[cfg(not(target_family = "wasm"))]
			Backing::Mapped(map) => Ok(map[start..end].to_vec()),
			Backing::File(file) => {
				let mut buf = vec![0u8; len];
				let mut file = file.lock();
				file.seek(SeekFrom::Start(offset))?;
				file.read_exact(&mut buf)?;
				Ok(buf)
			}
		}
	}

	/// Reads up to `len` bytes at `offset`, zero-filling whatever lies past
	/// the end of the volume
	pub fn read_padded(&self, offset: u64, len: u64) -> Result<Vec<u8>, ArchiveError> {
		let available = self.len.saturating_sub(offset).min(len);
		let mut buf = if available > 0 {
			self.read_at(offset, available as usize)?
		} else {
			Vec::new()
		};
		buf.resize(len as usize, 0);
		Ok(buf)
	}

	fn bounds(&self, offset: u64, len: usize) -> Result<(usize, usize), ArchiveError> {
		let end = offset.checked_add(len as u64).filter(|&end| end <= self.len).ok_or(
			ArchiveError::OutOfBounds {
				required: offset.saturating_add(len as u64),
				available: self.len,
			},
		)?;
		Ok((offset as usize, end as usize))
	}
}

impl Backing {
	#[cfg(not(target_family = "wasm"))]
	fn new(file: fs::File, path: &Path, mmap: bool) -> Result<Self, ArchiveError> {
		if !mmap {
			return Ok(Backing::File(Mutex::new(file)));
		}
		// SAFETY: the mapping is read-only and volumes are treated as immutable
		// for the lifetime of the archive.
		#[allow(unsafe_code)]
		let map = unsafe { memmap2::MmapOptions::new().map(&file) }
			.map_err(|e| ArchiveError::file(path, e))?;
		Ok(Backing::Mapped(map))
	}

	#[cfg(target_family = "wasm")]
	fn new(file: fs::File, _path: &Path, _mmap: bool) -> Result<Self, ArchiveError> {
		Ok(Backing::File(Mutex::new(file)))
	}
}
