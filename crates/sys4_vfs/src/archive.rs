//! The archive interface shared by every container format.
//!
//! An [`Archive`] resolves logical file numbers (and names) into [`Entry`]
//! descriptors. A descriptor knows where its payload lives but does not
//! necessarily hold it; [`Entry::load`] performs the deferred read.
//!
//! Payload ownership follows the archive's I/O mode. A memory-mapped archive
//! hands out [`Payload::Mapped`] slices that borrow the mapping, so they can
//! never outlive the archive. A buffered archive hands out
//! [`Payload::Owned`] buffers that are dropped together with the entry.

use std::{fmt, ops::Deref};

use log::warn;

use crate::error::ArchiveError;

/// Converts a raw, NUL-padded name stored in an archive into a `String`
pub type NameConv = fn(&[u8]) -> String;

/// Default name conversion: bytes up to the first NUL, decoded as (lossy) UTF-8.
pub fn identity_name(raw: &[u8]) -> String {
	String::from_utf8_lossy(trim_nul(raw)).into_owned()
}

/// Decodes a Shift-JIS name (up to the first NUL) into UTF-8.
pub fn sjis_name(raw: &[u8]) -> String {
	let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(trim_nul(raw));
	decoded.into_owned()
}

fn trim_nul(raw: &[u8]) -> &[u8] {
	let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
	&raw[..end]
}

/// Strips the extension from `name` and normalizes it for case-insensitive
/// comparison (ASCII upper-case, `/` folded into `\`).
pub fn normalize_basename(name: &str) -> String {
	let stem = match name.rfind('.') {
		Some(dot) => &name[..dot],
		None => name,
	};
	stem.chars()
		.map(|c| {
			if c == '/' {
				'\\'
			} else {
				c.to_ascii_uppercase()
			}
		})
		.collect()
}

/// Payload bytes of a loaded entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<'a> {
	/// Zero-copy view into a memory-mapped volume
	Mapped(&'a [u8]),

	/// Buffer read from a volume, owned by the entry
	Owned(Vec<u8>),
}

impl Payload<'_> {
	/// Returns `true` if the payload aliases archive-owned memory
	pub fn is_mapped(&self) -> bool {
		matches!(self, Payload::Mapped(_))
	}

	/// Converts the payload into an owned buffer, copying if it is mapped
	pub fn into_owned(self) -> Vec<u8> {
		match self {
			Payload::Mapped(data) => data.to_vec(),
			Payload::Owned(data) => data,
		}
	}
}

impl Deref for Payload<'_> {
	type Target = [u8];

	fn deref(&self) -> &[u8] {
		match self {
			Payload::Mapped(data) => data,
			Payload::Owned(data) => data,
		}
	}
}

impl AsRef<[u8]> for Payload<'_> {
	fn as_ref(&self) -> &[u8] {
		self
	}
}

/// Physical location of an entry, as resolved by its archive
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
	/// Index of the volume holding the entry
	pub volume: usize,

	/// Byte offset of the entry header within the volume
	pub offset: u64,

	/// Size of the entry header; the payload starts at `offset + header_size`
	pub header_size: u32,
}

impl Location {
	/// Byte offset of the first payload byte
	pub fn data_offset(&self) -> u64 {
		self.offset + u64::from(self.header_size)
	}
}

/// Descriptor for one logical entry of an archive
///
/// Dropping an entry releases its name and, when owned, its payload.
pub struct Entry<'a> {
	archive: &'a dyn Archive,
	no: usize,
	name: String,
	size: u32,
	location: Location,
	payload: Option<Payload<'a>>,
}

impl<'a> Entry<'a> {
	/// Creates an unloaded descriptor. Used by archive implementations.
	pub fn new(
		archive: &'a dyn Archive,
		no: usize,
		name: String,
		size: u32,
		location: Location,
	) -> Self {
		Self {
			archive,
			no,
			name,
			size,
			location,
			payload: None,
		}
	}

	/// Returns the archive this entry belongs to
	pub fn archive(&self) -> &'a dyn Archive {
		self.archive
	}

	/// Returns the logical file number
	pub fn no(&self) -> usize {
		self.no
	}

	/// Returns the decoded entry name
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the payload size in bytes, as recorded in the entry header
	pub fn size(&self) -> u32 {
		self.size
	}

	/// Returns the resolved physical location
	pub fn location(&self) -> Location {
		self.location
	}

	/// Returns `true` once the payload has been read
	pub fn is_loaded(&self) -> bool {
		self.payload.is_some()
	}

	/// Returns the payload bytes, if loaded
	pub fn data(&self) -> Option<&[u8]> {
		self.payload.as_deref()
	}

	/// Returns the payload, if loaded
	pub fn payload(&self) -> Option<&Payload<'a>> {
		self.payload.as_ref()
	}

	/// Attaches a payload. Used by archive implementations.
	pub fn set_payload(&mut self, payload: Payload<'a>) {
		self.payload = Some(payload);
	}

	/// Detaches and returns the payload, leaving the entry unloaded
	pub fn take_payload(&mut self) -> Option<Payload<'a>> {
		self.payload.take()
	}

	/// Reads the payload through the owning archive
	pub fn load(&mut self) -> Result<(), ArchiveError> {
		let archive = self.archive;
		archive.load_file(self)
	}

	/// Drops the payload through the owning archive
	pub fn release(&mut self) {
		let archive = self.archive;
		archive.release_file(self);
	}

	/// Duplicates the location metadata into a new, unloaded entry
	pub fn copy_descriptor(&self) -> Entry<'a> {
		self.archive.copy_descriptor(self)
	}
}

impl fmt::Debug for Entry<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Entry")
			.field("no", &self.no)
			.field("name", &self.name)
			.field("size", &self.size)
			.field("location", &self.location)
			.field("loaded", &self.payload.as_ref().map(Payload::is_mapped))
			.finish()
	}
}

impl fmt::Display for Entry<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Entry {{ no: {}, name: '{}', size: {} }}", self.no, self.name, self.size)
	}
}

/// Operations every container format provides.
///
/// Implementors supply resolution ([`Archive::descriptor`]) and payload reads
/// ([`Archive::load_file`]); lookup by name, iteration and eager fetches are
/// derived from those two. Logical numbers are scanned in ascending order
/// from `0` to [`Archive::max_file`].
pub trait Archive: Send + Sync {
	/// Returns `true` if payloads alias memory-mapped volumes
	fn is_mmapped(&self) -> bool;

	/// Converts a raw stored name with the archive's name converter
	fn conv_name(&self, raw: &[u8]) -> String {
		identity_name(raw)
	}

	/// Upper bound (exclusive) on logical file numbers
	fn max_file(&self) -> usize;

	/// Returns `true` if `no` resolves to a present, non-empty entry.
	/// Never reads payload data.
	fn exists(&self, no: usize) -> bool;

	/// Resolves `no` into an unloaded descriptor
	fn descriptor(&self, no: usize) -> Option<Entry<'_>>;

	/// Reads the payload for a descriptor obtained from this archive
	fn load_file<'a>(&'a self, entry: &mut Entry<'a>) -> Result<(), ArchiveError>;

	/// Drops a loaded payload; the descriptor may be loaded again afterwards
	fn release_file(&self, entry: &mut Entry<'_>) {
		entry.take_payload();
	}

	/// Duplicates a descriptor so it can be loaded and dropped independently
	fn copy_descriptor<'a>(&self, entry: &Entry<'a>) -> Entry<'a> {
		Entry::new(
			entry.archive(),
			entry.no(),
			entry.name().to_owned(),
			entry.size(),
			entry.location(),
		)
	}

	/// Resolves `no` and loads its payload
	fn get(&self, no: usize) -> Option<Entry<'_>> {
		let mut entry = self.descriptor(no)?;
		match self.load_file(&mut entry) {
			Ok(()) => Some(entry),
			Err(e) => {
				warn!("Failed to load entry {}: {}", no, e);
				None
			}
		}
	}

	/// Returns the first entry named `name`, with its payload loaded
	fn get_by_name(&self, name: &str) -> Option<Entry<'_>> {
		let mut entry =
			(0..self.max_file()).filter_map(|no| self.descriptor(no)).find(|e| e.name() == name)?;
		match self.load_file(&mut entry) {
			Ok(()) => Some(entry),
			Err(e) => {
				warn!("Failed to load entry '{}': {}", name, e);
				None
			}
		}
	}

	/// Returns `true` if any present entry is named `name`
	fn exists_by_name(&self, name: &str) -> bool {
		(0..self.max_file()).filter_map(|no| self.descriptor(no)).any(|e| e.name() == name)
	}

	/// Returns the first entry whose name matches `name` once both have their
	/// extension stripped and are normalized, with its payload loaded
	fn get_by_basename(&self, name: &str) -> Option<Entry<'_>> {
		let wanted = normalize_basename(name);
		let mut entry = (0..self.max_file())
			.filter_map(|no| self.descriptor(no))
			.find(|e| normalize_basename(e.name()) == wanted)?;
		match self.load_file(&mut entry) {
			Ok(()) => Some(entry),
			Err(e) => {
				warn!("Failed to load entry '{}': {}", name, e);
				None
			}
		}
	}

	/// Calls `f` once per present entry in ascending logical order.
	/// Entries are passed unloaded and dropped when `f` returns; use
	/// [`Entry::copy_descriptor`] to keep one.
	fn for_each<'a>(&'a self, f: &mut dyn FnMut(&mut Entry<'a>)) {
		for no in 0..self.max_file() {
			if let Some(mut entry) = self.descriptor(no) {
				f(&mut entry);
			}
		}
	}
}
