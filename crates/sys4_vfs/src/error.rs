//! Error types for opening and reading archives.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when opening or reading an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
	/// A volume file could not be opened or read
	#[error("Error opening archive volume {}: {source}", path.display())]
	File {
		/// Path of the volume that failed
		path: PathBuf,
		/// Underlying I/O error
		source: std::io::Error,
	},

	/// A volume failed header validation
	#[error("Invalid archive volume {}: {reason}", path.display())]
	BadArchive {
		/// Path of the offending volume
		path: PathBuf,
		/// What was wrong with it
		reason: String,
	},

	/// More volume slots were supplied than the format can address
	#[error("Too many volumes: {count} supplied, at most {max} supported")]
	TooManyVolumes {
		/// Number of volume slots supplied
		count: usize,
		/// Maximum number of volume slots
		max: usize,
	},

	/// An entry extends past the end of its volume
	#[error("Entry out of bounds: needs bytes up to {required}, volume has {available}")]
	OutOfBounds {
		/// End offset required by the entry
		required: u64,
		/// Size of the volume
		available: u64,
	},

	/// IO error while reading an already opened volume
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl ArchiveError {
	/// Returns `true` for errors caused by missing or unreadable files,
	/// as opposed to corrupt data.
	pub fn is_file_error(&self) -> bool {
		matches!(self, ArchiveError::File { .. } | ArchiveError::Io(_))
	}

	pub(crate) fn bad_archive(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
		ArchiveError::BadArchive {
			path: path.into(),
			reason: reason.into(),
		}
	}

	pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		ArchiveError::File {
			path: path.into(),
			source,
		}
	}
}
