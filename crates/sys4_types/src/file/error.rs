//! Error types for image and font decoding.

use thiserror::Error;

use super::{cg::CgType, reader::ShortRead};

/// Errors that can occur when identifying, decoding or encoding CG images
#[derive(Debug, Error)]
pub enum CgError {
	/// No known signature matched
	#[error("Unknown CG format")]
	UnknownFormat,

	/// The format is recognized but has no header-only metrics path
	#[error("{0} metrics are not implemented")]
	MetricsUnimplemented(CgType),

	/// The format cannot be written
	#[error("Encoding is not supported for {0}")]
	EncodeUnsupported(CgType),

	/// The archive has no loadable entry with this number
	#[error("CG {no} not found in archive")]
	NotFound {
		/// Logical file number that was requested
		no: usize,
	},

	/// Not enough data to parse
	#[error("Insufficient data: expected {expected} bytes, got {actual} bytes")]
	InsufficientData {
		/// Expected number of bytes
		expected: usize,
		/// Actual number of bytes
		actual: usize,
	},

	/// A section did not start with its magic bytes
	#[error("Invalid magic: expected {expected:02X?}, got {actual:02X?}")]
	InvalidMagic {
		/// Expected magic bytes
		expected: [u8; 4],
		/// Actual bytes found
		actual: [u8; 4],
	},

	/// Structurally invalid data
	#[error("Malformed {format} data: {reason}")]
	Malformed {
		/// Format being decoded
		format: CgType,
		/// What was wrong
		reason: String,
	},

	/// Valid data using a feature this decoder does not handle
	#[error("Unsupported {format} data: {reason}")]
	Unsupported {
		/// Format being decoded
		format: CgType,
		/// The unsupported feature
		reason: String,
	},

	/// A zlib stream failed to inflate
	#[error("Decompression failed: {source}")]
	Decompress {
		/// Underlying inflate error
		source: std::io::Error,
	},

	/// Nested loads (base images, embedded images) went too deep
	#[error("Nested CG loads exceeded depth {0}")]
	RecursionLimit(usize),

	/// The archive failed to read a payload
	#[error(transparent)]
	Archive(#[from] sys4_vfs::ArchiveError),

	/// Error from the standard-format codecs
	#[error(transparent)]
	Image(#[from] image::ImageError),

	/// IO error
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl CgError {
	pub(crate) fn malformed(format: CgType, reason: impl Into<String>) -> Self {
		CgError::Malformed {
			format,
			reason: reason.into(),
		}
	}

	pub(crate) fn unsupported(format: CgType, reason: impl Into<String>) -> Self {
		CgError::Unsupported {
			format,
			reason: reason.into(),
		}
	}
}

impl From<ShortRead> for CgError {
	fn from(e: ShortRead) -> Self {
		CgError::InsufficientData {
			expected: e.expected,
			actual: e.actual,
		}
	}
}

/// Errors that can occur when parsing FNL font containers
#[derive(Debug, Error)]
pub enum FnlError {
	/// Missing `FNA\0` signature
	#[error("Invalid magic number: {0:02X?}")]
	InvalidMagic([u8; 4]),

	/// Not enough data to parse
	#[error("Insufficient data: expected {expected} bytes, got {actual} bytes")]
	InsufficientData {
		/// Expected number of bytes
		expected: usize,
		/// Actual number of bytes
		actual: usize,
	},

	/// A glyph's compressed data lies outside the file
	#[error("Glyph data out of bounds: {offset}+{size} exceeds {available} bytes")]
	GlyphOverflow {
		/// Offset of the compressed data
		offset: u32,
		/// Size of the compressed data
		size: u32,
		/// Size of the font file
		available: usize,
	},

	/// Glyph bitmap failed to inflate
	#[error("Glyph inflate failed: {status}")]
	Inflate {
		/// Status reported by the decompressor
		status: String,
	},

	/// IO error
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl From<ShortRead> for FnlError {
	fn from(e: ShortRead) -> Self {
		FnlError::InsufficientData {
			expected: e.expected,
			actual: e.actual,
		}
	}
}
