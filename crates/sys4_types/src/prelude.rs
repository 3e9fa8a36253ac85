//! Prelude module for `sys4_types`.
//!
//! This module provides a convenient way to import commonly used types, traits, and constants.
//!
//! # Examples
//!
//! ```no_run
//! use sys4_types::prelude::*;
//!
//! let metrics = cg::get_metrics(&std::fs::read("cg0001.qnt").unwrap()).unwrap();
//! let index = char_to_index(0x82a0);
//! ```

// File module types
#[doc(inline)]
pub use crate::file::{
	// CG types
	Cg,
	CgError,
	CgType,

	// FNL types
	FnlError,
	FnlFace,
	FnlFile,
	FnlFont,
	FnlGlyph,

	Metrics,
	Palette,
};

// Glyph index mapping
#[doc(inline)]
pub use crate::file::fnl::{char_to_index, index_to_char, sjis_code};

// Codec entry points
#[doc(inline)]
pub use crate::file::cg;

// Re-export the file module for advanced usage
#[doc(inline)]
pub use crate::file;
