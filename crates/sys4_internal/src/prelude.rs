//! Prelude module for `sys4_internal`.
//!
//! This module provides a convenient way to import commonly used types and traits.
//!
//! # Examples
//!
//! ```no_run
//! use sys4_internal::prelude::*;
//!
//! let archive = OpenOptions::new().mmap(true).open(&[Some("GameCG.ald")]).unwrap();
//! if let Some(entry) = archive.get(0) {
//!     let cg = cg::load_entry(&entry).unwrap();
//!     println!("{}: {}x{}", entry.name(), cg.width(), cg.height());
//! }
//! ```

// Re-export everything from sys4_types::prelude
#[doc(inline)]
pub use sys4_types::prelude::*;

// Archive access
#[doc(inline)]
pub use sys4_vfs::{
	AldArchive, Archive, ArchiveError, Entry, Location, NameConv, OpenOptions, Payload, identity_name,
	normalize_basename, sjis_name,
};

// Re-export the member crates for advanced usage
#[doc(inline)]
pub use sys4_types;
#[doc(inline)]
pub use sys4_vfs;
