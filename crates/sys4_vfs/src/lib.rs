//! Virtual file system layer for System4 game data.
//!
//! The [`Archive`] trait is the interface every container format implements;
//! consumers only ever depend on it. [`ald`] provides the multi-disk container
//! used for the bulk of a game's images, sounds and scripts.
//!
//! # Examples
//!
//! ```no_run
//! use sys4_vfs::{AldArchive, Archive};
//!
//! let archive = AldArchive::open(&[Some("GameCA.ald")], false)?;
//! archive.for_each(&mut |entry| println!("{:5} {}", entry.no(), entry.name()));
//! # Ok::<(), sys4_vfs::ArchiveError>(())
//! ```

pub mod ald;
pub mod archive;
mod error;

pub use ald::{AldArchive, MAX_VOLUMES, OpenOptions};
pub use archive::{
	Archive, Entry, Location, NameConv, Payload, identity_name, normalize_basename, sjis_name,
};
pub use error::ArchiveError;
