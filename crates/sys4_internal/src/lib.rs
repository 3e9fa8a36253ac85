//! This module is separated into its own crate to keep the facade thin, and should not be used directly.

/// `use sys4_rs::prelude::*;` to import commonly used items.
pub mod prelude;

// Re-export member crates for convenience
pub use sys4_types;
pub use sys4_vfs;

// Re-export commonly used types at crate root
pub use sys4_types::file::{Cg, CgError, CgType, FnlError, FnlFile, Metrics, cg};
pub use sys4_vfs::{AldArchive, Archive, ArchiveError, Entry, OpenOptions, Payload};
