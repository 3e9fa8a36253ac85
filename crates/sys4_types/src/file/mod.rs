//! File type support for `sys4-rs` project.

mod error;

pub mod cg;
pub mod fnl;
pub mod reader;

// Re-export error types
pub use error::{CgError, FnlError};

// Re-export main file types
pub use cg::{Cg, CgType, Metrics, Palette};
pub use fnl::{Face as FnlFace, File as FnlFile, Font as FnlFont, Glyph as FnlGlyph};
pub use reader::{Reader, ShortRead};
