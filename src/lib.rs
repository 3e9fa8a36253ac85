#![allow(clippy::single_component_path_imports)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `sys4-rs` reads the data files of System4 visual novel engines: multi-volume
//! ALD archives, the CG image formats stored in them, and FNL font libraries.
//!
//! ```no_run
//! use sys4_rs::prelude::*;
//!
//! let archive = AldArchive::open(&[Some("GameCG_A.ald"), Some("GameCG_B.ald")], true).unwrap();
//! archive.for_each(&mut |entry| {
//!     match cg::load_entry(entry) {
//!         Ok(cg) => println!("{} {} {}x{}", entry.no(), cg.kind(), cg.width(), cg.height()),
//!         Err(e) => eprintln!("{}: {}", entry.name(), e),
//!     }
//! });
//! ```
pub use sys4_internal::*;
