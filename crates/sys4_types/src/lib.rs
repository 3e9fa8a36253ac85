//! This crate provides image and font format support for the `sys4-rs` project.
//!
//! # File Formats
//!
//! - **CG**: Images stored in System4 archives. QNT, AJP, PMS (8 and 16 bit),
//!   DCF and PCF are decoded natively; PNG, JPEG, BMP and WEBP go through the
//!   `image` codecs. Every decoder produces RGBA8 pixels.
//! - **FNL**: Font libraries holding zlib-compressed glyph bitmaps addressed by
//!   Shift-JIS code order.
//!
//! # Examples
//!
//! Using the prelude (recommended):
//!
//! ```no_run
//! use sys4_types::prelude::*;
//!
//! let data = std::fs::read("cg0001.qnt").unwrap();
//! let cg = cg::load_buffer(&data).unwrap();
//! println!("{} {}x{}", cg.kind(), cg.width(), cg.height());
//!
//! let font = FnlFile::open("fonts.fnl").unwrap();
//! let face = &font.fonts()[0].faces()[0];
//! let glyph = face.glyph(u16::from(b'A')).unwrap();
//! let bitmap = font.glyph_data(glyph).unwrap();
//! ```

pub mod file;

/// `use sys4_types::prelude::*;` to import commonly used items.
pub mod prelude;
