//! Integration tests for `sys4-rs` file types

use std::{
	fs,
	path::{Path, PathBuf},
};

mod archive;
mod cg;
mod font;

/// Size of an index block
const BLOCK: usize = 0x100;

fn put3(buf: &mut [u8], at: usize, value: usize) {
	buf[at..at + 3].copy_from_slice(&(value as u32).to_le_bytes()[..3]);
}

/// Builds one ALD volume with a one-block pointer map and a one-block file
/// map. `files` are stored in slot order starting at slot 1; `map` holds the
/// `(disk, slot)` record of each logical file, both 1-based.
pub(crate) fn ald_volume(files: &[(&[u8], &[u8])], map: &[(u8, u16)]) -> Vec<u8> {
	let mut out = vec![0u8; BLOCK * 2];
	put3(&mut out, 0, 1);
	put3(&mut out, 3, 2);

	for (i, &(disk, slot)) in map.iter().enumerate() {
		let at = BLOCK + i * 3;
		out[at] = disk;
		out[at + 1..at + 3].copy_from_slice(&slot.to_le_bytes());
	}

	for (k, &(name, payload)) in files.iter().enumerate() {
		let block = out.len() / BLOCK;
		put3(&mut out, 3 + k * 3, block);
		let header_size = (16 + name.len() + 1).next_multiple_of(16);
		out.extend_from_slice(&(header_size as u32).to_le_bytes());
		out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
		out.extend_from_slice(&[0; 8]);
		out.extend_from_slice(name);
		out.resize(out.len() + header_size - 16 - name.len(), 0);
		out.extend_from_slice(payload);
		out.resize(out.len().next_multiple_of(BLOCK), 0);
	}
	let block = out.len() / BLOCK;
	put3(&mut out, 3 + files.len() * 3, block);
	out
}

/// Writes volumes into `dir`, returning their paths
pub(crate) fn write_volumes(dir: &Path, volumes: &[Vec<u8>]) -> Vec<PathBuf> {
	volumes
		.iter()
		.enumerate()
		.map(|(i, bytes)| {
			let path = dir.join(format!("Test{}.ald", (b'A' + i as u8) as char));
			fs::write(&path, bytes).unwrap();
			path
		})
		.collect()
}

/// Builds a single-volume archive where logical file `i` is `files[i]`
pub(crate) fn single_volume(files: &[(&[u8], &[u8])]) -> Vec<u8> {
	let map: Vec<(u8, u16)> = (1..=files.len() as u16).map(|slot| (1, slot)).collect();
	ald_volume(files, &map)
}
