//! multi-volume archive tests

use std::path::PathBuf;

use sys4_rs::prelude::*;

use crate::{ald_volume, write_volumes};

/// Volume 1 holds the maps and entry #3, volume 2 holds entry #7
fn two_volumes() -> (tempfile::TempDir, Vec<PathBuf>) {
	let mut map = vec![(0u8, 0u16); 8];
	map[3] = (1, 1);
	map[7] = (2, 1);
	let a = ald_volume(&[(b"A.QNT", b"hello")], &map);
	let b = ald_volume(&[(b"B.PNG", &[0x89, b'P', b'N', b'G'])], &map);

	let dir = tempfile::tempdir().unwrap();
	let paths = write_volumes(dir.path(), &[a, b]);
	(dir, paths)
}

fn open(paths: &[PathBuf], mmap: bool) -> AldArchive {
	let paths: Vec<Option<&PathBuf>> = paths.iter().map(Some).collect();
	AldArchive::open(&paths, mmap).unwrap()
}

#[test]
fn test_two_volume_resolution() {
	let (_dir, paths) = two_volumes();
	for mmap in [false, true] {
		let archive = open(&paths, mmap);
		assert_eq!(archive.volume_count(), 2);

		let entry = archive.get(3).unwrap();
		assert_eq!(entry.no(), 3);
		assert_eq!(entry.name(), "A.QNT");
		assert_eq!(entry.size(), 5);
		assert_eq!(entry.data(), Some(&b"hello"[..]));
		assert_eq!(entry.location().volume, 0);

		assert!(archive.get(2).is_none());
		assert!(!archive.exists(2));
		assert!(archive.exists(7));

		let entry = archive.get_by_name("B.PNG").unwrap();
		assert_eq!(entry.no(), 7);
		assert_eq!(entry.location().volume, 1);
		assert_eq!(entry.data(), Some(&[0x89, b'P', b'N', b'G'][..]));

		assert!(archive.get_by_name("C.PNG").is_none());
		assert!(archive.exists_by_name("A.QNT"));
	}
}

#[test]
fn test_mmap_and_buffered_agree() {
	let (_dir, paths) = two_volumes();
	let mapped = open(&paths, true);
	let buffered = open(&paths, false);
	assert!(!buffered.is_mmapped());

	assert_eq!(mapped.max_file(), buffered.max_file());
	for no in 0..mapped.max_file() {
		let (a, b) = (mapped.get(no), buffered.get(no));
		assert_eq!(a.is_some(), b.is_some(), "entry {}", no);
		if let (Some(a), Some(b)) = (a, b) {
			assert_eq!(a.name(), b.name());
			assert_eq!(a.size(), b.size());
			assert_eq!(a.location(), b.location());
			assert_eq!(a.data(), b.data());
			assert!(!b.payload().unwrap().is_mapped());
		}
	}
}

#[test]
fn test_repeated_get_is_stable() {
	let (_dir, paths) = two_volumes();
	let archive = open(&paths, false);
	let first = archive.get(3).unwrap();
	let second = archive.get(3).unwrap();
	assert_eq!(first.name(), second.name());
	assert_eq!(first.data(), second.data());
}

#[test]
fn test_for_each_and_iter_order() {
	let (_dir, paths) = two_volumes();
	let archive = open(&paths, false);

	let mut seen = Vec::new();
	archive.for_each(&mut |entry| {
		entry.load().unwrap();
		seen.push((entry.no(), entry.data().map(<[u8]>::len)));
	});
	assert_eq!(seen, vec![(3, Some(5)), (7, Some(4))]);

	let iterated: Vec<_> = archive.iter().map(|e| (e.no(), e.is_loaded())).collect();
	assert_eq!(iterated, vec![(3, false), (7, false)]);
}

#[test]
fn test_missing_second_volume() {
	let (_dir, paths) = two_volumes();
	let archive = AldArchive::open(&[Some(&paths[0]), None], false).unwrap();
	assert_eq!(archive.volume_count(), 2);
	assert!(archive.volume_path(1).is_none());
	assert!(archive.get(3).is_some());
	assert!(archive.get(7).is_none());
	assert!(!archive.exists(7));
}

#[test]
fn test_release_and_reload() {
	let (_dir, paths) = two_volumes();
	let archive = open(&paths, true);
	let mut entry = archive.get(3).unwrap();
	archive.release_file(&mut entry);
	assert!(!entry.is_loaded());
	archive.load_file(&mut entry).unwrap();
	assert_eq!(entry.data(), Some(&b"hello"[..]));

	let copy = archive.copy_descriptor(&entry);
	assert!(!copy.is_loaded());
	assert_eq!(copy.name(), "A.QNT");
}

#[test]
fn test_basename_and_sjis_names() {
	let name = encoding_rs::SHIFT_JIS.encode("背景/空.QNT").0.into_owned();
	let volume = crate::single_volume(&[(&name, b"x"), (b"CG\\TITLE.PMS", b"y")]);
	let dir = tempfile::tempdir().unwrap();
	let paths = write_volumes(dir.path(), &[volume]);

	let archive = OpenOptions::new().name_conv(sjis_name).open(&[Some(&paths[0])]).unwrap();
	let entry = archive.get(0).unwrap();
	assert_eq!(entry.name(), "背景/空.QNT");
	assert_eq!(archive.conv_name(&name), "背景/空.QNT");

	assert_eq!(archive.get_by_basename("cg/title").unwrap().no(), 1);
	assert_eq!(archive.get_by_basename("背景\\空.bmp").unwrap().no(), 0);
	assert!(archive.get_by_basename("title").is_none());
}

#[test]
fn test_corrupt_header_is_bad_archive() {
	let mut volume = crate::single_volume(&[(b"A", b"a")]);
	// claims a 200-block file map
	volume[3] = 201;
	let dir = tempfile::tempdir().unwrap();
	let paths = write_volumes(dir.path(), &[volume]);
	let err = AldArchive::open(&[Some(&paths[0])], false).unwrap_err();
	assert!(matches!(err, ArchiveError::BadArchive { .. }));
	assert!(!err.is_file_error());
}
