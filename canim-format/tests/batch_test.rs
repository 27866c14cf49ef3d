//! Filesystem-backed batch scenarios.
//!
//! Containers are built in memory, written to a temp directory and run
//! through the batch driver the way the CLI does.

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use canim_format::batch::{self, verify_anim_file, verify_meta_file};
use canim_format::codec::{write_f32, write_string, write_u8, write_u16, write_u32};
use canim_format::{AnimDocument, BatchStatus, EventDocument, FormatError, Outcome};

fn anim_file(name: &str, sprites: u16) -> Vec<u8> {
    let mut data = b"SHNA".to_vec();
    write_u32(&mut data, 1);
    write_u16(&mut data, 1);
    write_u16(&mut data, 0);
    write_string(&mut data, name);
    write_u8(&mut data, 24);
    for count in [0, 0, 0, 0, 0] {
        write_u16(&mut data, count);
    }
    write_string(&mut data, "walk");
    write_u8(&mut data, 24);
    write_u16(&mut data, sprites);
    for frame in 0..sprites {
        write_u16(&mut data, frame);
        write_u16(&mut data, 0);
        write_string(&mut data, &format!("walk_{frame}"));
        for value in [32.0, 48.0, 16.0, 48.0] {
            write_f32(&mut data, value);
        }
    }
    data.extend_from_slice(&[0xFF; 2]);
    data
}

fn chunk_header(data: &mut Vec<u8>, tag: &[u8; 4], event: u32) {
    data.extend_from_slice(tag);
    write_u32(data, 0x1234_5678);
    write_u32(data, event);
    write_f32(data, 0.0);
    write_f32(data, 0.5);
    write_u32(data, 1);
}

fn collision_chunk(data: &mut Vec<u8>, event: u32, separator: [u8; 5]) {
    chunk_header(data, b"MCOL", event);
    write_u32(data, 2);
    for y in [0.0, 8.0] {
        write_f32(data, 0.25);
        write_u32(data, 1);
        for value in [0.0, y, 8.0, y] {
            write_f32(data, value);
        }
        data.extend_from_slice(&separator);
    }
    write_u32(data, 0);
}

/// A hit chunk, a collision chunk, an action chunk and a collision chunk whose
/// separator is not zero (kept opaque)
fn meta_file() -> Vec<u8> {
    let mut data = Vec::new();
    write_u32(&mut data, 7);
    write_u32(&mut data, 0x1234_5678);
    write_u32(&mut data, 4);

    chunk_header(&mut data, b"MHIT", 0xAA);
    write_u32(&mut data, 1);
    write_f32(&mut data, 0.1);
    write_u32(&mut data, 4);
    for (x, y) in [(0.0, 0.0), (0.0, 8.0), (8.0, 8.0), (8.0, 0.0)] {
        write_f32(&mut data, x);
        write_f32(&mut data, y);
    }
    write_u32(&mut data, 0);

    collision_chunk(&mut data, 0xBB, [0; 5]);

    chunk_header(&mut data, b"MACT", 0xAA);
    data.extend_from_slice(&[0, 0]);
    data.extend_from_slice(b"play(swing)");

    collision_chunk(&mut data, 0xCC, [0, 0, 1, 0, 0]);
    data
}

fn write(dir: &Path, name: &str, bytes: &[u8]) {
    fs::write(dir.join(name), bytes).expect("Failed to write fixture");
}

#[test]
fn test_batch_partial_failure_keeps_going() {
    let dir = tempdir().expect("Failed to create temp dir");
    for (i, name) in ["a.canim", "b.canim", "d.canim", "e.canim"].iter().enumerate() {
        write(dir.path(), name, &anim_file("hero", i as u16 + 1));
    }
    // Cut inside the header name
    write(dir.path(), "c.canim", &anim_file("hero_variant", 1)[..24]);

    let report = batch::run(dir.path(), "canim", verify_anim_file).unwrap();
    assert_eq!(report.entries.len(), 5);
    assert_eq!(report.passed(), 4);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_clean());

    let failed = &report.entries[2];
    assert_eq!(failed.file_name(), "c.canim");
    let BatchStatus::Failed(message) = &failed.status else {
        panic!("expected failure, got {:?}", failed.status);
    };
    assert!(message.contains("truncated"), "unexpected message: {message}");

    let table = report.to_string();
    assert!(table.contains("5 file(s): 4 passed, 0 mismatched, 1 failed"));
}

#[test]
fn test_batch_only_picks_matching_regular_files() {
    let dir = tempdir().expect("Failed to create temp dir");
    write(dir.path(), "hero.canim", &anim_file("hero", 1));
    write(dir.path(), "hero.canim.json", b"{}");
    write(dir.path(), "notes.txt", b"ignore me");
    fs::create_dir(dir.path().join("nested.canim")).unwrap();
    write(&dir.path().join("nested.canim"), "deep.canim", &anim_file("x", 1));

    let files = batch::matching_files(dir.path(), "canim").unwrap();
    assert_eq!(files, vec![dir.path().join("hero.canim")]);
}

#[test]
fn test_batch_meta_verify_and_mismatch_reporting() {
    let dir = tempdir().expect("Failed to create temp dir");
    write(dir.path(), "one.canim-meta", &meta_file());
    write(dir.path(), "two.canim-meta", &meta_file());

    let report = batch::run(dir.path(), "canim-meta", verify_meta_file).unwrap();
    assert!(report.is_clean());

    // An operation that reports a mismatch is counted apart from failures
    let report = batch::run(dir.path(), "canim-meta", |path| {
        if path.ends_with("two.canim-meta") {
            Ok::<_, FormatError>(Outcome::Mismatch("differs".to_string()))
        } else {
            verify_meta_file(path)
        }
    })
    .unwrap();
    assert_eq!(report.passed(), 1);
    assert_eq!(report.mismatched(), 1);
    assert_eq!(report.failed(), 0);
}

#[test]
fn test_export_import_through_files() {
    let dir = tempdir().expect("Failed to create temp dir");
    let anim = anim_file("hero", 3);
    let meta = meta_file();

    let anim_json = dir.path().join("hero.canim.json");
    let meta_json = dir.path().join("hero.canim-meta.json");
    fs::write(&anim_json, AnimDocument::decode(&anim).unwrap().to_json().unwrap()).unwrap();
    fs::write(&meta_json, EventDocument::decode(&meta).unwrap().to_json().unwrap()).unwrap();

    let anim_back = AnimDocument::from_json(&fs::read_to_string(&anim_json).unwrap()).unwrap();
    assert_eq!(anim_back.encode().unwrap(), anim);
    let meta_back = EventDocument::from_json(&fs::read_to_string(&meta_json).unwrap()).unwrap();
    assert_eq!(meta_back.encode().unwrap(), meta);

    // Wrong container kind is rejected
    let err = AnimDocument::from_json(&fs::read_to_string(&meta_json).unwrap()).unwrap_err();
    assert!(matches!(err, FormatError::FormatMismatch { .. }));
}

#[test]
fn test_event_chunk_kinds_survive_interchange() {
    let meta = meta_file();
    let doc = EventDocument::decode(&meta).unwrap();

    let kinds: Vec<(String, bool)> = doc
        .chunks
        .iter()
        .map(|chunk| (chunk.tag_name(), chunk.is_structured()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("MHIT".to_string(), true),
            ("MCOL".to_string(), true),
            ("MACT".to_string(), false),
            ("MCOL".to_string(), false),
        ]
    );

    let imported = EventDocument::from_json(&doc.to_json().unwrap()).unwrap();
    assert_eq!(imported, doc);
    assert_eq!(imported.encode().unwrap(), meta);
    assert!(matches!(
        batch::verify_meta_bytes(&meta).unwrap(),
        Outcome::Passed(_)
    ));
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("nope");
    assert!(matches!(
        batch::run(&missing, "canim", verify_anim_file),
        Err(FormatError::Io(_))
    ));
}
