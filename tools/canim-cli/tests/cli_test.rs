//! End-to-end tests for the `canim` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn canim(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_canim"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run canim")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_f32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_string(out: &mut Vec<u8>, text: &str) {
    push_u32(out, text.len() as u32);
    out.extend_from_slice(text.as_bytes());
}

fn anim_file() -> Vec<u8> {
    let mut data = b"SHNA".to_vec();
    push_u32(&mut data, 1);
    push_u16(&mut data, 1);
    push_u16(&mut data, 0);
    push_string(&mut data, "hero");
    data.push(24);
    for _ in 0..5 {
        push_u16(&mut data, 0);
    }
    push_string(&mut data, "walk");
    data.push(24);
    push_u16(&mut data, 1);
    push_u16(&mut data, 0);
    push_u16(&mut data, 0);
    push_string(&mut data, "walk_0");
    for value in [32.0, 48.0, 16.0, 48.0] {
        push_f32(&mut data, value);
    }
    data
}

fn meta_file() -> Vec<u8> {
    let mut data = Vec::new();
    push_u32(&mut data, 7);
    push_u32(&mut data, 0xAABB_CCDD);
    push_u32(&mut data, 1);
    data.extend_from_slice(b"MHIT");
    push_u32(&mut data, 0xAABB_CCDD);
    push_u32(&mut data, 0x42);
    push_f32(&mut data, 0.0);
    push_f32(&mut data, 0.5);
    push_u32(&mut data, 0);
    push_u32(&mut data, 1);
    push_f32(&mut data, 0.1);
    push_u32(&mut data, 4);
    for (x, y) in [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)] {
        push_f32(&mut data, x);
        push_f32(&mut data, y);
    }
    push_u32(&mut data, 0);
    data
}

#[test]
fn test_anim_view_and_verify() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hero.canim"), anim_file()).unwrap();

    let view = canim(dir.path(), &["anim", "view", "hero.canim"]);
    assert!(view.status.success());
    assert!(stdout(&view).contains("\"walk\""));

    let verify = canim(dir.path(), &["anim", "verify", "hero.canim"]);
    assert!(verify.status.success());
    assert!(stdout(&verify).contains("identical"));
}

#[test]
fn test_anim_export_then_rebuild() {
    let dir = tempdir().unwrap();
    let original = anim_file();
    fs::write(dir.path().join("hero.canim"), &original).unwrap();

    assert!(canim(dir.path(), &["anim", "export", "hero.canim"]).status.success());
    assert!(dir.path().join("hero.canim.json").is_file());

    let rebuilt = canim(
        dir.path(),
        &["anim", "rebuild", "hero.canim.json", "-o", "copy.canim"],
    );
    assert!(rebuilt.status.success());
    assert_eq!(fs::read(dir.path().join("copy.canim")).unwrap(), original);
}

#[test]
fn test_meta_edit_keeps_backup() {
    let dir = tempdir().unwrap();
    let original = meta_file();
    fs::write(dir.path().join("hit.canim-meta"), &original).unwrap();

    let edit = canim(
        dir.path(),
        &["meta", "move", "hit.canim-meta", "1", "-5", "2.5"],
    );
    assert!(edit.status.success(), "{}", String::from_utf8_lossy(&edit.stderr));
    assert_eq!(
        fs::read(dir.path().join("hit.canim-meta.bak")).unwrap(),
        original
    );

    let view = canim(dir.path(), &["meta", "view", "--detail", "hit.canim-meta"]);
    assert!(view.status.success());
    assert!(stdout(&view).contains("box=(-5.0,2.5)-(5.0,12.5)"));
}

#[test]
fn test_meta_chunk_zero_is_rejected() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("hit.canim-meta"), meta_file()).unwrap();
    let dup = canim(dir.path(), &["meta", "dup", "hit.canim-meta", "0"]);
    assert!(!dup.status.success());
}

#[test]
fn test_batch_failure_sets_exit_status() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.canim"), anim_file()).unwrap();
    fs::write(dir.path().join("b.canim"), &anim_file()[..10]).unwrap();

    let batch = canim(dir.path(), &["anim", "batch", "verify", "."]);
    assert!(!batch.status.success());
    let table = stdout(&batch);
    assert!(table.contains("FAILED"));
    assert!(table.contains("2 file(s): 1 passed, 0 mismatched, 1 failed"));
}

#[test]
fn test_config_changes_batch_extension() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("canim.toml"),
        "[batch]\nmeta_extension = \"evt\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("one.evt"), meta_file()).unwrap();
    fs::write(dir.path().join("two.canim-meta"), b"ignored").unwrap();

    let batch = canim(dir.path(), &["meta", "batch", "verify", "."]);
    assert!(batch.status.success());
    assert!(stdout(&batch).contains("1 file(s): 1 passed"));
}
