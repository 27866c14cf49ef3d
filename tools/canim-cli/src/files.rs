//! File helpers shared by the anim and meta commands

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use canim_format::{BatchReport, Outcome};

pub fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// `hero.canim` -> `hero.canim.json`
pub fn json_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// `hero.canim.json` -> `hero.canim`
pub fn strip_json_suffix(path: &Path, suffix: &str) -> Result<PathBuf> {
    let text = path.to_string_lossy();
    match text.strip_suffix(&format!(".{suffix}")) {
        Some(stem) if !stem.is_empty() => Ok(PathBuf::from(stem)),
        _ => anyhow::bail!(
            "Cannot derive output name from {} (expected a .{} file, pass --output)",
            path.display(),
            suffix
        ),
    }
}

/// Write `bytes` to `path`. When `backup` is set and `path` already exists,
/// it is first copied to `<path>.bak` unless that backup already exists.
pub fn save(path: &Path, bytes: &[u8], backup: bool) -> Result<()> {
    if backup && path.is_file() {
        let bak = json_path(path, "bak");
        if !bak.exists() {
            fs::copy(path, &bak)
                .with_context(|| format!("Failed to back up {}", path.display()))?;
            tracing::debug!("Backed up {} -> {}", path.display(), bak.display());
        }
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

/// Print the outcome of a single-file `verify`; mismatches fail the command
pub fn report_verify(path: &Path, outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Passed(detail) => {
            println!("{}: {}", path.display(), detail);
            Ok(())
        }
        Outcome::Mismatch(detail) => anyhow::bail!("{}: {}", path.display(), detail),
    }
}

/// Print a batch table; any file that did not pass fails the command
pub fn finish_batch(report: &BatchReport) -> Result<()> {
    println!("{report}");
    let total = report.entries.len();
    let passed = report.passed();
    if passed != total {
        anyhow::bail!("{} of {} file(s) did not pass", total - passed, total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_json_path_round_trip() {
        let json = json_path(Path::new("dir/hero.canim"), "json");
        assert_eq!(json, PathBuf::from("dir/hero.canim.json"));
        assert_eq!(
            strip_json_suffix(&json, "json").unwrap(),
            PathBuf::from("dir/hero.canim")
        );
        assert!(strip_json_suffix(Path::new("hero.canim"), "json").is_err());
    }

    #[test]
    fn test_save_keeps_first_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hero.canim");
        fs::write(&path, b"v1").unwrap();

        save(&path, b"v2", true).unwrap();
        save(&path, b"v3", true).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"v3");
        assert_eq!(fs::read(dir.path().join("hero.canim.bak")).unwrap(), b"v1");
    }

    #[test]
    fn test_save_without_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hero.canim");
        fs::write(&path, b"v1").unwrap();
        save(&path, b"v2", false).unwrap();
        assert!(!dir.path().join("hero.canim.bak").exists());
    }
}
