//! Sequential batch driver
//!
//! Applies one per-file operation to every matching file in a directory. A
//! failing file is recorded and the loop moves on.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::verify::RoundTrip;
use crate::{AnimDocument, EventDocument, FormatError};

/// What a per-file operation reports when it completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed(String),
    /// Completed, but the result does not match (e.g. a round trip differs)
    Mismatch(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Passed,
    Mismatch,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub status: BatchStatus,
    pub detail: String,
}

impl BatchEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn passed(&self) -> usize {
        self.count(|status| matches!(status, BatchStatus::Passed))
    }

    pub fn mismatched(&self) -> usize {
        self.count(|status| matches!(status, BatchStatus::Mismatch))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, BatchStatus::Failed(_)))
    }

    /// Every file passed
    pub fn is_clean(&self) -> bool {
        self.passed() == self.entries.len()
    }

    fn count(&self, predicate: impl Fn(&BatchStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.status)).count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|e| e.file_name().len())
            .max()
            .unwrap_or(4)
            .max(4);
        writeln!(f, "{:<width$}  {:<8}  DETAIL", "FILE", "STATUS")?;
        for entry in &self.entries {
            let (status, detail) = match &entry.status {
                BatchStatus::Passed => ("ok", entry.detail.as_str()),
                BatchStatus::Mismatch => ("MISMATCH", entry.detail.as_str()),
                BatchStatus::Failed(message) => ("FAILED", message.as_str()),
            };
            writeln!(f, "{:<width$}  {:<8}  {}", entry.file_name(), status, detail)?;
        }
        write!(
            f,
            "{} file(s): {} passed, {} mismatched, {} failed",
            self.entries.len(),
            self.passed(),
            self.mismatched(),
            self.failed()
        )
    }
}

/// Regular files directly inside `dir` whose name ends with `.<extension>`,
/// sorted by file name
pub fn matching_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, FormatError> {
    let suffix = format!(".{extension}");
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(&suffix) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Run `op` on every matching file. Only listing `dir` itself can fail; a
/// per-file error becomes a [`BatchStatus::Failed`] entry.
pub fn run<F, E>(dir: &Path, extension: &str, mut op: F) -> Result<BatchReport, FormatError>
where
    F: FnMut(&Path) -> Result<Outcome, E>,
    E: fmt::Display,
{
    let files = matching_files(dir, extension)?;
    info!("Processing {} file(s) in {}", files.len(), dir.display());

    let mut report = BatchReport::default();
    for path in files {
        let (status, detail) = match op(&path) {
            Ok(Outcome::Passed(detail)) => (BatchStatus::Passed, detail),
            Ok(Outcome::Mismatch(detail)) => (BatchStatus::Mismatch, detail),
            Err(err) => (BatchStatus::Failed(err.to_string()), String::new()),
        };
        debug!("{}: {:?}", path.display(), status);
        report.entries.push(BatchEntry {
            path,
            status,
            detail,
        });
    }
    Ok(report)
}

/// Verify one animation container file. See [`verify_anim_bytes`].
pub fn verify_anim_file(path: &Path) -> Result<Outcome, FormatError> {
    verify_anim_bytes(&std::fs::read(path)?)
}

/// Decode, export to JSON, import again and re-encode, then compare the
/// result against `data`
pub fn verify_anim_bytes(data: &[u8]) -> Result<Outcome, FormatError> {
    let doc = AnimDocument::decode(data)?;
    let imported = AnimDocument::from_json(&doc.to_json()?)?;
    Ok(round_trip_outcome(data, &imported.encode()?))
}

/// Verify one event container file. See [`verify_meta_bytes`].
pub fn verify_meta_file(path: &Path) -> Result<Outcome, FormatError> {
    verify_meta_bytes(&std::fs::read(path)?)
}

/// Event container counterpart of [`verify_anim_bytes`]
pub fn verify_meta_bytes(data: &[u8]) -> Result<Outcome, FormatError> {
    let doc = EventDocument::decode(data)?;
    let imported = EventDocument::from_json(&doc.to_json()?)?;
    Ok(round_trip_outcome(data, &imported.encode()?))
}

/// [`Outcome`] of comparing a rebuild against its source
pub fn round_trip_outcome(original: &[u8], rebuilt: &[u8]) -> Outcome {
    let result = RoundTrip::compare(original, rebuilt);
    if result.is_match() {
        Outcome::Passed(result.to_string())
    } else {
        Outcome::Mismatch(result.to_string())
    }
}
