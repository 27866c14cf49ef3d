//! `canim meta` - event container commands
//!
//! Edit commands rewrite the container in place (or to `--output`) and take
//! 1-based chunk and phase numbers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use canim_format::batch;
use canim_format::{BoundingBox, EventDocument, Outcome};
use clap::{Args, Subcommand};

use crate::config::CanimConfig;
use crate::files;
use crate::BatchOp;

#[derive(Args)]
pub struct MetaArgs {
    #[command(subcommand)]
    pub command: MetaCommand,
}

/// Target of an edit command
#[derive(Args)]
pub struct EditTarget {
    /// Input .canim-meta file
    pub input: PathBuf,

    /// Chunk number (1-based)
    pub chunk: usize,

    /// Write here instead of overwriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum MetaCommand {
    /// Print header and a per-chunk table
    View {
        /// Input .canim-meta file
        input: PathBuf,

        /// List every phase, point box and segment
        #[arg(long)]
        detail: bool,
    },

    /// Export to a JSON interchange document
    Export {
        /// Input .canim-meta file
        input: PathBuf,

        /// Output JSON file (default: <input>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace an existing container's contents with a JSON document
    Import {
        /// Input JSON file
        json: PathBuf,

        /// Container to overwrite
        target: PathBuf,
    },

    /// Rebuild a binary container from a JSON interchange document
    Rebuild {
        /// Input JSON file
        input: PathBuf,

        /// Output .canim-meta file (default: input without its .json suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode, export, re-import and re-encode, then compare against the source bytes
    Verify {
        /// Input .canim-meta file
        input: PathBuf,
    },

    /// Set a chunk's start and end time
    Time {
        #[command(flatten)]
        target: EditTarget,

        #[arg(allow_negative_numbers = true)]
        start: f32,

        #[arg(allow_negative_numbers = true)]
        end: f32,
    },

    /// Replace a hit phase with an axis-aligned box
    Bbox {
        #[command(flatten)]
        target: EditTarget,

        /// Phase number (1-based)
        phase: usize,

        #[arg(allow_negative_numbers = true)]
        min_x: f32,

        #[arg(allow_negative_numbers = true)]
        min_y: f32,

        #[arg(allow_negative_numbers = true)]
        max_x: f32,

        #[arg(allow_negative_numbers = true)]
        max_y: f32,
    },

    /// Scale a chunk's geometry about its centre
    Scale {
        #[command(flatten)]
        target: EditTarget,

        factor: f32,
    },

    /// Translate a chunk's geometry
    Move {
        #[command(flatten)]
        target: EditTarget,

        #[arg(allow_negative_numbers = true)]
        dx: f32,

        #[arg(allow_negative_numbers = true)]
        dy: f32,
    },

    /// Append a copy of a chunk
    Dup {
        #[command(flatten)]
        target: EditTarget,
    },

    /// Delete a chunk
    Del {
        #[command(flatten)]
        target: EditTarget,
    },

    /// Apply one operation to every container in a directory
    Batch {
        op: BatchOp,

        /// Directory to process (not recursive)
        dir: PathBuf,
    },
}

pub fn execute(args: MetaArgs, config: &CanimConfig) -> Result<()> {
    match args.command {
        MetaCommand::View { input, detail } => {
            let doc = decode(&input)?;
            print!("{}", doc.summary());
            if detail {
                print!("{}", doc.detail());
            }
            Ok(())
        }
        MetaCommand::Export { input, output } => {
            let output =
                output.unwrap_or_else(|| files::json_path(&input, &config.batch.json_suffix));
            export(&input, &output)?;
            println!("Exported {} -> {}", input.display(), output.display());
            Ok(())
        }
        MetaCommand::Import { json, target } => {
            let mut doc = import(&json)?;
            doc.sync_chunk_count();
            files::save(&target, &doc.encode()?, config.save.backup)?;
            println!(
                "Imported {} -> {} ({} chunk(s))",
                json.display(),
                target.display(),
                doc.chunks.len()
            );
            Ok(())
        }
        MetaCommand::Rebuild { input, output } => {
            let output = match output {
                Some(output) => output,
                None => files::strip_json_suffix(&input, &config.batch.json_suffix)?,
            };
            let len = rebuild(&input, &output, config.save.backup)?;
            println!("Rebuilt {} ({} bytes)", output.display(), len);
            Ok(())
        }
        MetaCommand::Verify { input } => files::report_verify(&input, verify(&input)?),
        MetaCommand::Time { target, start, end } => edit(target, config, |doc, index| {
            doc.set_time_window(index, start, end)?;
            Ok(format!("time {start}..{end}"))
        }),
        MetaCommand::Bbox {
            target,
            phase,
            min_x,
            min_y,
            max_x,
            max_y,
        } => {
            let phase_index = to_index(phase, "phase")?;
            let bounds = BoundingBox {
                min_x,
                min_y,
                max_x,
                max_y,
            };
            edit(target, config, |doc, index| {
                doc.set_bounding_box(index, phase_index, bounds)?;
                Ok(format!(
                    "phase {phase} box ({min_x},{min_y})-({max_x},{max_y})"
                ))
            })
        }
        MetaCommand::Scale { target, factor } => edit(target, config, |doc, index| {
            doc.scale(index, factor)?;
            Ok(format!("scaled x{factor}"))
        }),
        MetaCommand::Move { target, dx, dy } => edit(target, config, |doc, index| {
            doc.translate(index, dx, dy)?;
            Ok(format!("moved by ({dx},{dy})"))
        }),
        MetaCommand::Dup { target } => edit(target, config, |doc, index| {
            let copy = doc.duplicate(index)?;
            Ok(format!("duplicated as chunk {}", copy + 1))
        }),
        MetaCommand::Del { target } => edit(target, config, |doc, index| {
            let removed = doc.delete(index)?;
            Ok(format!("deleted {} chunk", removed.tag_name()))
        }),
        MetaCommand::Batch { op, dir } => run_batch(op, &dir, config),
    }
}

/// 1-based command-line number to a 0-based index
fn to_index(number: usize, what: &str) -> Result<usize> {
    match number.checked_sub(1) {
        Some(index) => Ok(index),
        None => anyhow::bail!("{what} numbers start at 1"),
    }
}

/// Decode, apply `change`, then save in place or to `--output`
fn edit<F>(target: EditTarget, config: &CanimConfig, change: F) -> Result<()>
where
    F: FnOnce(&mut EventDocument, usize) -> Result<String>,
{
    let index = to_index(target.chunk, "chunk")?;
    let mut doc = decode(&target.input)?;
    let message = change(&mut doc, index)?;
    let output = target.output.as_deref().unwrap_or(&target.input);
    files::save(output, &doc.encode()?, config.save.backup)?;
    println!("Chunk {}: {} -> {}", target.chunk, message, output.display());
    Ok(())
}

fn decode(path: &Path) -> Result<EventDocument> {
    let data = files::read(path)?;
    EventDocument::decode(&data).with_context(|| format!("Failed to decode {}", path.display()))
}

fn import(path: &Path) -> Result<EventDocument> {
    EventDocument::from_json(&files::read_text(path)?)
        .with_context(|| format!("Failed to import {}", path.display()))
}

fn export(input: &Path, output: &Path) -> Result<()> {
    let json = decode(input)?.to_json()?;
    files::write_text(output, &json)
}

fn rebuild(input: &Path, output: &Path, backup: bool) -> Result<usize> {
    let bytes = import(input)?.encode()?;
    files::save(output, &bytes, backup)?;
    Ok(bytes.len())
}

fn verify(input: &Path) -> Result<Outcome> {
    batch::verify_meta_file(input)
        .with_context(|| format!("Failed to verify {}", input.display()))
}

fn run_batch(op: BatchOp, dir: &Path, config: &CanimConfig) -> Result<()> {
    let extension = &config.batch.meta_extension;
    let json_suffix = &config.batch.json_suffix;
    let report = match op {
        BatchOp::View => batch::run(dir, extension, |path| -> Result<Outcome> {
            let summary = decode(path)?.summary();
            Ok(Outcome::Passed(format!(
                "{} chunk(s), {} structured, {} opaque",
                summary.chunks.len(),
                summary.structured,
                summary.opaque
            )))
        })?,
        BatchOp::Export => batch::run(dir, extension, |path| -> Result<Outcome> {
            let output = files::json_path(path, json_suffix);
            export(path, &output)?;
            Ok(Outcome::Passed(format!("-> {}", output.display())))
        })?,
        BatchOp::Rebuild => {
            let json_extension = format!("{extension}.{json_suffix}");
            batch::run(dir, &json_extension, |path| -> Result<Outcome> {
                let output = files::strip_json_suffix(path, json_suffix)?;
                let len = rebuild(path, &output, config.save.backup)?;
                Ok(Outcome::Passed(format!("{len} bytes")))
            })?
        }
        BatchOp::Verify => batch::run(dir, extension, verify)?,
    };
    files::finish_batch(&report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(1, "chunk").unwrap(), 0);
        assert_eq!(to_index(4, "phase").unwrap(), 3);
        assert!(to_index(0, "chunk").is_err());
    }
}
