//! `canim anim` - animation container commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use canim_format::batch;
use canim_format::{AnimDocument, Outcome};
use clap::{Args, Subcommand};

use crate::config::CanimConfig;
use crate::files;
use crate::BatchOp;

#[derive(Args)]
pub struct AnimArgs {
    #[command(subcommand)]
    pub command: AnimCommand,
}

#[derive(Subcommand)]
pub enum AnimCommand {
    /// Print header, tables, symbols and decode diagnostics
    View {
        /// Input .canim file
        input: PathBuf,
    },

    /// Export to a JSON interchange document
    Export {
        /// Input .canim file
        input: PathBuf,

        /// Output JSON file (default: <input>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rebuild a binary container from a JSON interchange document
    Rebuild {
        /// Input JSON file
        input: PathBuf,

        /// Output .canim file (default: input without its .json suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode, export, re-import and re-encode, then compare against the source bytes
    Verify {
        /// Input .canim file
        input: PathBuf,
    },

    /// Apply one operation to every container in a directory
    Batch {
        op: BatchOp,

        /// Directory to process (not recursive)
        dir: PathBuf,
    },
}

pub fn execute(args: AnimArgs, config: &CanimConfig) -> Result<()> {
    match args.command {
        AnimCommand::View { input } => {
            let data = files::read(&input)?;
            let (doc, diagnostics) = AnimDocument::decode_with_diagnostics(&data)
                .with_context(|| format!("Failed to decode {}", input.display()))?;
            print!("{}", doc.summary());
            if !diagnostics.is_empty() {
                println!("Diagnostics:");
                for diagnostic in &diagnostics {
                    println!("  {diagnostic}");
                }
            }
            Ok(())
        }
        AnimCommand::Export { input, output } => {
            let output =
                output.unwrap_or_else(|| files::json_path(&input, &config.batch.json_suffix));
            export(&input, &output)?;
            println!("Exported {} -> {}", input.display(), output.display());
            Ok(())
        }
        AnimCommand::Rebuild { input, output } => {
            let output = match output {
                Some(output) => output,
                None => files::strip_json_suffix(&input, &config.batch.json_suffix)?,
            };
            let len = rebuild(&input, &output, config.save.backup)?;
            println!("Rebuilt {} ({} bytes)", output.display(), len);
            Ok(())
        }
        AnimCommand::Verify { input } => files::report_verify(&input, verify(&input)?),
        AnimCommand::Batch { op, dir } => run_batch(op, &dir, config),
    }
}

fn decode(path: &Path) -> Result<AnimDocument> {
    let data = files::read(path)?;
    AnimDocument::decode(&data).with_context(|| format!("Failed to decode {}", path.display()))
}

fn export(input: &Path, output: &Path) -> Result<()> {
    let json = decode(input)?.to_json()?;
    files::write_text(output, &json)
}

fn rebuild(input: &Path, output: &Path, backup: bool) -> Result<usize> {
    let doc = AnimDocument::from_json(&files::read_text(input)?)
        .with_context(|| format!("Failed to import {}", input.display()))?;
    let bytes = doc.encode()?;
    files::save(output, &bytes, backup)?;
    Ok(bytes.len())
}

fn verify(input: &Path) -> Result<Outcome> {
    batch::verify_anim_file(input)
        .with_context(|| format!("Failed to verify {}", input.display()))
}

fn run_batch(op: BatchOp, dir: &Path, config: &CanimConfig) -> Result<()> {
    let extension = &config.batch.anim_extension;
    let json_suffix = &config.batch.json_suffix;
    let report = match op {
        BatchOp::View => batch::run(dir, extension, |path| -> Result<Outcome> {
            let (doc, diagnostics) = AnimDocument::decode_with_diagnostics(&files::read(path)?)?;
            let summary = doc.summary();
            Ok(Outcome::Passed(format!(
                "{} symbol(s), {} sprite(s), {} diagnostic(s)",
                summary.symbols.len(),
                summary.sprites,
                diagnostics.len()
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
