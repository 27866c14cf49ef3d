//! canim - inspect and edit `.canim` animation and `.canim-meta` event containers
//!
//! # Commands
//!
//! - `canim anim view|export|rebuild|verify <path>` - animation containers
//! - `canim meta view|export|import|rebuild|verify <path>` - event containers
//! - `canim meta time|bbox|scale|move|dup|del <path> <chunk> ...` - event edits
//! - `canim anim|meta batch <view|export|rebuild|verify> <dir>` - whole folders
//!
//! Chunk and phase numbers on the command line start at 1.
//!
//! # Configuration (canim.toml)
//!
//! ```toml
//! [batch]
//! anim_extension = "canim"
//! meta_extension = "canim-meta"
//! json_suffix = "json"
//!
//! [save]
//! backup = true
//! ```

mod anim;
mod config;
mod files;
mod meta;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::CanimConfig;

#[derive(Parser)]
#[command(name = "canim")]
#[command(about = "Inspect, export, rebuild and edit canim containers")]
#[command(version)]
struct Cli {
    /// Path to canim.toml (defaults to ./canim.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Animation containers (.canim)
    Anim(anim::AnimArgs),

    /// Event containers (.canim-meta)
    Meta(meta::MetaArgs),
}

/// Operation applied to every file by `batch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BatchOp {
    View,
    Export,
    Rebuild,
    Verify,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CanimConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Anim(args) => anim::execute(args, &config),
        Commands::Meta(args) => meta::execute(args, &config),
    }
}
