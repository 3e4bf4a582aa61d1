//! `cargo xtask`: release artifacts for vsixbump that cargo does not build.
//!
//! - `completions` - bash/zsh/fish/PowerShell completion scripts
//! - `man` - roff pages for `vsixbump` and each subcommand
//!
//! Both write under `dist/share/` by default.

#![deny(unsafe_code)]

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "xtask")]
#[command(about = "Build vsixbump completions and man pages")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand, Debug)]
enum Task {
    /// Write shell completion scripts for `vsixbump`.
    Completions(commands::completions::CompletionsArgs),

    /// Write `vsixbump(1)` and a `vsixbump-<command>(1)` page per subcommand.
    Man(commands::man::ManArgs),
}

fn main() -> Result<(), String> {
    match Xtask::parse().task {
        Task::Completions(args) => commands::completions::cmd_completions(args),
        Task::Man(args) => commands::man::cmd_man(args),
    }
}

/// The directory holding the workspace `Cargo.toml`.
pub fn workspace_root() -> PathBuf {
    let xtask_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    xtask_dir
        .parent()
        .map_or_else(|| xtask_dir.clone(), PathBuf::from)
}
