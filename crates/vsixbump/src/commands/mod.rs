//! Command implementations

pub mod bump;

pub mod hook;

pub mod info;

pub mod install;

pub mod show;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use owo_colors::OwoColorize;
use tracing::debug;

use vsixbump_core::bump::{BumpOutcome, BumpRequest};
use vsixbump_core::config::Config;
use vsixbump_core::git;

/// Options shared by every command that reads or writes the manifest.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ManifestArgs {
    /// Manifest path relative to the repository root (overrides config)
    #[arg(short, long, value_name = "PATH")]
    pub manifest: Option<Utf8PathBuf>,
}

/// Where the manifest lives for this invocation.
#[derive(Debug, Clone)]
pub struct Target {
    /// Repository root, or the working directory outside a repository.
    pub root: Utf8PathBuf,
    /// Manifest path relative to `root`.
    pub manifest: Utf8PathBuf,
    /// Whether `root` is a git working tree.
    pub in_repo: bool,
}

impl Target {
    /// Resolve the repository root from `cwd` and the manifest from args/config.
    pub fn resolve(args: &ManifestArgs, config: &Config, cwd: &Utf8Path) -> Self {
        let (root, in_repo) = match git::repo_root(cwd) {
            Ok(root) => (root, true),
            Err(err) => {
                debug!(error = %err, "not in a git repository, using working directory");
                (cwd.to_path_buf(), false)
            }
        };
        let manifest = args
            .manifest
            .clone()
            .unwrap_or_else(|| config.manifest_path());
        debug!(%root, %manifest, in_repo, "resolved manifest target");
        Self {
            root,
            manifest,
            in_repo,
        }
    }

    /// A request for this target with hook defaults.
    pub fn request(&self) -> BumpRequest {
        BumpRequest::new(self.root.clone(), self.manifest.clone())
    }

    /// The manifest path on disk.
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.root.join(&self.manifest)
    }
}

/// Print a bump outcome in the selected output format.
pub fn print_outcome(outcome: &BumpOutcome, json: bool, quiet: bool) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).context("failed to serialize outcome")?
        );
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    match outcome {
        BumpOutcome::Skipped { manifest, reason } => {
            println!("{} {} ({reason})", "–".dimmed(), manifest.cyan());
        }
        BumpOutcome::Bumped {
            manifest,
            previous,
            next,
            staged,
            dry_run,
        } => {
            println!(
                "  {} {}: {} → {}",
                "✓".green(),
                manifest.cyan(),
                previous.dimmed(),
                next.green().bold()
            );
            if *staged {
                println!("  {} re-staged", "→".dimmed());
            }
            if *dry_run {
                println!("{}", "Dry run, no changes made.".yellow());
            }
        }
    }
    Ok(())
}
