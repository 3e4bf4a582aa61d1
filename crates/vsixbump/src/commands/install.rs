//! Install command: write the pre-commit hook.

use std::io::IsTerminal;

use anyhow::{Context, bail};
use clap::Args;
use inquire::Confirm;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use vsixbump_core::git;
use vsixbump_core::install::{self, ExistingHook, InstallAction};

/// Arguments for the `install` subcommand.
#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Replace an existing pre-commit hook without asking
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the install command.
#[instrument(name = "cmd_install", skip_all, fields(json_output))]
pub fn cmd_install(
    args: InstallArgs,
    global_json: bool,
    quiet: bool,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, force = args.force, "executing install command");

    let root = git::repo_root(cwd).context("install needs a git repository")?;
    let hooks_dir = git::hooks_dir(&root).context("failed to locate the hooks directory")?;

    let mut force = args.force;
    if !force && install::existing_hook(&hooks_dir) == ExistingHook::Foreign {
        if global_json || !std::io::stdin().is_terminal() {
            bail!(
                "{} already exists; rerun with --force to replace it",
                hooks_dir.join(install::HOOK_NAME)
            );
        }
        force = Confirm::new("A pre-commit hook already exists. Replace it?")
            .with_default(false)
            .prompt()
            .context("confirmation cancelled")?;
        if !force {
            println!("{}", "Cancelled.".yellow());
            return Ok(());
        }
    }

    let outcome = install::install_hook(&hooks_dir, force).context("failed to install hook")?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if !quiet {
        let verb = match outcome.action {
            InstallAction::Installed => "Installed",
            InstallAction::Updated => "Updated",
            InstallAction::Replaced => "Replaced",
        };
        println!("  {} {verb} {}", "✓".green(), outcome.path.cyan());
    }

    Ok(())
}
