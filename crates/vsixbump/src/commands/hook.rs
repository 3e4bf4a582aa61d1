//! Hook command: the pre-commit entry point.
//!
//! A failed bump never blocks the commit unless the user opted in with
//! `--strict` or `hook.on_error = "abort"`.

use anyhow::{Context, bail};
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, error, instrument};

use vsixbump_core::bump::{self, Trigger};
use vsixbump_core::config::{Config, ErrorPolicy};
use vsixbump_core::git::Git;

use super::{ManifestArgs, Target, print_outcome};

/// Arguments for the `hook` subcommand.
#[derive(Args, Debug, Default)]
pub struct HookArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Override the configured trigger
    #[arg(long, value_enum)]
    pub trigger: Option<Trigger>,

    /// Run without making changes (show what would happen)
    #[arg(long)]
    pub dry_run: bool,

    /// Fail the commit when the manifest cannot be bumped
    #[arg(long)]
    pub strict: bool,
}

/// Execute the hook command.
#[instrument(name = "cmd_hook", skip_all, fields(json_output))]
pub fn cmd_hook(
    args: HookArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing hook command");

    let policy = if args.strict {
        ErrorPolicy::Abort
    } else {
        config.on_error()
    };

    let result = run_hook(&args, global_json, quiet, config, cwd);
    match (result, policy) {
        (Ok(()), _) => Ok(()),
        (Err(err), ErrorPolicy::Abort) => Err(err),
        (Err(err), ErrorPolicy::Warn) => {
            error!(error = %format!("{err:#}"), "bump failed, commit continues");
            eprintln!(
                "{}: manifest version not bumped: {err:#}",
                "warning".yellow().bold()
            );
            Ok(())
        }
    }
}

fn run_hook(
    args: &HookArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    let target = Target::resolve(&args.manifest, config, cwd);
    if !target.in_repo {
        bail!("{cwd} is not inside a git repository");
    }

    let request = target
        .request()
        .with_trigger(args.trigger.unwrap_or_else(|| config.trigger()))
        .with_dry_run(args.dry_run);

    let git = Git::new(target.root.clone());
    let outcome = bump::run(&git, &request)
        .with_context(|| format!("failed to bump {}", target.manifest_path()))?;

    print_outcome(&outcome, global_json, quiet)
}
