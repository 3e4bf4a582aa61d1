//! Bump command: thin CLI layer over `vsixbump_core::bump`.

use anyhow::{Context, bail};
use clap::Args;
use tracing::{debug, instrument};

use vsixbump_core::bump::{self, Trigger};
use vsixbump_core::config::Config;
use vsixbump_core::git::Git;

use super::{ManifestArgs, Target, print_outcome};

/// Arguments for the `bump` subcommand.
#[derive(Args, Debug, Default)]
pub struct BumpArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Add the manifest to the index after bumping
    #[arg(long)]
    pub stage: bool,

    /// Run without making changes (show what would happen)
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the bump command.
#[instrument(name = "cmd_bump", skip_all, fields(json_output))]
pub fn cmd_bump(
    args: BumpArgs,
    global_json: bool,
    quiet: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, stage = args.stage, "executing bump command");

    let target = Target::resolve(&args.manifest, config, cwd);
    if args.stage && !target.in_repo {
        bail!("--stage needs a git repository, but {cwd} is not inside one");
    }

    let request = target
        .request()
        .with_trigger(Trigger::Always)
        .with_restage(args.stage)
        .with_dry_run(args.dry_run);

    let git = Git::new(target.root.clone());
    let outcome = bump::run(&git, &request)
        .with_context(|| format!("failed to bump {}", target.manifest_path()))?;

    print_outcome(&outcome, global_json, quiet)
}
