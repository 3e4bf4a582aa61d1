//! Show command: print the manifest's current version.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use vsixbump_core::bump;
use vsixbump_core::config::Config;
use vsixbump_core::manifest::VersionSpan;

use super::{ManifestArgs, Target};

/// Arguments for the `show` subcommand.
#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

#[derive(Serialize)]
struct ShowReport {
    manifest: camino::Utf8PathBuf,
    version: String,
    span: VersionSpan,
}

/// Execute the show command.
#[instrument(name = "cmd_show", skip_all, fields(json_output))]
pub fn cmd_show(
    args: ShowArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing show command");

    let target = Target::resolve(&args.manifest, config, cwd);
    let path = target.manifest_path();
    let (version, span) = bump::current_version(&path)
        .with_context(|| format!("failed to read version from {path}"))?;

    if global_json {
        let report = ShowReport {
            manifest: target.manifest,
            version,
            span,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}: {}", target.manifest.dimmed(), version.green().bold());
    }

    Ok(())
}
