//! Info command: show package, configuration, and hook settings.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use vsixbump_core::config::{self, Config};
use vsixbump_core::install::{self, ExistingHook};

use super::{ManifestArgs, Target};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    manifest: String,
    trigger: String,
    on_error: &'static str,
}

impl ConfigInfo {
    /// An explicit `--config` file outranks the discovered project file.
    fn from_config(
        config: &Config,
        explicit: Option<&camino::Utf8Path>,
        cwd: &camino::Utf8Path,
    ) -> Self {
        let config_file = explicit
            .map(camino::Utf8Path::to_path_buf)
            .or_else(|| config::find_project_config(cwd));
        Self {
            config_file: config_file.map(|p| p.to_string()),
            log_level: config.log_level.as_str(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            manifest: config.manifest_path().to_string(),
            trigger: config.trigger().to_string(),
            on_error: config.on_error().as_str(),
        }
    }
}

#[derive(Serialize)]
struct RepoInfo {
    root: String,
    in_repo: bool,
    manifest_exists: bool,
    hook: &'static str,
}

impl RepoInfo {
    fn gather(config: &Config, cwd: &camino::Utf8Path) -> Self {
        let target = Target::resolve(&ManifestArgs::default(), config, cwd);
        let hook = if target.in_repo {
            match vsixbump_core::git::hooks_dir(&target.root).map(|dir| install::existing_hook(&dir)) {
                Ok(ExistingHook::Ours) => "installed",
                Ok(ExistingHook::Foreign) => "foreign",
                Ok(ExistingHook::None) => "missing",
                Err(_) => "unknown",
            }
        } else {
            "n/a"
        };
        Self {
            manifest_exists: target.manifest_path().is_file(),
            root: target.root.to_string(),
            in_repo: target.in_repo,
            hook,
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
    repository: RepoInfo,
}

/// Print package information.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `explicit_config` - File passed with `--config`, if any
/// * `cwd` - Current working directory for config and repository discovery
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    explicit_config: Option<&camino::Utf8Path>,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, explicit_config, cwd),
        repository: RepoInfo::gather(config, cwd),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", info.package.name.bold(), info.package.version.green());
    if !info.package.description.is_empty() {
        println!("{}", info.package.description);
    }
    if !info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), info.package.license);
    }

    println!();
    println!("{}", "Configuration".bold().underline());
    match info.config.config_file {
        Some(ref path) => println!("{}: {}", "Config file".dimmed(), path.cyan()),
        None => println!("{}: {}", "Config file".dimmed(), "none loaded".yellow()),
    }
    println!("{}: {}", "Log level".dimmed(), info.config.log_level);
    if let Some(ref dir) = info.config.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
    println!("{}: {}", "Manifest".dimmed(), info.config.manifest.cyan());
    println!("{}: {}", "Trigger".dimmed(), info.config.trigger);
    println!("{}: {}", "On error".dimmed(), info.config.on_error);

    println!();
    println!("{}", "Repository".bold().underline());
    if info.repository.in_repo {
        println!("{}: {}", "Root".dimmed(), info.repository.root.cyan());
        println!("{}: {}", "Pre-commit hook".dimmed(), info.repository.hook);
    } else {
        println!("  {} {}", "○".yellow(), "Not inside a git repository".yellow());
    }
    if !info.repository.manifest_exists {
        println!("  {} {}", "○".yellow(), "Manifest file not found".yellow());
    }

    Ok(())
}
