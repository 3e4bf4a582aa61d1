//! vsixbump CLI
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use vsixbump::{Cli, Commands, commands};
use vsixbump_core::config::ConfigLoader;

mod observability;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.apply();

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = camino::Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;
    let explicit_config = cli
        .config
        .clone()
        .map(|path| {
            camino::Utf8PathBuf::try_from(path).map_err(|e| {
                anyhow::anyhow!(
                    "config path is not valid UTF-8: {}",
                    e.into_path_buf().display()
                )
            })
        })
        .transpose()?;
    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref config_path) = explicit_config {
        loader = loader.with_file(config_path);
    }
    let config = loader.load().context("failed to load configuration")?;

    let obs_config = observability::ObservabilityConfig::from_env_with_overrides(
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.as_std_path().to_path_buf()),
    );
    let _guard = observability::init_observability(
        &obs_config,
        observability::stderr_filter(cli.quiet, cli.verbose),
        observability::file_filter(config.log_level.as_str()),
    )
    .context("failed to initialize logging/tracing")?;

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        color = ?cli.color,
        chdir = ?cli.chdir,
        "CLI initialized"
    );

    let result = match cli.command {
        Commands::Hook(args) => {
            commands::hook::cmd_hook(args, cli.json, cli.quiet, &config, &cwd)
        }
        Commands::Bump(args) => {
            commands::bump::cmd_bump(args, cli.json, cli.quiet, &config, &cwd)
        }
        Commands::Show(args) => commands::show::cmd_show(args, cli.json, &config, &cwd),
        Commands::Install(args) => {
            commands::install::cmd_install(args, cli.json, cli.quiet, &cwd)
        }
        Commands::Info(args) => commands::info::cmd_info(
            args,
            cli.json,
            &config,
            explicit_config.as_deref(),
            &cwd,
        ),
    };
    if let Err(ref err) = result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}
