//! Shell completion scripts for `vsixbump`.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use clap_complete::{Shell, generate_to};

const BIN_NAME: &str = "vsixbump";

/// Where and for which shells to write completion scripts.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Directory for the scripts, relative to the workspace root
    #[arg(long = "out-dir", default_value = "dist/share/completions")]
    pub out_dir: PathBuf,

    /// Write a script for one shell instead of bash, zsh, fish and PowerShell
    #[arg(long, value_enum)]
    pub shell: Option<Shell>,
}

pub fn cmd_completions(args: CompletionsArgs) -> Result<(), String> {
    let target = crate::workspace_root().join(&args.out_dir);
    fs::create_dir_all(&target).map_err(|e| format!("{}: {e}", target.display()))?;

    let shells = args.shell.map_or_else(
        || vec![Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell],
        |shell| vec![shell],
    );

    let mut cli = vsixbump::command();
    for shell in shells {
        let script = generate_to(shell, &mut cli, BIN_NAME, &target)
            .map_err(|e| format!("{BIN_NAME} {shell} completions: {e}"))?;
        println!("completions: {}", script.display());
    }

    Ok(())
}
