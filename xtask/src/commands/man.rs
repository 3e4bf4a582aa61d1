//! Man pages: `vsixbump(1)` plus one `vsixbump-<command>(1)` per subcommand.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

/// Where to write the pages.
#[derive(Args, Debug)]
pub struct ManArgs {
    /// Directory for the `.1` files, relative to the workspace root
    #[arg(long = "out-dir", default_value = "dist/share/man/man1")]
    pub out_dir: PathBuf,
}

pub fn cmd_man(args: ManArgs) -> Result<(), String> {
    let target = crate::workspace_root().join(&args.out_dir);
    fs::create_dir_all(&target).map_err(|e| format!("{}: {e}", target.display()))?;

    let cli = vsixbump::command();
    write_page(&target, "vsixbump", cli.clone())?;

    // Header titled `vsixbump-hook` etc., matching the file name
    for sub in cli.get_subcommands() {
        let page = format!("vsixbump-{}", sub.get_name());
        write_page(&target, &page, sub.clone())?;
    }

    Ok(())
}

fn write_page(dir: &Path, page: &str, cmd: clap::Command) -> Result<PathBuf, String> {
    let mut roff = Vec::new();
    clap_mangen::Man::new(cmd)
        .title(page)
        .render(&mut roff)
        .map_err(|e| format!("{page}(1): {e}"))?;

    let path = dir.join(format!("{page}.1"));
    fs::write(&path, roff).map_err(|e| format!("{}: {e}", path.display()))?;
    println!("man page: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommand_page_is_titled_with_binary_prefix() {
        let dir = std::env::temp_dir().join(format!("vsixbump-man-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let hook = vsixbump::command()
            .find_subcommand("hook")
            .cloned()
            .unwrap();
        let path = write_page(&dir, "vsixbump-hook", hook).unwrap();

        assert_eq!(path, dir.join("vsixbump-hook.1"));
        let roff = fs::read_to_string(&path).unwrap();
        let header = roff.lines().find(|l| l.starts_with(".TH")).unwrap();
        // roff may escape the hyphen as `\-`
        assert!(header.replace("\\-", "-").contains("vsixbump-hook"), "{header}");
        let _ = fs::remove_dir_all(&dir);
    }
}
