//! Pre-commit hook installation.
//!
//! Writes a small `sh` script into the repository's hooks directory that
//! runs `vsixbump hook`. The script carries a marker line so a later install
//! can tell its own hook apart from one written by somebody else.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Hook file name git looks for.
pub const HOOK_NAME: &str = "pre-commit";

/// Line identifying a hook written by this tool.
pub const HOOK_MARKER: &str = "# installed by vsixbump";

/// Errors from hook installation.
#[derive(Error, Debug)]
pub enum InstallError {
    /// A hook not written by this tool is already in place.
    #[error("{0} already exists and was not installed by vsixbump (use --force to replace it)")]
    HookExists(Utf8PathBuf),

    /// Filesystem failure while writing the hook.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Hook path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for install operations.
pub type InstallResult<T> = Result<T, InstallError>;

/// What an install did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallAction {
    /// No hook existed.
    Installed,
    /// Our own hook was rewritten.
    Updated,
    /// A foreign hook was replaced because `force` was set.
    Replaced,
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    /// Path of the hook script.
    pub path: Utf8PathBuf,
    /// What happened.
    pub action: InstallAction,
}

/// State of the hook slot before installing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingHook {
    /// No pre-commit hook.
    None,
    /// A hook carrying [`HOOK_MARKER`].
    Ours,
    /// Any other hook.
    Foreign,
}

/// The script body for the pre-commit hook.
pub fn hook_script() -> String {
    format!(
        "#!/bin/sh\n\
         {HOOK_MARKER}\n\
         # Bumps the manifest build number and re-stages it.\n\
         exec vsixbump hook\n"
    )
}

/// Inspect the pre-commit slot in `hooks_dir`.
pub fn existing_hook(hooks_dir: &Utf8Path) -> ExistingHook {
    let path = hooks_dir.join(HOOK_NAME);
    match std::fs::read_to_string(&path) {
        Ok(contents) if contents.lines().any(|l| l.trim() == HOOK_MARKER) => ExistingHook::Ours,
        Ok(_) => ExistingHook::Foreign,
        // Unreadable (e.g. binary) hooks still count as present
        Err(_) if path.exists() => ExistingHook::Foreign,
        Err(_) => ExistingHook::None,
    }
}

/// Install the pre-commit hook into `hooks_dir`.
///
/// # Errors
///
/// Returns [`InstallError::HookExists`] when a foreign hook is present and
/// `force` is false, or [`InstallError::Io`] on filesystem failure.
#[instrument(fields(%hooks_dir))]
pub fn install_hook(hooks_dir: &Utf8Path, force: bool) -> InstallResult<InstallOutcome> {
    let path = hooks_dir.join(HOOK_NAME);
    let action = match existing_hook(hooks_dir) {
        ExistingHook::None => InstallAction::Installed,
        ExistingHook::Ours => InstallAction::Updated,
        ExistingHook::Foreign if force => InstallAction::Replaced,
        ExistingHook::Foreign => return Err(InstallError::HookExists(path)),
    };
    debug!(?action, %path, "writing hook");

    let io_err = |source| InstallError::Io {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(hooks_dir).map_err(io_err)?;
    std::fs::write(&path, hook_script()).map_err(io_err)?;
    make_executable(&path).map_err(io_err)?;

    info!(?action, %path, "pre-commit hook installed");
    Ok(InstallOutcome { path, action })
}

#[cfg(unix)]
fn make_executable(path: &Utf8Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Utf8Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn hooks_dir() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().join("hooks")).unwrap();
        (tmp, dir)
    }

    #[test]
    fn fresh_install_creates_directory_and_script() {
        let (_tmp, dir) = hooks_dir();
        let outcome = install_hook(&dir, false).unwrap();

        assert_eq!(outcome.action, InstallAction::Installed);
        assert_eq!(outcome.path, dir.join(HOOK_NAME));
        let script = fs::read_to_string(&outcome.path).unwrap();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("exec vsixbump hook"));
        assert_eq!(existing_hook(&dir), ExistingHook::Ours);
    }

    #[test]
    fn reinstall_updates_own_hook() {
        let (_tmp, dir) = hooks_dir();
        install_hook(&dir, false).unwrap();
        let outcome = install_hook(&dir, false).unwrap();
        assert_eq!(outcome.action, InstallAction::Updated);
    }

    #[test]
    fn foreign_hook_is_refused_without_force() {
        let (_tmp, dir) = hooks_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(HOOK_NAME), "#!/bin/sh\nnpm test\n").unwrap();

        let err = install_hook(&dir, false).unwrap_err();
        assert!(matches!(err, InstallError::HookExists(_)));
        assert_eq!(
            fs::read_to_string(dir.join(HOOK_NAME)).unwrap(),
            "#!/bin/sh\nnpm test\n"
        );
    }

    #[test]
    fn foreign_hook_is_replaced_with_force() {
        let (_tmp, dir) = hooks_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(HOOK_NAME), "#!/bin/sh\nnpm test\n").unwrap();

        let outcome = install_hook(&dir, true).unwrap();
        assert_eq!(outcome.action, InstallAction::Replaced);
        assert_eq!(fs::read_to_string(&outcome.path).unwrap(), hook_script());
    }

    #[test]
    fn no_hook_detected_in_empty_dir() {
        let (_tmp, dir) = hooks_dir();
        assert_eq!(existing_hook(&dir), ExistingHook::None);
    }

    #[cfg(unix)]
    #[test]
    fn installed_hook_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let (_tmp, dir) = hooks_dir();
        let outcome = install_hook(&dir, false).unwrap();
        let mode = fs::metadata(&outcome.path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
