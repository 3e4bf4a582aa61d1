//! Git boundary for the pre-commit workflow.
//!
//! Shells out to `git` for all operations. This ensures we inherit the user's
//! index, `core.hooksPath`, worktree layout, and other configuration.
//!
//! The two calls the bump run depends on sit behind [`StagingArea`] so the
//! orchestrator can be driven by a fake in tests.

use std::process::{Command, Output};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned an unexpected exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "add").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,

    /// Git printed a path that is not valid UTF-8.
    #[error("git returned a non UTF-8 path: {0}")]
    NonUtf8Path(String),
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// The index operations a bump run needs.
pub trait StagingArea {
    /// Whether `path` differs between the index and `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query could not be answered.
    fn has_staged_changes(&self, path: &Utf8Path) -> GitResult<bool>;

    /// Add `path` to the index.
    ///
    /// # Errors
    ///
    /// Returns an error if git refused to stage the file.
    fn stage(&self, path: &Utf8Path) -> GitResult<()>;
}

/// A git working tree, addressed by its root directory.
///
/// Paths handed to [`StagingArea`] are relative to [`Git::root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Git {
    root: Utf8PathBuf,
}

impl Git {
    /// Wrap the working tree rooted at `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the repository that contains `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepo`] when `dir` is outside any working tree.
    pub fn discover(dir: &Utf8Path) -> GitResult<Self> {
        repo_root(dir).map(Self::new)
    }

    /// The working tree root.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl StagingArea for Git {
    #[instrument(skip(self), fields(root = %self.root))]
    fn has_staged_changes(&self, path: &Utf8Path) -> GitResult<bool> {
        let args = [
            "diff",
            "--cached",
            "--exit-code",
            "--quiet",
            "--",
            path.as_str(),
        ];
        let output = git_output(&self.root, &args)?;

        // --exit-code: 0 = no differences, 1 = differences, anything else is an error
        match output.status.code() {
            Some(0) => {
                debug!(%path, "no staged changes");
                Ok(false)
            }
            Some(1) => {
                debug!(%path, "staged changes present");
                Ok(true)
            }
            _ => Err(command_error(&args, &output)),
        }
    }

    #[instrument(skip(self), fields(root = %self.root))]
    fn stage(&self, path: &Utf8Path) -> GitResult<()> {
        git(&self.root, &["add", "--", path.as_str()])?;
        debug!(%path, "staged");
        Ok(())
    }
}

/// Find the top-level directory of the working tree containing `dir`.
#[instrument]
pub fn repo_root(dir: &Utf8Path) -> GitResult<Utf8PathBuf> {
    let output = git(dir, &["rev-parse", "--show-toplevel"])?;
    let root = Utf8PathBuf::from(output.trim());
    debug!(%root, "repository root");
    Ok(root)
}

/// Check if `dir` is inside a git working tree.
#[instrument]
pub fn is_inside_repo(dir: &Utf8Path) -> GitResult<bool> {
    let result = git(dir, &["rev-parse", "--is-inside-work-tree"]);
    match result {
        Ok(output) => Ok(output.trim() == "true"),
        Err(GitError::Command { .. } | GitError::NotARepo) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Resolve the directory git runs hooks from.
///
/// Honours `core.hooksPath` and linked worktrees. Relative answers are
/// joined onto `root`.
#[instrument]
pub fn hooks_dir(root: &Utf8Path) -> GitResult<Utf8PathBuf> {
    let output = git(root, &["rev-parse", "--git-path", "hooks"])?;
    let dir = Utf8PathBuf::from(output.trim());
    let dir = if dir.is_absolute() { dir } else { root.join(dir) };
    debug!(%dir, "hooks directory");
    Ok(dir)
}

/// Run a git command in `dir` and return its stdout.
fn git(dir: &Utf8Path, args: &[&str]) -> GitResult<String> {
    let output = git_output(dir, args)?;

    if output.status.success() {
        String::from_utf8(output.stdout)
            .map_err(|e| GitError::NonUtf8Path(String::from_utf8_lossy(e.as_bytes()).into_owned()))
    } else {
        Err(command_error(args, &output))
    }
}

fn git_output(dir: &Utf8Path, args: &[&str]) -> GitResult<Output> {
    Ok(Command::new("git")
        .args(args)
        .current_dir(dir.as_std_path())
        .output()?)
}

fn command_error(args: &[&str], output: &Output) -> GitError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    // Detect "not a git repo" specifically
    if stderr.contains("not a git repository") {
        return GitError::NotARepo;
    }

    GitError::Command {
        command: args.first().unwrap_or(&"").to_string(),
        stderr,
    }
}

#[cfg(test)]
pub(crate) mod test_repo {
    //! Throwaway repositories for tests that need a real `git`.

    use std::process::Command;

    use camino::{Utf8Path, Utf8PathBuf};
    use tempfile::TempDir;

    /// A temporary repository with one commit.
    pub struct TestRepo {
        _dir: TempDir,
        pub root: Utf8PathBuf,
    }

    impl TestRepo {
        /// Create a repository, or `None` when `git` is not installed.
        pub fn init() -> Option<Self> {
            let dir = TempDir::new().unwrap();
            let root = Utf8PathBuf::try_from(dir.path().canonicalize().unwrap()).unwrap();
            let repo = Self { _dir: dir, root };
            if !repo.try_run(&["init", "--quiet"]) {
                return None;
            }
            std::fs::write(repo.root.join("README"), "test\n").unwrap();
            repo.run(&["add", "README"]);
            repo.commit("initial");
            Some(repo)
        }

        pub fn write(&self, rel: &str, contents: &str) {
            let path = self.root.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, contents).unwrap();
        }

        pub fn read(&self, rel: &str) -> String {
            std::fs::read_to_string(self.root.join(rel)).unwrap()
        }

        pub fn commit(&self, message: &str) {
            self.run(&[
                "-c",
                "user.name=vsixbump",
                "-c",
                "user.email=vsixbump@example.invalid",
                "-c",
                "commit.gpgsign=false",
                "commit",
                "--quiet",
                "--no-verify",
                "-m",
                message,
            ]);
        }

        /// Content of `rel` as recorded in the index.
        pub fn staged(&self, rel: &str) -> String {
            let output = Command::new("git")
                .args(["show", &format!(":{rel}")])
                .current_dir(&self.root)
                .output()
                .unwrap();
            assert!(output.status.success(), "{rel} is not in the index");
            String::from_utf8(output.stdout).unwrap()
        }

        pub fn run(&self, args: &[&str]) {
            assert!(self.try_run(args), "git {args:?} failed");
        }

        fn try_run(&self, args: &[&str]) -> bool {
            Command::new("git")
                .args(args)
                .current_dir(&self.root)
                .output()
                .is_ok_and(|o| o.status.success())
        }

        pub fn path(&self) -> &Utf8Path {
            &self.root
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_repo::TestRepo;
    use super::*;

    #[test]
    fn is_inside_repo_false_outside_repo() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        // Should not error regardless of whether git is installed
        if let Ok(inside) = is_inside_repo(&dir) {
            assert!(!inside);
        }
    }

    #[test]
    fn repo_root_found_from_subdirectory() {
        let Some(repo) = TestRepo::init() else { return };
        repo.write("nested/deep/file.txt", "x");
        let root = repo_root(&repo.path().join("nested/deep")).unwrap();
        assert_eq!(root, repo.root);
        assert!(is_inside_repo(repo.path()).unwrap());
    }

    #[test]
    fn repo_root_outside_repo_is_not_a_repo() {
        if TestRepo::init().is_none() {
            return;
        }
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        assert!(matches!(repo_root(&dir), Err(GitError::NotARepo)));
    }

    #[test]
    fn staged_changes_detected_only_after_add() {
        let Some(repo) = TestRepo::init() else { return };
        let git = Git::new(repo.root.clone());
        let path = Utf8Path::new("manifest.xml");

        repo.write("manifest.xml", "one");
        repo.run(&["add", "manifest.xml"]);
        repo.commit("add manifest");
        assert!(!git.has_staged_changes(path).unwrap());

        // Unstaged edits are not staged changes
        repo.write("manifest.xml", "two");
        assert!(!git.has_staged_changes(path).unwrap());

        git.stage(path).unwrap();
        assert!(git.has_staged_changes(path).unwrap());
        assert_eq!(repo.staged("manifest.xml"), "two");
    }

    #[test]
    fn stage_missing_file_fails() {
        let Some(repo) = TestRepo::init() else { return };
        let git = Git::new(repo.root.clone());
        let err = git.stage(Utf8Path::new("does-not-exist")).unwrap_err();
        assert!(matches!(err, GitError::Command { ref command, .. } if command == "add"));
    }

    #[test]
    fn hooks_dir_defaults_inside_git_dir() {
        let Some(repo) = TestRepo::init() else { return };
        let dir = hooks_dir(repo.path()).unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with(".git/hooks"), "unexpected hooks dir {dir}");
    }

    #[test]
    fn hooks_dir_honours_core_hooks_path() {
        let Some(repo) = TestRepo::init() else { return };
        repo.run(&["config", "core.hooksPath", "githooks"]);
        let dir = hooks_dir(repo.path()).unwrap();
        assert_eq!(dir, repo.root.join("githooks"));
    }

    #[test]
    fn git_error_on_bad_command() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let result = git(&dir, &["not-a-real-subcommand"]);
        assert!(result.is_err());
    }
}
