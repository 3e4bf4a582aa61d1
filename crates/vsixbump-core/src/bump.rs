//! Manifest bump orchestration.
//!
//! All orchestration logic lives here. The CLI is purely a display layer.
//!
//! # Run sequence
//!
//! 1. **Decide**: ask the [`StagingArea`] whether the manifest is staged and
//!    apply the configured [`Trigger`]. A skipped run touches nothing else.
//! 2. **Rewrite**: read the manifest, locate the version span, increment the
//!    last component, splice it into the original text and write it back.
//! 3. **Re-stage**: add the manifest to the index so the new version is
//!    part of the pending commit.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::git::{GitError, StagingArea};
use crate::manifest::{self, ManifestError};
use crate::version::{self, VersionError};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from bump operations.
#[derive(Error, Debug)]
pub enum BumpError {
    /// Reading or writing the manifest failed.
    #[error("{action} {path}: {source}")]
    Io {
        /// What was being done ("read" or "write").
        action: &'static str,
        /// Manifest path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest does not have the expected structure.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The located version could not be incremented.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Re-staging the manifest failed.
    #[error("failed to re-stage manifest: {0}")]
    Git(#[from] GitError),
}

/// Result alias for bump operations.
pub type BumpResult<T> = Result<T, BumpError>;

// ──────────────────────────────────────────────
// Request types
// ──────────────────────────────────────────────

/// When a run should bump the manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// Bump when the manifest has staged changes.
    #[default]
    Staged,
    /// Bump on every commit unless the manifest is already staged.
    Untouched,
    /// Bump without consulting the index.
    Always,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Staged => write!(f, "staged"),
            Self::Untouched => write!(f, "untouched"),
            Self::Always => write!(f, "always"),
        }
    }
}

/// Everything a single run needs to know.
#[derive(Debug, Clone)]
pub struct BumpRequest {
    /// Working tree root; `manifest` is resolved against it.
    pub root: Utf8PathBuf,
    /// Manifest path, relative to `root` (absolute paths are used as-is).
    pub manifest: Utf8PathBuf,
    /// Rule deciding whether this run bumps.
    pub trigger: Trigger,
    /// Add the rewritten manifest back to the index.
    pub restage: bool,
    /// Compute the new version without writing or staging.
    pub dry_run: bool,
}

impl BumpRequest {
    /// A hook run: staged trigger, re-stage on, not a dry run.
    pub fn new(root: impl Into<Utf8PathBuf>, manifest: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: manifest.into(),
            trigger: Trigger::default(),
            restage: true,
            dry_run: false,
        }
    }

    /// Set the trigger.
    #[must_use]
    pub const fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Set whether the manifest is re-staged after writing.
    #[must_use]
    pub const fn with_restage(mut self, restage: bool) -> Self {
        self.restage = restage;
        self
    }

    /// Set dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The manifest path on disk.
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.root.join(&self.manifest)
    }
}

// ──────────────────────────────────────────────
// Outcome
// ──────────────────────────────────────────────

/// Why a run left the manifest alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `staged` trigger and the manifest has no staged changes.
    NotStaged,
    /// `untouched` trigger and the manifest is already staged.
    AlreadyStaged,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStaged => write!(f, "manifest has no staged changes"),
            Self::AlreadyStaged => write!(f, "manifest is already staged"),
        }
    }
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BumpOutcome {
    /// Nothing was read, written, or staged.
    Skipped {
        /// Manifest path relative to the root.
        manifest: Utf8PathBuf,
        /// Why the run did nothing.
        reason: SkipReason,
    },
    /// The manifest version was incremented.
    Bumped {
        /// Manifest path relative to the root.
        manifest: Utf8PathBuf,
        /// Version before the run.
        previous: String,
        /// Version after the run.
        next: String,
        /// Whether the manifest was added back to the index.
        staged: bool,
        /// Whether this was a dry run (nothing written).
        dry_run: bool,
    },
}

impl BumpOutcome {
    /// Whether the run changed (or, in a dry run, would change) the version.
    pub const fn is_bumped(&self) -> bool {
        matches!(self, Self::Bumped { .. })
    }
}

// ──────────────────────────────────────────────
// Run
// ──────────────────────────────────────────────

/// Run one bump against the manifest described by `request`.
///
/// # Errors
///
/// Returns [`BumpError`] if the manifest cannot be read or written, does not
/// contain a recognizable version, or cannot be re-staged. A failed staging
/// query is not an error: it is logged and treated as "staged changes exist".
#[instrument(skip(staging), fields(manifest = %request.manifest, trigger = %request.trigger))]
pub fn run<S: StagingArea>(staging: &S, request: &BumpRequest) -> BumpResult<BumpOutcome> {
    if let Some(reason) = skip_reason(staging, request) {
        info!(%reason, "skipping bump");
        return Ok(BumpOutcome::Skipped {
            manifest: request.manifest.clone(),
            reason,
        });
    }

    let path = request.manifest_path();
    let text = std::fs::read_to_string(&path).map_err(|source| BumpError::Io {
        action: "read",
        path: path.clone(),
        source,
    })?;

    let (previous, next, bumped) = bump_text(&text)?;

    if request.dry_run {
        info!(%previous, %next, "dry run, manifest not written");
        return Ok(BumpOutcome::Bumped {
            manifest: request.manifest.clone(),
            previous,
            next,
            staged: false,
            dry_run: true,
        });
    }

    std::fs::write(&path, bumped).map_err(|source| BumpError::Io {
        action: "write",
        path: path.clone(),
        source,
    })?;
    debug!(%path, "manifest written");

    if request.restage {
        staging.stage(&request.manifest)?;
    }

    info!(%previous, %next, staged = request.restage, "manifest bumped");
    Ok(BumpOutcome::Bumped {
        manifest: request.manifest.clone(),
        previous,
        next,
        staged: request.restage,
        dry_run: false,
    })
}

/// Locate, increment and splice the version in `text`.
///
/// Returns `(previous, next, new_text)`.
///
/// # Errors
///
/// Returns [`BumpError::Manifest`] or [`BumpError::Version`] when the text
/// does not carry a usable version.
pub fn bump_text(text: &str) -> BumpResult<(String, String, String)> {
    let span = manifest::locate_version(text)?;
    let previous = version_literal(text, span)?.to_string();
    let next = version::increment_version(&previous)?;
    let bumped = manifest::splice(text, span, &next)?;
    Ok((previous, next, bumped))
}

/// Read the current version without modifying anything.
///
/// # Errors
///
/// Returns [`BumpError::Io`] if the manifest cannot be read and
/// [`BumpError::Manifest`] if it carries no version.
#[instrument]
pub fn current_version(path: &Utf8Path) -> BumpResult<(String, manifest::VersionSpan)> {
    let text = std::fs::read_to_string(path).map_err(|source| BumpError::Io {
        action: "read",
        path: path.to_path_buf(),
        source,
    })?;
    let span = manifest::locate_version(&text)?;
    let version = version_literal(&text, span)?.to_string();
    Ok((version, span))
}

fn version_literal(text: &str, span: manifest::VersionSpan) -> Result<&str, ManifestError> {
    span.slice(text).ok_or(ManifestError::SpanOutOfBounds {
        start: span.start(),
        end: span.end(),
        len: text.len(),
    })
}

fn skip_reason<S: StagingArea>(staging: &S, request: &BumpRequest) -> Option<SkipReason> {
    if request.trigger == Trigger::Always {
        return None;
    }

    let staged = staging
        .has_staged_changes(&request.manifest)
        .unwrap_or_else(|err| {
            warn!(error = %err, "staged-change query failed, assuming the manifest is staged");
            true
        });

    match (request.trigger, staged) {
        (Trigger::Staged, false) => Some(SkipReason::NotStaged),
        (Trigger::Untouched, true) => Some(SkipReason::AlreadyStaged),
        _ => None,
    }
}
