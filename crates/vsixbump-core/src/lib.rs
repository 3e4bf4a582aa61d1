//! Core library for vsixbump.
//!
//! Bumps the last component of the `Identity` version in a VSIX manifest
//! and re-stages the file, as a git pre-commit hook would. The manifest is
//! edited as raw text so nothing but the version literal ever changes.
//!
//! # Modules
//!
//! - [`bump`] - Run orchestration (decide, rewrite, re-stage)
//! - [`config`] - Configuration loading and management
//! - [`error`] - Configuration error types
//! - [`git`] - Git boundary: staged-change query, staging, discovery
//! - [`install`] - Pre-commit hook installation
//! - [`manifest`] - Version span location and splicing
//! - [`version`] - Four-part version increment
//!
//! # Quick Start
//!
//! ```no_run
//! use vsixbump_core::bump::{self, BumpRequest};
//! use vsixbump_core::git::Git;
//!
//! let git = Git::discover(camino::Utf8Path::new(".")).expect("not in a repository");
//! let request = BumpRequest::new(git.root(), "source.extension.vsixmanifest");
//! let outcome = bump::run(&git, &request).expect("bump failed");
//! println!("{outcome:?}");
//! ```
#![deny(unsafe_code)]

pub mod bump;

pub mod config;

pub mod error;

pub mod git;

pub mod install;

pub mod manifest;

pub mod version;

pub use bump::{BumpOutcome, BumpRequest, Trigger};

pub use config::{Config, ConfigLoader, ErrorPolicy, LogLevel};

pub use error::{ConfigError, ConfigResult};
