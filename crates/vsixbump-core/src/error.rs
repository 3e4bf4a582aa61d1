//! Configuration error types for vsixbump-core.
//!
//! Each operational module owns its own error enum ([`ManifestError`],
//! [`VersionError`], [`GitError`], [`BumpError`], [`InstallError`]); this
//! module holds the ones shared by configuration loading.
//!
//! [`ManifestError`]: crate::manifest::ManifestError
//! [`VersionError`]: crate::version::VersionError
//! [`GitError`]: crate::git::GitError
//! [`BumpError`]: crate::bump::BumpError
//! [`InstallError`]: crate::install::InstallError

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// A config file given explicitly does not exist.
    #[error("config file not found: {0}")]
    Missing(Utf8PathBuf),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;
