//! Configuration loading and discovery.
//!
//! Settings come from, in order of precedence (highest first):
//! - explicit files passed with `--config`
//! - `.vsixbump.<ext>` or `vsixbump.<ext>` in the current directory or any
//!   parent, stopping at the repository boundary (`.git`)
//! - `~/.config/vsixbump/config.<ext>` (user config)
//! - built-in defaults
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`.
//!
//! # Example file
//!
//! ```toml
//! log_level = "debug"
//!
//! [manifest]
//! path = "vhdl4vs.ProjectType/source.extension.vsixmanifest"
//!
//! [hook]
//! trigger = "staged"
//! on_error = "warn"
//! ```
//!
//! # Loading
//! ```no_run
//! use camino::Utf8PathBuf;
//! use vsixbump_core::config::ConfigLoader;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("manifest: {}", config.manifest_path());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::bump::Trigger;
use crate::error::{ConfigError, ConfigResult};

/// Manifest path used when none is configured.
pub const DEFAULT_MANIFEST_PATH: &str = "source.extension.vsixmanifest";

/// The configuration for vsixbump.
///
/// Every section is optional; accessors such as [`Config::manifest_path`]
/// fill in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the JSONL log file (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files. File logging is off when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// Which manifest to bump.
    pub manifest: Option<ManifestConfig>,
    /// Pre-commit hook behavior.
    pub hook: Option<HookConfig>,
}

/// Manifest location.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ManifestConfig {
    /// Path of the manifest, relative to the repository root.
    pub path: Option<Utf8PathBuf>,
}

/// Pre-commit hook behavior.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct HookConfig {
    /// When the hook bumps (`"staged"`, `"untouched"`, `"always"`).
    pub trigger: Option<Trigger>,
    /// What a failed bump does to the commit (`"warn"` or `"abort"`).
    pub on_error: Option<ErrorPolicy>,
}

/// How the hook reacts to a manifest it cannot bump.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Print a diagnostic and let the commit proceed.
    #[default]
    Warn,
    /// Fail the hook, blocking the commit.
    Abort,
}

impl ErrorPolicy {
    /// Returns the policy as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Abort => "abort",
        }
    }
}

impl Config {
    /// Configured manifest path, or [`DEFAULT_MANIFEST_PATH`].
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.manifest
            .as_ref()
            .and_then(|m| m.path.clone())
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_MANIFEST_PATH))
    }

    /// Configured hook trigger, or [`Trigger::Staged`].
    pub fn trigger(&self) -> Trigger {
        self.hook
            .as_ref()
            .and_then(|h| h.trigger)
            .unwrap_or_default()
    }

    /// Configured failure policy, or [`ErrorPolicy::Warn`].
    pub fn on_error(&self) -> ErrorPolicy {
        self.hook
            .as_ref()
            .and_then(|h| h.on_error)
            .unwrap_or_default()
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "vsixbump";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load.
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for a project config file.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/vsixbump/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the upward search at a parent directory containing `marker`.
    ///
    /// Default is `.git`, so a hook never picks up configuration from
    /// outside its own repository.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file; later files take precedence.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Deserialize`] when a file cannot be parsed or
    /// holds values of the wrong shape, and [`ConfigError::Missing`] when an
    /// explicit file does not exist.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            tracing::debug!(path = %user_config, "merging user config");
            figment = Self::merge_file(figment, &user_config);
        }

        if let Some(ref root) = self.project_search_root
            && let Some(project_config) = self.find_project_config(root)
        {
            tracing::debug!(path = %project_config, "merging project config");
            figment = Self::merge_file(figment, &project_config);
        }

        for file in &self.explicit_files {
            if !file.is_file() {
                return Err(ConfigError::Missing(file.clone()));
            }
            figment = Self::merge_file(figment, file);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::debug!(
            log_level = config.log_level.as_str(),
            manifest = %config.manifest_path(),
            trigger = %config.trigger(),
            on_error = config.on_error().as_str(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Find project config by walking up from the given directory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            for ext in CONFIG_EXTENSIONS {
                // Dotfile wins over the plain name in the same directory
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    return Some(dotfile);
                }

                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    return Some(regular);
                }
            }

            // The repository root is the last directory searched
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        None
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Find the project config file path without loading it.
pub fn find_project_config<P: AsRef<Utf8Path>>(start: P) -> Option<Utf8PathBuf> {
    ConfigLoader::new().find_project_config(start.as_ref())
}

/// Get the user config directory path.
///
/// Returns `~/.config/vsixbump/` on Linux,
/// `~/Library/Application Support/vsixbump/` on macOS, and the equivalent on
/// other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}
