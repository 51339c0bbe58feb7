//! Error types for php-web
//!
//! All modules use `PhpWebResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for php-web operations
pub type PhpWebResult<T> = Result<T, PhpWebError>;

/// All errors that can occur in php-web
#[derive(Error, Debug)]
pub enum PhpWebError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid buildpack version '{version}': {reason}")]
    VersionInvalid { version: String, reason: String },

    // Process table errors
    #[error("Invalid process table {path}: {reason}")]
    ProcsInvalid { path: PathBuf, reason: String },

    #[error("Process table has no processes to run")]
    NoProcesses,

    // Feature errors
    #[error("Feature '{feature}' failed: {source}")]
    Feature {
        feature: &'static str,
        #[source]
        source: Box<PhpWebError>,
    },

    #[error("Invalid web app pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    // Layer errors
    #[error("Invalid layer name '{name}': {reason}")]
    LayerName { name: String, reason: String },

    // Supervision outcomes
    #[error("Process {name} exited: {status}")]
    ProcessExited {
        name: String,
        status: std::process::ExitStatus,
    },

    #[error("Process {name} failed: {source}")]
    ProcessFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process supervision ended without any process reporting")]
    SupervisionLost,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PhpWebError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Tag an error with the name of the feature that produced it
    pub fn feature(feature: &'static str, source: PhpWebError) -> Self {
        Self::Feature {
            feature,
            source: Box::new(source),
        }
    }

    /// Name of the failing feature, if this error came out of one
    pub fn feature_name(&self) -> Option<&'static str> {
        match self {
            Self::Feature { feature, .. } => Some(*feature),
            _ => None,
        }
    }

    /// Exit code a supervisor should carry for this error.
    ///
    /// Child exit codes pass through; signalled children map to 128+signal.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ProcessExited { status, .. } => status_code(status),
            _ => 1,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ProcsInvalid { .. } => {
                Some("Only `processes.<name>.command` and `processes.<name>.args` are allowed")
            }
            Self::NoProcesses => Some("Did the build configure a web server (httpd or nginx)?"),
            Self::ConfigInvalid { .. } => Some("Check the `php` section of buildpack.yml"),
            _ => None,
        }
    }
}

#[cfg(unix)]
fn status_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

#[cfg(not(unix))]
fn status_code(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
