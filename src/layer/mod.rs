//! Build layers
//!
//! A layer is a directory under the buildpack's layers root plus a
//! `<name>.toml` metadata file next to it. Features write config files,
//! binaries, env overrides and the process table into the layer; the
//! metadata records the layer flags and its content fingerprint so later
//! builds can tell whether the layer is still current.

pub mod fingerprint;
pub mod launch;

pub use fingerprint::LayerFingerprint;
pub use launch::{LaunchMetadata, LaunchProcess};

use crate::error::{PhpWebError, PhpWebResult};
use crate::procs::PROCS_FILE;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File the platform reads launch processes from
pub const LAUNCH_FILE: &str = "launch.toml";

/// The layers root for one build
#[derive(Debug, Clone)]
pub struct Layers {
    root: PathBuf,
}

impl Layers {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handle to the named layer. Nothing is created on disk yet.
    pub fn layer(&self, name: &str) -> PhpWebResult<Layer> {
        validate_layer_name(name)?;
        Ok(Layer {
            name: name.to_string(),
            root: self.root.join(name),
            metadata_path: self.root.join(format!("{}.toml", name)),
        })
    }

    /// Path of `launch.toml`
    pub fn launch_path(&self) -> PathBuf {
        self.root.join(LAUNCH_FILE)
    }

    /// Write the app's launch processes, replacing earlier ones
    pub async fn write_application_metadata(&self, metadata: &LaunchMetadata) -> PhpWebResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PhpWebError::io(format!("creating {}", self.root.display()), e))?;

        let content = toml::to_string_pretty(metadata)?;
        let path = self.launch_path();
        fs::write(&path, content)
            .await
            .map_err(|e| PhpWebError::io(format!("writing {}", path.display()), e))?;

        for process in &metadata.processes {
            debug!("Launch process {}: {}", process.r#type, process.command);
        }
        Ok(())
    }

    /// Read launch processes, if any were written
    pub async fn read_application_metadata(&self) -> PhpWebResult<Option<LaunchMetadata>> {
        read_toml(&self.launch_path()).await
    }

    /// Forget launch processes from a previous build
    pub async fn clear_application_metadata(&self) -> PhpWebResult<()> {
        remove_if_exists(&self.launch_path()).await
    }
}

/// Validate that a layer name is safe (no path traversal, no special characters).
fn validate_layer_name(name: &str) -> PhpWebResult<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name == "launch" || name == "build" || name == "store" {
        "reserved by the platform"
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        "must contain only alphanumeric characters, hyphens, or underscores"
    } else {
        return Ok(());
    };

    Err(PhpWebError::LayerName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Layer flags plus the fingerprint of its contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMetadata {
    #[serde(default)]
    pub launch: bool,
    #[serde(default)]
    pub build: bool,
    #[serde(default)]
    pub cache: bool,
    pub metadata: LayerFingerprint,
}

impl LayerMetadata {
    /// Metadata for a launch-only layer
    pub fn launch(fingerprint: LayerFingerprint) -> Self {
        Self {
            launch: true,
            build: false,
            cache: false,
            metadata: fingerprint,
        }
    }
}

/// One layer directory
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    root: PathBuf,
    metadata_path: PathBuf,
}

impl Layer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of this layer's process table
    pub fn procs_path(&self) -> PathBuf {
        self.root.join(PROCS_FILE)
    }

    /// Path of the layer's `etc` directory
    pub fn etc_dir(&self) -> PathBuf {
        self.root.join("etc")
    }

    /// Read stored metadata from a previous build
    pub async fn read_metadata(&self) -> PhpWebResult<Option<LayerMetadata>> {
        read_toml(&self.metadata_path).await
    }

    /// Store metadata for this build
    pub async fn write_metadata(&self, metadata: &LayerMetadata) -> PhpWebResult<()> {
        if let Some(parent) = self.metadata_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PhpWebError::io(format!("creating {}", parent.display()), e))?;
        }
        let content = toml::to_string_pretty(metadata)?;
        fs::write(&self.metadata_path, content).await.map_err(|e| {
            PhpWebError::io(format!("writing {}", self.metadata_path.display()), e)
        })
    }

    /// True if the stored fingerprint matches `fingerprint`
    pub async fn is_current(&self, fingerprint: &LayerFingerprint) -> PhpWebResult<bool> {
        Ok(self
            .read_metadata()
            .await?
            .is_some_and(|m| &m.metadata == fingerprint))
    }

    /// Remove the layer contents and metadata
    pub async fn reset(&self) -> PhpWebResult<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(PhpWebError::io(
                    format!("removing layer {}", self.root.display()),
                    e,
                ))
            }
        }
        remove_if_exists(&self.metadata_path).await
    }

    /// Create the layer directory
    pub async fn ensure_root(&self) -> PhpWebResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PhpWebError::io(format!("creating layer {}", self.root.display()), e))
    }

    /// Set an environment variable for both build and launch, replacing
    /// any inherited value.
    pub async fn override_shared_env(&self, name: &str, value: &str) -> PhpWebResult<()> {
        let path = self.root.join("env").join(format!("{}.override", name));
        write_file(&path, value).await?;
        debug!("{} env override: {}={}", self.name, name, value);
        Ok(())
    }

    /// Add a script sourced at launch before the app starts
    pub async fn write_profile(&self, file_name: &str, content: &str) -> PhpWebResult<()> {
        write_file(&self.root.join("profile.d").join(file_name), content).await
    }

    /// Copy an executable into `<layer>/bin/<name>`
    pub async fn install_binary(&self, source: &Path, name: &str) -> PhpWebResult<PathBuf> {
        if !source.exists() {
            return Err(PhpWebError::PathNotFound(source.to_path_buf()));
        }

        let bin_dir = self.root.join("bin");
        fs::create_dir_all(&bin_dir)
            .await
            .map_err(|e| PhpWebError::io(format!("creating {}", bin_dir.display()), e))?;

        let target = bin_dir.join(name);
        fs::copy(source, &target).await.map_err(|e| {
            PhpWebError::io(
                format!("copying {} to {}", source.display(), target.display()),
                e,
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            fs::set_permissions(&target, perms)
                .await
                .map_err(|e| PhpWebError::io("setting binary permissions", e))?;
        }

        Ok(target)
    }
}

/// Write `content` to `path`, creating parent directories
pub async fn write_file(path: &Path, content: &str) -> PhpWebResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PhpWebError::io(format!("creating {}", parent.display()), e))?;
    }
    fs::write(path, content)
        .await
        .map_err(|e| PhpWebError::io(format!("writing {}", path.display()), e))
}

async fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> PhpWebResult<Option<T>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PhpWebError::io(format!("reading {}", path.display()), e)),
    };
    Ok(Some(toml::from_str(&content)?))
}

async fn remove_if_exists(path: &Path) -> PhpWebResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PhpWebError::io(format!("removing {}", path.display()), e)),
    }
}
