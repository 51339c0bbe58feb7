//! Process table persistence
//!
//! The process table (`procs.yml`) is the hand-off between build time and
//! launch time. Features add entries while the app is built; `procmgr`
//! reads the file once when the container starts.
//!
//! ```yaml
//! processes:
//!   nginx:
//!     command: nginx
//!     args: ["-p", "/workspace", "-c", "/workspace/nginx.conf"]
//! ```
//!
//! Decoding is strict: unknown keys at any level are rejected. There is no
//! locking, callers must not write the same file concurrently.

use crate::error::{PhpWebError, PhpWebResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// File name of the process table inside a layer
pub const PROCS_FILE: &str = "procs.yml";

/// Reserved process name for the FastCGI worker pool
pub const PHP_FPM_PROCESS: &str = "php-fpm";

/// One launchable command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessEntry {
    /// Executable name or path
    pub command: String,

    /// Arguments, passed as-is (no shell)
    #[serde(default)]
    pub args: Vec<String>,
}

impl ProcessEntry {
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Named set of processes for one application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessTable {
    #[serde(default)]
    pub processes: BTreeMap<String, ProcessEntry>,
}

impl ProcessTable {
    /// Build a table from `(name, entry)` pairs
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ProcessEntry)>,
        S: Into<String>,
    {
        Self {
            processes: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn get(&self, name: &str) -> Option<&ProcessEntry> {
        self.processes.get(name)
    }

    /// Overlay `delta` onto this table. Keys in `delta` replace existing ones.
    pub fn merge(&mut self, delta: ProcessTable) {
        self.processes.extend(delta.processes);
    }

    /// Parse a table from YAML text
    pub fn parse(content: &str, path: &Path) -> PhpWebResult<Self> {
        serde_yaml::from_str(content).map_err(|e| PhpWebError::ProcsInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read a table from disk.
    ///
    /// A missing file is an empty table, not an error.
    pub async fn read(path: &Path) -> PhpWebResult<Self> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No process table at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(PhpWebError::io(
                    format!("reading process table {}", path.display()),
                    e,
                ))
            }
        };

        Self::parse(&content, path)
    }

    /// Write the table to disk, replacing whatever was there
    pub async fn write(&self, path: &Path) -> PhpWebResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PhpWebError::io(format!("creating {}", parent.display()), e))?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| PhpWebError::io(format!("writing process table {}", path.display()), e))
    }
}

/// Read the table at `path`, overlay `delta`, and write it back.
pub async fn append_or_update(path: &Path, delta: ProcessTable) -> PhpWebResult<()> {
    let mut table = ProcessTable::read(path).await?;
    for name in delta.processes.keys() {
        debug!("Registering process {} in {}", name, path.display());
    }
    table.merge(delta);
    table.write(path).await
}
