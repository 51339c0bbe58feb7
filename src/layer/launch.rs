//! Launch metadata (`launch.toml`)

use serde::{Deserialize, Serialize};

/// A process type the platform can start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchProcess {
    /// Process type, e.g. `web` or `task`
    pub r#type: String,

    /// Command line, run through a shell unless `direct`
    pub command: String,

    #[serde(default)]
    pub direct: bool,
}

impl LaunchProcess {
    pub fn new(r#type: &str, command: impl Into<String>) -> Self {
        Self {
            r#type: r#type.to_string(),
            command: command.into(),
            direct: false,
        }
    }
}

/// Contents of `launch.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchMetadata {
    #[serde(default)]
    pub processes: Vec<LaunchProcess>,
}

impl LaunchMetadata {
    /// Only a `web` process
    pub fn web(command: impl Into<String>) -> Self {
        Self {
            processes: vec![LaunchProcess::new("web", command)],
        }
    }

    /// The same command as both `web` and `task`
    pub fn web_and_task(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            processes: vec![
                LaunchProcess::new("web", command.clone()),
                LaunchProcess::new("task", command),
            ],
        }
    }

    /// Command for a process type
    pub fn command(&self, r#type: &str) -> Option<&str> {
        self.processes
            .iter()
            .find(|p| p.r#type == r#type)
            .map(|p| p.command.as_str())
    }
}
