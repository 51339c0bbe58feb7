//! Launch-time process supervision
//!
//! Starts every process in a [`ProcessTable`] at once and returns as soon as
//! the first one terminates, for whatever reason. A web server stack is only
//! useful while all of its processes are alive, so any exit (even a clean
//! one) ends supervision and the container is expected to be torn down.
//!
//! Each child gets its own waiter task. Waiters post exactly one
//! [`ProcessOutcome`] to a shared completion channel; the supervisor reads a
//! single message from it. Children are spawned with `kill_on_drop`, so
//! aborting the remaining waiters also kills their processes.

use crate::error::{PhpWebError, PhpWebResult};
use crate::procs::{ProcessEntry, ProcessTable};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How a single supervised process terminated
#[derive(Debug)]
pub struct ProcessOutcome {
    /// Process name from the table
    pub name: String,

    /// Exit status, or the spawn/wait error
    pub result: std::io::Result<ExitStatus>,
}

impl ProcessOutcome {
    /// Map the outcome onto the supervisor's own result.
    ///
    /// A zero exit is reported as `Ok`; everything else is an error.
    pub fn into_result(self) -> PhpWebResult<FirstExit> {
        match self.result {
            Ok(status) if status.success() => Ok(FirstExit {
                name: self.name,
                status,
            }),
            Ok(status) => Err(PhpWebError::ProcessExited {
                name: self.name,
                status,
            }),
            Err(source) => Err(PhpWebError::ProcessFailed {
                name: self.name,
                source,
            }),
        }
    }
}

/// The first process to finish, when it exited cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstExit {
    pub name: String,
    pub status: ExitStatus,
}

/// Fail-fast supervisor over one process table
pub struct ProcessSupervisor {
    table: ProcessTable,
}

impl ProcessSupervisor {
    /// Create a supervisor for an already loaded table
    pub fn new(table: ProcessTable) -> Self {
        Self { table }
    }

    /// Load the table at `path`.
    ///
    /// Unlike the build side, a missing file is an error here: there is
    /// nothing to launch.
    pub async fn load(path: &Path) -> PhpWebResult<Self> {
        if !path.exists() {
            return Err(PhpWebError::PathNotFound(path.to_path_buf()));
        }
        let table = ProcessTable::read(path).await?;
        debug!("Loaded {} processes from {}", table.len(), path.display());
        Ok(Self::new(table))
    }

    /// Number of processes this supervisor will start
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Start every process and wait for the first one to terminate.
    ///
    /// Returns the first outcome only. Remaining processes are killed
    /// best-effort and never waited for.
    pub async fn run(self) -> PhpWebResult<FirstExit> {
        let outcome = self.run_until_first_exit().await?;

        match &outcome.result {
            Ok(status) => info!("process {} exited, status: {}", outcome.name, status),
            Err(e) => warn!("process {} failed: {}", outcome.name, e),
        }

        outcome.into_result()
    }

    /// Fan out all processes and return the first raw outcome
    pub async fn run_until_first_exit(self) -> PhpWebResult<ProcessOutcome> {
        if self.table.is_empty() {
            return Err(PhpWebError::NoProcesses);
        }

        let (tx, mut rx) = mpsc::channel::<ProcessOutcome>(1);

        let waiters: Vec<JoinHandle<()>> = self
            .table
            .processes
            .into_iter()
            .map(|(name, entry)| tokio::spawn(watch_process(name, entry, tx.clone())))
            .collect();

        // Only the waiters hold senders now
        drop(tx);

        let outcome = rx.recv().await.ok_or(PhpWebError::SupervisionLost);

        for waiter in &waiters {
            waiter.abort();
        }

        outcome
    }
}

/// Spawn one process, wait for it, and report exactly once.
async fn watch_process(name: String, entry: ProcessEntry, outcomes: mpsc::Sender<ProcessOutcome>) {
    debug!("Starting process {}: {} {:?}", name, entry.command, entry.args);

    let spawned = Command::new(&entry.command)
        .args(&entry.args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn();

    let result = match spawned {
        Ok(mut child) => {
            if let Some(pid) = child.id() {
                info!("Started process {} (pid {})", name, pid);
            }
            child.wait().await
        }
        Err(e) => Err(e),
    };

    // The receiver is gone once another process finished first
    let _ = outcomes.send(ProcessOutcome { name, result }).await;
}
