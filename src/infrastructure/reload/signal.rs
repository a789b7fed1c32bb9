//! Reload notification via SIGHUP to a co-located collector process.

use std::path::Path;

use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::debug;

use crate::domain::ports::{ReloadError, ReloadNotifier};

/// Finds processes by command name under `/proc` and delivers SIGHUP.
///
/// Works when the collector runs in the same container, as it does with the
/// sidecar deployment. Finding no matching process is not an error; the
/// collector may still be starting and will read the config file on boot.
pub struct SignalReloadNotifier {
    process_name: String,
    proc_root: String,
}

impl SignalReloadNotifier {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            proc_root: "/proc".to_string(),
        }
    }

    #[cfg(test)]
    fn with_proc_root(mut self, root: impl Into<String>) -> Self {
        self.proc_root = root.into();
        self
    }

    fn matching_pids(&self) -> Result<Vec<i32>, ReloadError> {
        let mut pids = Vec::new();
        for entry in std::fs::read_dir(&self.proc_root)? {
            let entry = entry?;
            let Ok(pid) = entry.file_name().to_string_lossy().parse::<i32>() else {
                continue;
            };
            let comm = Path::new(&self.proc_root)
                .join(pid.to_string())
                .join("comm");
            // processes can exit between the listing and the read
            let Ok(name) = std::fs::read_to_string(comm) else {
                continue;
            };
            if name.trim() == self.process_name {
                pids.push(pid);
            }
        }
        Ok(pids)
    }
}

#[async_trait]
impl ReloadNotifier for SignalReloadNotifier {
    async fn notify(&self) -> Result<(), ReloadError> {
        let pids = self.matching_pids()?;
        if pids.is_empty() {
            debug!(process = %self.process_name, "no process to signal");
            return Ok(());
        }
        for pid in pids {
            debug!(pid, process = %self.process_name, "sending SIGHUP");
            kill(Pid::from_raw(pid), Signal::SIGHUP)
                .map_err(|source| ReloadError::Signal { pid, source })?;
        }
        Ok(())
    }
}
