//! Spawned capture process
//!
//! The child is owned by a waiter task that reaps it and publishes the exit
//! status on a watch channel, so any number of observers can await the exit
//! while the handle stays usable for signalling.

use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

use crate::application::ports::CaptureError;
use crate::domain::capture::Platform;

/// Signals the supervisor sends to the capture process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSignal {
    /// Suspend (pause)
    Stop,
    /// Continue after [`ProcessSignal::Stop`]
    Continue,
    /// Graceful termination; ffmpeg finalizes the file
    Interrupt,
}

impl ProcessSignal {
    #[cfg(unix)]
    fn as_nix(self) -> Signal {
        match self {
            Self::Stop => Signal::SIGSTOP,
            Self::Continue => Signal::SIGCONT,
            Self::Interrupt => Signal::SIGINT,
        }
    }
}

/// How the process ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

/// Observer of the process exit
#[derive(Debug, Clone)]
pub struct ExitWatch(watch::Receiver<Option<ProcessExit>>);

impl ExitWatch {
    /// Resolves once the process has exited and been reaped
    pub async fn wait(&mut self) -> ProcessExit {
        match self.0.wait_for(Option::is_some).await {
            Ok(exit) => (*exit).unwrap_or_default(),
            // Waiter task gone without reporting; treat as exited
            Err(_) => ProcessExit::default(),
        }
    }

    pub fn get(&self) -> Option<ProcessExit> {
        *self.0.borrow()
    }

    /// A watch that only resolves through the returned sender
    #[cfg(test)]
    pub(crate) fn detached() -> (watch::Sender<Option<ProcessExit>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self(rx))
    }
}

/// Output streams handed to the diagnostic readers
pub struct ProcessOutput {
    pub stdout: Option<ChildStdout>,
    pub stderr: Option<ChildStderr>,
}

/// Handle to a running capture process. Dropping it kills the process.
pub struct ProcessHandle {
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    kill_tx: Option<oneshot::Sender<()>>,
    exit: ExitWatch,
}

impl ProcessHandle {
    /// Spawn `program` with piped output. Stdin is piped only where graceful
    /// stop goes through it.
    pub fn spawn(
        program: &str,
        args: &[String],
        platform: Platform,
    ) -> Result<(Self, ProcessOutput), CaptureError> {
        let stdin = if platform.supports_signals() {
            Stdio::null()
        } else {
            Stdio::piped()
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group: a terminal Ctrl+C reaches only the supervisor,
        // which then stops the child itself
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CaptureError::ToolNotFound {
                    program: program.to_string(),
                }
            } else {
                CaptureError::SpawnFailed(e.to_string())
            }
        })?;

        let pid = child.id();
        let output = ProcessOutput {
            stdout: child.stdout.take(),
            stderr: child.stderr.take(),
        };
        let stdin = child.stdin.take();

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let (exit_tx, exit_rx) = watch::channel(None);

        tokio::spawn(async move {
            // A dropped sender also counts as a kill request
            let exited = tokio::select! {
                status = child.wait() => Some(status),
                _ = kill_rx => None,
            };
            let status = match exited {
                Some(status) => status,
                None => {
                    if let Err(e) = child.start_kill() {
                        debug!(error = %e, "Kill failed, process likely already gone");
                    }
                    child.wait().await
                }
            };
            let exit = match status {
                Ok(status) => ProcessExit::from(status),
                Err(e) => {
                    warn!(error = %e, "Failed to reap capture process");
                    ProcessExit::default()
                }
            };
            debug!(pid = ?pid, code = ?exit.code, signal = ?exit.signal, "Capture process exited");
            let _ = exit_tx.send(Some(exit));
        });

        debug!(pid = ?pid, %program, "Spawned capture process");

        Ok((
            Self {
                pid,
                stdin,
                kill_tx: Some(kill_tx),
                exit: ExitWatch(exit_rx),
            },
            output,
        ))
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn exit_watch(&self) -> ExitWatch {
        self.exit.clone()
    }

    pub fn has_exited(&self) -> bool {
        self.exit.get().is_some()
    }

    /// Exit not yet observed and, on unix, the pid still answers signal 0
    pub fn is_alive(&self) -> bool {
        if self.has_exited() {
            return false;
        }
        #[cfg(unix)]
        {
            match self.pid {
                Some(pid) => signal::kill(Pid::from_raw(pid as i32), None).is_ok(),
                None => false,
            }
        }
        #[cfg(not(unix))]
        {
            true
        }
    }

    /// Deliver `sig` to the process
    pub fn signal(&self, sig: ProcessSignal) -> Result<(), CaptureError> {
        if self.has_exited() {
            return Err(CaptureError::Io("capture process has already exited".to_string()));
        }

        #[cfg(unix)]
        {
            let pid = self
                .pid
                .ok_or_else(|| CaptureError::Io("capture process has no pid".to_string()))?;
            signal::kill(Pid::from_raw(pid as i32), sig.as_nix())
                .map_err(|e| CaptureError::Io(format!("Signal {:?} failed: {}", sig, e)))
        }

        #[cfg(not(unix))]
        {
            Err(CaptureError::CapabilityNotSupported {
                backend: "ffmpeg".to_string(),
                capability: format!("{:?} signal", sig).to_lowercase(),
            })
        }
    }

    /// Ask ffmpeg to finish by typing `q` on its stdin
    pub async fn request_quit(&mut self) -> Result<(), CaptureError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| CaptureError::Io("capture process stdin is closed".to_string()))?;
        stdin.write_all(b"q").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Graceful stop in the platform's way
    pub async fn request_stop(&mut self, platform: Platform) -> Result<(), CaptureError> {
        if platform.supports_signals() && cfg!(unix) {
            self.signal(ProcessSignal::Interrupt)
        } else {
            self.request_quit().await
        }
    }

    /// Kill without waiting. Idempotent.
    pub fn force_kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
    }

    pub async fn wait(&self) -> ProcessExit {
        self.exit_watch().wait().await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn exit_is_observed() {
        let (handle, _output) = ProcessHandle::spawn("sh", &sh("exit 3"), Platform::Linux).unwrap();
        let exit = handle.wait().await;
        assert_eq!(exit.code, Some(3));
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn missing_program_is_tool_not_found() {
        let err = ProcessHandle::spawn("/nonexistent/capture-tool", &[], Platform::Linux)
            .err()
            .unwrap();
        assert_eq!(err.code(), "tool_not_found");
    }

    #[tokio::test]
    async fn force_kill_terminates_and_is_idempotent() {
        let (mut handle, _output) =
            ProcessHandle::spawn("sh", &sh("sleep 30"), Platform::Linux).unwrap();
        assert!(handle.is_alive());

        handle.force_kill();
        handle.force_kill();

        let exit = tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .unwrap();
        assert!(!exit.success());
    }

    #[tokio::test]
    async fn interrupt_reaches_trap() {
        let (mut handle, _output) = ProcessHandle::spawn(
            "sh",
            &sh("trap 'exit 7' INT; while :; do sleep 0.05; done"),
            Platform::Linux,
        )
        .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        handle.request_stop(Platform::Linux).await.unwrap();
        let exit = tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .unwrap();
        assert_eq!(exit.code, Some(7));
    }

    #[tokio::test]
    async fn child_runs_in_its_own_process_group() {
        use nix::unistd::{getpgid, getpgrp};

        let (mut handle, _output) =
            ProcessHandle::spawn("sh", &sh("sleep 30"), Platform::Linux).unwrap();
        let pid = Pid::from_raw(handle.pid().unwrap() as i32);

        let group = getpgid(Some(pid)).unwrap();
        assert_eq!(group, pid);
        assert_ne!(group, getpgrp());

        handle.force_kill();
    }

    #[tokio::test]
    async fn signal_after_exit_fails() {
        let (handle, _output) = ProcessHandle::spawn("sh", &sh("exit 0"), Platform::Linux).unwrap();
        handle.wait().await;
        assert!(handle.signal(ProcessSignal::Stop).is_err());
    }
}
