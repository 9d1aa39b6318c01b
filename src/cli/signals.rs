//! OS signals mapped onto recording controls

use colored::Colorize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::RecordControl;

/// Forwards OS signals to a running recording.
///
/// SIGINT and SIGTERM request a graceful stop; on unix SIGUSR1 toggles
/// pause. Dropping the handler stops listening.
pub struct ControlSignals {
    tasks: Vec<JoinHandle<()>>,
}

impl ControlSignals {
    /// Start listening. Returns the handler and the control stream.
    pub fn setup() -> Result<(Self, mpsc::Receiver<RecordControl>), std::io::Error> {
        let (tx, rx) = mpsc::channel(8);
        let tasks = install(tx)?;
        Ok((Self { tasks }, rx))
    }
}

impl Drop for ControlSignals {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(unix)]
fn install(tx: mpsc::Sender<RecordControl>) -> Result<Vec<JoinHandle<()>>, std::io::Error> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut tasks = Vec::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let mut stream = signal(kind)?;
        let tx = tx.clone();
        tasks.push(tokio::spawn(async move {
            while stream.recv().await.is_some() {
                eprintln!("\n{} Received {}, stopping", "↓".cyan(), name);
                if tx.send(RecordControl::Stop).await.is_err() {
                    break;
                }
            }
        }));
    }

    let mut usr1 = signal(SignalKind::user_defined1())?;
    tasks.push(tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            debug!("SIGUSR1: toggling pause");
            if tx.send(RecordControl::TogglePause).await.is_err() {
                break;
            }
        }
    }));

    Ok(tasks)
}

#[cfg(not(unix))]
fn install(tx: mpsc::Sender<RecordControl>) -> Result<Vec<JoinHandle<()>>, std::io::Error> {
    let task = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{} Received Ctrl+C, stopping", "↓".cyan());
            if tx.send(RecordControl::Stop).await.is_err() {
                break;
            }
        }
    });
    Ok(vec![task])
}
