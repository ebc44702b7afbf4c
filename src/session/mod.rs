//! Sessions - handles to launched OS processes.
//!
//! A [`Session`] exposes live output, an exit code and termination. Sessions
//! are produced by a [`SessionStarter`], which the supervisor receives by
//! injection so tests can substitute scripted fakes for real processes.

use std::fmt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::types::Result;

pub mod buffer;
pub mod process;

#[cfg(test)]
pub(crate) mod fake;

pub use buffer::{Detection, OutputBuffer};
pub use process::ProcessStarter;

/// Exit code reported while the process is still running.
pub const EXIT_CODE_RUNNING: i32 = -1;

/// Program and argument vector to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Create a linked exit notifier/signal pair.
pub fn exit_channel() -> (ExitNotifier, ExitSignal) {
    let token = CancellationToken::new();
    (
        ExitNotifier {
            token: token.clone(),
        },
        ExitSignal { token },
    )
}

/// Producer half of the exit notification. Consumed on use, so it can fire
/// at most once.
#[derive(Debug)]
pub struct ExitNotifier {
    token: CancellationToken,
}

impl ExitNotifier {
    /// Announce that the process has fully exited.
    pub fn notify(self) {
        self.token.cancel();
    }
}

/// Observer half of the exit notification.
#[derive(Debug, Clone)]
pub struct ExitSignal {
    token: CancellationToken,
}

impl ExitSignal {
    /// Resolves once the process has exited. Returns immediately afterwards.
    pub async fn exited(&self) {
        self.token.cancelled().await;
    }

    pub fn has_exited(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A started process.
pub trait Session: Send + Sync + fmt::Debug {
    /// Captured standard output. Safe to inspect while the process runs.
    fn buffer(&self) -> OutputBuffer;

    /// Exit code, or [`EXIT_CODE_RUNNING`] before the process has exited.
    fn exit_code(&self) -> i32;

    /// Ask the process to terminate and return its exit notification.
    fn terminate(&self) -> ExitSignal;
}

/// Launches a [`CommandSpec`] and streams its output into the given sinks.
///
/// Implementations must return as soon as the process is spawned; they never
/// wait for it to finish.
pub trait SessionStarter: Send + Sync {
    fn start(
        &self,
        command: &CommandSpec,
        stdout: OutputBuffer,
        stderr: OutputBuffer,
    ) -> Result<Box<dyn Session>>;
}

impl<F> SessionStarter for F
where
    F: Fn(&CommandSpec, OutputBuffer, OutputBuffer) -> Result<Box<dyn Session>> + Send + Sync,
{
    fn start(
        &self,
        command: &CommandSpec,
        stdout: OutputBuffer,
        stderr: OutputBuffer,
    ) -> Result<Box<dyn Session>> {
        self(command, stdout, stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        let command = CommandSpec::new(
            "/usr/bin/etcd",
            vec!["--debug".into(), "--data-dir=/tmp/x".into()],
        );
        assert_eq!(command.to_string(), "/usr/bin/etcd --debug --data-dir=/tmp/x");
    }

    #[tokio::test]
    async fn test_exit_signal_fires_once_for_all_observers() {
        let (notifier, signal) = exit_channel();
        let observer = signal.clone();
        assert!(!signal.has_exited());

        notifier.notify();

        signal.exited().await;
        observer.exited().await;
        assert!(signal.has_exited());
    }
}
