//! Default session starter backed by `tokio::process`.
//!
//! Each launched process gets three background tasks: one pump per output
//! pipe and one waiter that owns the `Child`, reaps it, records the exit code
//! and fires the exit notification.

use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{
    exit_channel, CommandSpec, ExitNotifier, ExitSignal, OutputBuffer, Session, SessionStarter,
    EXIT_CODE_RUNNING,
};
use crate::types::{Error, Result};

/// How long the waiter keeps draining pipes after the process exits. A
/// grandchild that inherited the pipes can hold them open indefinitely.
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(1);

const PIPE_CHUNK: usize = 8 * 1024;

/// Launches real OS processes. Must be called from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStarter;

impl SessionStarter for ProcessStarter {
    fn start(
        &self,
        command: &CommandSpec,
        stdout: OutputBuffer,
        stderr: OutputBuffer,
    ) -> Result<Box<dyn Session>> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::launch(format!("{}: {}", command.program.display(), e)))?;

        let pid = child.id();
        let mut pumps = Vec::with_capacity(2);
        if let Some(pipe) = child.stdout.take() {
            pumps.push(tokio::spawn(pump(pipe, stdout.clone())));
        }
        if let Some(pipe) = child.stderr.take() {
            pumps.push(tokio::spawn(pump(pipe, stderr)));
        }

        let exit_code = Arc::new(AtomicI32::new(EXIT_CODE_RUNNING));
        let (notifier, exited) = exit_channel();
        let (terminate_tx, terminate_rx) = mpsc::unbounded_channel();

        tokio::spawn(wait_for_exit(
            child,
            pid,
            terminate_rx,
            pumps,
            exit_code.clone(),
            notifier,
        ));

        tracing::debug!(pid = ?pid, command = %command, "session_started");

        Ok(Box::new(ProcessSession {
            stdout,
            exit_code,
            exited,
            terminate_tx,
        }))
    }
}

/// A running (or exited) OS process.
#[derive(Debug)]
pub struct ProcessSession {
    stdout: OutputBuffer,
    exit_code: Arc<AtomicI32>,
    exited: ExitSignal,
    terminate_tx: mpsc::UnboundedSender<()>,
}

impl Session for ProcessSession {
    fn buffer(&self) -> OutputBuffer {
        self.stdout.clone()
    }

    fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::SeqCst)
    }

    fn terminate(&self) -> ExitSignal {
        // The waiter is gone once the process has been reaped; the signal
        // has already fired in that case.
        let _ = self.terminate_tx.send(());
        self.exited.clone()
    }
}

async fn pump<R>(mut pipe: R, sink: OutputBuffer)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; PIPE_CHUNK];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => sink.append(&chunk[..n]),
        }
    }
    sink.close();
}

async fn wait_for_exit(
    mut child: Child,
    pid: Option<u32>,
    mut terminate_rx: mpsc::UnboundedReceiver<()>,
    pumps: Vec<JoinHandle<()>>,
    exit_code: Arc<AtomicI32>,
    notifier: ExitNotifier,
) {
    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            Some(()) = terminate_rx.recv() => send_terminate(&mut child, pid),
        }
    };

    for handle in pumps {
        let _ = tokio::time::timeout(PIPE_DRAIN_GRACE, handle).await;
    }

    let code = match status {
        Ok(status) => code_from_status(status),
        Err(e) => {
            tracing::warn!(pid = ?pid, "wait_failed: {}", e);
            EXIT_CODE_RUNNING
        }
    };
    exit_code.store(code, Ordering::SeqCst);
    notifier.notify();

    tracing::debug!(pid = ?pid, code, "session_exited");
}

/// Exit code, or `128 + signal` for signalled processes (shell convention).
fn code_from_status(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    EXIT_CODE_RUNNING
}

// The child has not been reaped while this runs, so `pid` cannot have been
// recycled.
#[cfg(unix)]
fn send_terminate(child: &mut Child, pid: Option<u32>) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match pid.and_then(|raw| i32::try_from(raw).ok()) {
        Some(raw) => {
            if let Err(e) = kill(Pid::from_raw(raw), Signal::SIGTERM) {
                tracing::debug!(pid = raw, "sigterm_failed: {}", e);
            }
        }
        None => {
            let _ = child.start_kill();
        }
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child, _pid: Option<u32>) {
    let _ = child.start_kill();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("/bin/sh", vec!["-c".to_string(), script.to_string()])
    }

    async fn wait_for_natural_exit(session: &dyn Session) -> i32 {
        for _ in 0..500 {
            let code = session.exit_code();
            if code != EXIT_CODE_RUNNING {
                return code;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("process did not exit");
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr_separately() {
        let stdout = OutputBuffer::new();
        let stderr = OutputBuffer::new();
        let session = ProcessStarter
            .start(&sh("echo out; echo err >&2"), stdout.clone(), stderr.clone())
            .unwrap();

        assert_eq!(wait_for_natural_exit(session.as_ref()).await, 0);

        assert!(stdout.contains("out"));
        assert!(!stdout.contains("err"));
        assert!(stderr.contains("err"));
        assert!(session.buffer().contains("out"));
    }

    #[tokio::test]
    async fn test_exit_code_sentinel_until_exit() {
        let session = ProcessStarter
            .start(&sh("exec sleep 30"), OutputBuffer::new(), OutputBuffer::new())
            .unwrap();
        assert_eq!(session.exit_code(), EXIT_CODE_RUNNING);

        let exited = session.terminate();
        tokio::time::timeout(Duration::from_secs(5), exited.exited())
            .await
            .unwrap();

        // SIGTERM
        assert_eq!(session.exit_code(), 128 + 15);
    }

    #[tokio::test]
    async fn test_reports_plain_exit_code() {
        let session = ProcessStarter
            .start(&sh("exit 3"), OutputBuffer::new(), OutputBuffer::new())
            .unwrap();

        assert_eq!(wait_for_natural_exit(session.as_ref()).await, 3);

        // Terminating an already-finished process just hands back the signal.
        let exited = session.terminate();
        tokio::time::timeout(Duration::from_secs(5), exited.exited())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let err = ProcessStarter
            .start(
                &CommandSpec::new("/no/such/binary", vec![]),
                OutputBuffer::new(),
                OutputBuffer::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Launch(_)));
    }
}
