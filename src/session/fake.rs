//! Scripted sessions for unit tests.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    exit_channel, CommandSpec, ExitNotifier, ExitSignal, OutputBuffer, Session, SessionStarter,
    EXIT_CODE_RUNNING,
};
use crate::types::{Error, Result};

/// Shared log of launches and terminations, in order.
pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone, Copy)]
pub(crate) enum OnTerminate {
    Exit(i32),
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeStarter {
    name: String,
    stderr_line: Option<(Duration, String)>,
    launch_error: Option<String>,
    on_terminate: OnTerminate,
    events: EventLog,
}

impl FakeStarter {
    /// Writes `line` to stderr `delay` after launch, exits 0 on terminate.
    pub(crate) fn ready_after(delay: Duration, line: impl Into<String>) -> Self {
        Self {
            name: "fake".to_string(),
            stderr_line: Some((delay, line.into())),
            launch_error: None,
            on_terminate: OnTerminate::Exit(0),
            events: EventLog::default(),
        }
    }

    /// Never writes anything.
    pub(crate) fn silent() -> Self {
        Self {
            stderr_line: None,
            ..Self::ready_after(Duration::ZERO, "")
        }
    }

    pub(crate) fn failing(message: impl Into<String>) -> Self {
        Self {
            launch_error: Some(message.into()),
            ..Self::silent()
        }
    }

    pub(crate) fn hang_on_terminate(mut self) -> Self {
        self.on_terminate = OnTerminate::Hang;
        self
    }

    pub(crate) fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub(crate) fn with_events(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn launched(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with(&format!("launch {}", self.name)))
            .count()
    }

    pub(crate) fn terminated(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with(&format!("terminate {}", self.name)))
            .count()
    }
}

impl SessionStarter for FakeStarter {
    fn start(
        &self,
        _command: &CommandSpec,
        stdout: OutputBuffer,
        stderr: OutputBuffer,
    ) -> Result<Box<dyn Session>> {
        if let Some(message) = &self.launch_error {
            return Err(Error::launch(message.clone()));
        }
        self.events.lock().unwrap().push(format!("launch {}", self.name));

        if let Some((delay, line)) = self.stderr_line.clone() {
            if delay.is_zero() {
                stderr.append(line.as_bytes());
            } else {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    stderr.append(line.as_bytes());
                });
            }
        }

        let (notifier, exited) = exit_channel();
        Ok(Box::new(FakeSession {
            name: self.name.clone(),
            stdout,
            exit_code: Arc::new(AtomicI32::new(EXIT_CODE_RUNNING)),
            notifier: Mutex::new(Some(notifier)),
            exited,
            on_terminate: self.on_terminate,
            events: self.events.clone(),
        }))
    }
}

#[derive(Debug)]
pub(crate) struct FakeSession {
    name: String,
    stdout: OutputBuffer,
    exit_code: Arc<AtomicI32>,
    notifier: Mutex<Option<ExitNotifier>>,
    exited: ExitSignal,
    on_terminate: OnTerminate,
    events: EventLog,
}

impl Session for FakeSession {
    fn buffer(&self) -> OutputBuffer {
        self.stdout.clone()
    }

    fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::SeqCst)
    }

    fn terminate(&self) -> ExitSignal {
        self.events
            .lock()
            .unwrap()
            .push(format!("terminate {}", self.name));

        if let OnTerminate::Exit(code) = self.on_terminate {
            self.exit_code.store(code, Ordering::SeqCst);
            if let Some(notifier) = self.notifier.lock().unwrap().take() {
                notifier.notify();
            }
        }
        self.exited.clone()
    }
}
