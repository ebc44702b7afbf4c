//! Process supervisor - owns one external process from launch to cleanup.
//!
//! Lifecycle:
//! ```text
//! UNCONFIGURED → STARTING → {RUNNING | START_FAILED}
//! RUNNING | START_FAILED → STOPPING → {STOPPED | STOP_TIMED_OUT}
//! ```
//!
//! `start` races the readiness marker against the start timeout; `stop` races
//! the exit notification against the stop timeout. Neither path kills a
//! process on timeout and a stop timeout leaves the data directory in place:
//! reclaiming either is the caller's decision.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::resources::{
    default_bin_path, AddressManager, DataDirManager, DefaultAddressManager, TempDirManager,
};
use crate::session::{
    CommandSpec, OutputBuffer, ProcessStarter, Session, SessionStarter, EXIT_CODE_RUNNING,
};
use crate::types::{Error, ProcessConfig, Result, DEFAULT_PROCESS_TIMEOUT};

pub mod profile;

pub use profile::{ApiServerProfile, Endpoint, EtcdProfile, LaunchProfile};

/// Supervisor for an etcd member.
pub type Etcd = Supervisor<EtcdProfile>;

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisorState {
    Unconfigured,
    Starting,
    Running,
    StartFailed,
    Stopping,
    Stopped,
    StopTimedOut,
}

/// Supervises one external process described by a [`LaunchProfile`].
pub struct Supervisor<P> {
    profile: P,
    path: PathBuf,
    start_timeout: Duration,
    stop_timeout: Duration,
    address_manager: Box<dyn AddressManager>,
    data_dir_manager: Box<dyn DataDirManager>,
    session_starter: Box<dyn SessionStarter>,
    state: SupervisorState,
    session: Option<Box<dyn Session>>,
    args: Vec<String>,
    data_dir: Option<PathBuf>,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
}

impl<P: LaunchProfile> Supervisor<P> {
    /// Supervisor with default collaborators and timeouts.
    pub fn new(profile: P) -> Self {
        Self::builder(profile).build()
    }

    pub fn builder(profile: P) -> SupervisorBuilder<P> {
        SupervisorBuilder::new(profile)
    }

    /// Client URL, `http://<host>:<port>`, from the address manager.
    pub fn url(&self) -> Result<String> {
        let port = self.address_manager.port()?;
        let host = self.address_manager.host()?;
        Ok(Endpoint::new(host, port).url())
    }

    /// Launch the process and wait until it reports readiness.
    ///
    /// On `StartTimeout` the session is kept (and the process left running)
    /// so its output and exit code stay inspectable; call [`stop`](Self::stop)
    /// to reclaim it.
    pub async fn start(&mut self) -> Result<()> {
        if !self.can_start() {
            return Err(Error::state_transition(format!(
                "cannot start {}: state is {:?}",
                self.profile.name(),
                self.state
            )));
        }

        // Left behind by a launch error on the previous attempt.
        if self.data_dir.take().is_some() {
            self.data_dir_manager.destroy()?;
        }
        self.session = None;
        self.args.clear();
        self.stdout = OutputBuffer::new();
        self.stderr = OutputBuffer::new();
        self.state = SupervisorState::Starting;

        match self.launch().await {
            Ok(()) => {
                self.state = SupervisorState::Running;
                Ok(())
            }
            Err(e) => {
                self.state = SupervisorState::StartFailed;
                Err(e)
            }
        }
    }

    fn can_start(&self) -> bool {
        match self.state {
            SupervisorState::Unconfigured | SupervisorState::Stopped => true,
            // Launch errors leave no session behind.
            SupervisorState::StartFailed => self.session.is_none(),
            _ => false,
        }
    }

    async fn launch(&mut self) -> Result<()> {
        let (port, host) = self.address_manager.initialize()?;
        let endpoint = Endpoint::new(host, port);

        let data_dir = self.data_dir_manager.create()?;
        self.args = self.profile.args(&endpoint, &data_dir);
        self.data_dir = Some(data_dir);

        // Armed before launch: the marker may be written immediately.
        let detection = self.stderr.detect(self.profile.readiness_marker(&endpoint));
        let timed_out = tokio::time::sleep(self.start_timeout);

        let command = CommandSpec::new(self.path.clone(), self.args.clone());
        tracing::debug!(process = %self.profile.name(), command = %command, "process_launching");
        let session = self
            .session_starter
            .start(&command, self.stdout.clone(), self.stderr.clone())?;
        self.session = Some(session);

        let ready = async {
            // A stream that closes without the marker is not readiness; the
            // timeout decides.
            if !detection.detected().await {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            biased;
            _ = ready => {
                tracing::info!(
                    process = %self.profile.name(),
                    url = %endpoint.url(),
                    "process_ready"
                );
                Ok(())
            }
            _ = timed_out => Err(Error::start_timeout(self.profile.name())),
        }
    }

    /// Terminate the process, wait for it to exit, then remove its data
    /// directory. A no-op when nothing was ever launched.
    ///
    /// Safe to call after a failed start: a timed-out process is terminated
    /// the same way and a launch error only has its data directory removed.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state == SupervisorState::Stopped {
            return Ok(());
        }
        let Some(session) = self.session.as_ref() else {
            // A launch error leaves a data directory but no process.
            if self.data_dir.take().is_some() {
                self.data_dir_manager.destroy()?;
            }
            return Ok(());
        };

        self.state = SupervisorState::Stopping;
        let exited = session.terminate();
        let timed_out = tokio::time::sleep(self.stop_timeout);

        tokio::select! {
            biased;
            _ = exited.exited() => {}
            _ = timed_out => {
                self.state = SupervisorState::StopTimedOut;
                return Err(Error::stop_timeout(self.profile.name()));
            }
        }

        self.state = SupervisorState::Stopped;
        // Cleared first: a failed destroy is never retried for this run.
        self.data_dir = None;
        self.data_dir_manager.destroy()?;

        tracing::info!(
            process = %self.profile.name(),
            exit_code = self.exit_code(),
            "process_stopped"
        );
        Ok(())
    }

    /// Exit code of the session, [`EXIT_CODE_RUNNING`] while it runs or if
    /// nothing was ever launched.
    pub fn exit_code(&self) -> i32 {
        self.session
            .as_ref()
            .map_or(EXIT_CODE_RUNNING, |session| session.exit_code())
    }

    /// The session's output buffer (stdout), if a session exists.
    pub fn buffer(&self) -> Option<OutputBuffer> {
        self.session.as_ref().map(|session| session.buffer())
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Arguments computed by the last `start`.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Data directory of the current run, until a clean stop removes it.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn stdout(&self) -> &OutputBuffer {
        &self.stdout
    }

    pub fn stderr(&self) -> &OutputBuffer {
        &self.stderr
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start_timeout(&self) -> Duration {
        self.start_timeout
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut P {
        &mut self.profile
    }
}

impl<P: fmt::Debug> fmt::Debug for Supervisor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("profile", &self.profile)
            .field("path", &self.path)
            .field("state", &self.state)
            .field("start_timeout", &self.start_timeout)
            .field("stop_timeout", &self.stop_timeout)
            .field("args", &self.args)
            .field("data_dir", &self.data_dir)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Resolves every supervisor setting once, at construction.
pub struct SupervisorBuilder<P> {
    profile: P,
    config: ProcessConfig,
    address_manager: Option<Box<dyn AddressManager>>,
    data_dir_manager: Option<Box<dyn DataDirManager>>,
    session_starter: Option<Box<dyn SessionStarter>>,
}

impl<P: LaunchProfile> SupervisorBuilder<P> {
    fn new(profile: P) -> Self {
        Self {
            profile,
            config: ProcessConfig::default(),
            address_manager: None,
            data_dir_manager: None,
            session_starter: None,
        }
    }

    pub fn config(mut self, config: ProcessConfig) -> Self {
        self.config = config;
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = Some(path.into());
        self
    }

    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.config.start_timeout = timeout;
        self
    }

    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.config.stop_timeout = timeout;
        self
    }

    pub fn address_manager(mut self, manager: impl AddressManager + 'static) -> Self {
        self.address_manager = Some(Box::new(manager));
        self
    }

    pub fn data_dir_manager(mut self, manager: impl DataDirManager + 'static) -> Self {
        self.data_dir_manager = Some(Box::new(manager));
        self
    }

    pub fn session_starter(mut self, starter: impl SessionStarter + 'static) -> Self {
        self.session_starter = Some(Box::new(starter));
        self
    }

    /// Fill every unset field with its default. Zero timeouts count as unset.
    pub fn build(self) -> Supervisor<P> {
        let path = self
            .config
            .path
            .unwrap_or_else(|| default_bin_path(self.profile.binary_name()));

        Supervisor {
            path,
            start_timeout: non_zero_or_default(self.config.start_timeout),
            stop_timeout: non_zero_or_default(self.config.stop_timeout),
            address_manager: self
                .address_manager
                .unwrap_or_else(|| Box::new(DefaultAddressManager::new())),
            data_dir_manager: self
                .data_dir_manager
                .unwrap_or_else(|| Box::new(TempDirManager::new())),
            session_starter: self
                .session_starter
                .unwrap_or_else(|| Box::new(ProcessStarter)),
            profile: self.profile,
            state: SupervisorState::Unconfigured,
            session: None,
            args: Vec::new(),
            data_dir: None,
            stdout: OutputBuffer::new(),
            stderr: OutputBuffer::new(),
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for SupervisorBuilder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisorBuilder")
            .field("profile", &self.profile)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn non_zero_or_default(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_PROCESS_TIMEOUT
    } else {
        timeout
    }
}
