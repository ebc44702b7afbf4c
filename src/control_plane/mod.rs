//! Control plane - a single Start/Stop/URL facade for integration tests.
//!
//! The facade does not sequence members itself: the API server member's
//! `start` is responsible for bringing up everything it depends on.

use async_trait::async_trait;
use std::fmt;

use crate::supervisor::{LaunchProfile, Supervisor};
use crate::types::{Config, Result};

pub mod api_server;

pub use api_server::ApiServer;

/// Something that can be started, stopped, and connected to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlPlaneProcess: Send + Sync {
    async fn start(&mut self) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
    fn url(&self) -> Result<String>;
}

#[async_trait]
impl<P: LaunchProfile + 'static> ControlPlaneProcess for Supervisor<P> {
    async fn start(&mut self) -> Result<()> {
        Supervisor::start(self).await
    }

    async fn stop(&mut self) -> Result<()> {
        Supervisor::stop(self).await
    }

    fn url(&self) -> Result<String> {
        Supervisor::url(self)
    }
}

/// Your test control plane: etcd plus an API server.
pub struct ControlPlane {
    api_server: Box<dyn ControlPlaneProcess>,
}

impl ControlPlane {
    /// Control plane wired with a default [`ApiServer`].
    pub fn new() -> Self {
        Self::with_api_server(ApiServer::new())
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_api_server(ApiServer::from_config(config))
    }

    pub fn with_api_server(api_server: impl ControlPlaneProcess + 'static) -> Self {
        Self {
            api_server: Box::new(api_server),
        }
    }

    /// Start the control plane. Call [`stop`](Self::stop) to tear it down,
    /// including after a failed start.
    pub async fn start(&mut self) -> Result<()> {
        self.api_server.start().await
    }

    /// Stop the control plane and clean up its data.
    pub async fn stop(&mut self) -> Result<()> {
        self.api_server.stop().await
    }

    /// URL clients use to reach the API server.
    pub fn api_server_url(&self) -> Result<String> {
        self.api_server.url()
    }
}

impl Default for ControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ControlPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPlane").finish_non_exhaustive()
    }
}
