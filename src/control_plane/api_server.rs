//! API server member: brings up its own etcd, then kube-apiserver on top.

use async_trait::async_trait;

use super::ControlPlaneProcess;
use crate::supervisor::{ApiServerProfile, Etcd, EtcdProfile, Supervisor};
use crate::types::{Config, Result};

/// kube-apiserver together with the etcd it stores into.
#[derive(Debug)]
pub struct ApiServer {
    etcd: Etcd,
    server: Supervisor<ApiServerProfile>,
}

impl ApiServer {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self::from_parts(
            Etcd::builder(EtcdProfile).config(config.etcd.clone()).build(),
            Supervisor::builder(ApiServerProfile::default())
                .config(config.api_server.clone())
                .build(),
        )
    }

    /// Assemble from pre-built supervisors (custom collaborators, fakes).
    pub fn from_parts(etcd: Etcd, server: Supervisor<ApiServerProfile>) -> Self {
        Self { etcd, server }
    }

    pub fn etcd(&self) -> &Etcd {
        &self.etcd
    }

    pub fn server(&self) -> &Supervisor<ApiServerProfile> {
        &self.server
    }
}

impl Default for ApiServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlPlaneProcess for ApiServer {
    /// Start etcd, point the API server at it, start the API server.
    async fn start(&mut self) -> Result<()> {
        self.etcd.start().await?;
        let etcd_url = self.etcd.url()?;
        self.server.profile_mut().etcd_url = Some(etcd_url);
        self.server.start().await
    }

    /// Stop the API server, then etcd. Both are attempted; the first error
    /// wins.
    async fn stop(&mut self) -> Result<()> {
        let server = self.server.stop().await;
        let etcd = self.etcd.stop().await;
        server.and(etcd)
    }

    fn url(&self) -> Result<String> {
        self.server.url()
    }
}
