//! Launch profiles: what differs between supervised binaries.
//!
//! A profile turns an allocated endpoint and data directory into an argument
//! vector, and names the stderr line that means "ready".

use std::path::Path;

/// Allocated client address of a supervised process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Client URL, `http://<host>:<port>`.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Binary-specific part of a supervisor.
pub trait LaunchProfile: Send + Sync {
    /// Short name used in errors and logs.
    fn name(&self) -> &str;

    /// Name handed to the binary resolver.
    fn binary_name(&self) -> &str {
        self.name()
    }

    /// Full argument vector for one run.
    fn args(&self, endpoint: &Endpoint, data_dir: &Path) -> Vec<String>;

    /// Substring whose appearance on stderr marks the process as ready.
    fn readiness_marker(&self, endpoint: &Endpoint) -> String;
}

/// etcd, listening for clients on the allocated endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct EtcdProfile;

impl LaunchProfile for EtcdProfile {
    fn name(&self) -> &str {
        "etcd"
    }

    fn args(&self, endpoint: &Endpoint, data_dir: &Path) -> Vec<String> {
        let client_url = endpoint.url();
        vec![
            "--debug".to_string(),
            "--listen-peer-urls=http://localhost:0".to_string(),
            format!("--advertise-client-urls={}", client_url),
            format!("--listen-client-urls={}", client_url),
            format!("--data-dir={}", data_dir.display()),
        ]
    }

    fn readiness_marker(&self, endpoint: &Endpoint) -> String {
        format!("serving insecure client requests on {}", endpoint.host)
    }
}

/// kube-apiserver serving plain HTTP on the allocated endpoint.
///
/// `etcd_url` is filled in by the owner once its etcd is up; the flag is
/// omitted while unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiServerProfile {
    pub etcd_url: Option<String>,
}

impl LaunchProfile for ApiServerProfile {
    fn name(&self) -> &str {
        "kube-apiserver"
    }

    fn args(&self, endpoint: &Endpoint, data_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "--admission-control=AlwaysAdmit".to_string(),
            "--storage-backend=etcd3".to_string(),
        ];
        if let Some(etcd_url) = &self.etcd_url {
            args.push(format!("--etcd-servers={}", etcd_url));
        }
        args.extend([
            format!("--cert-dir={}", data_dir.display()),
            format!("--insecure-port={}", endpoint.port),
            format!("--insecure-bind-address={}", endpoint.host),
        ]);
        args
    }

    fn readiness_marker(&self, endpoint: &Endpoint) -> String {
        format!("Serving insecure on {}:{}", endpoint.host, endpoint.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(Endpoint::new("localhost", 0).url(), "http://localhost:0");
        assert_eq!(Endpoint::new("127.0.0.1", 2379).url(), "http://127.0.0.1:2379");
    }

    #[test]
    fn test_etcd_args() {
        let endpoint = Endpoint::new("127.0.0.1", 2379);
        let args = EtcdProfile.args(&endpoint, Path::new("/tmp/etcd-data"));

        assert_eq!(
            args,
            vec![
                "--debug",
                "--listen-peer-urls=http://localhost:0",
                "--advertise-client-urls=http://127.0.0.1:2379",
                "--listen-client-urls=http://127.0.0.1:2379",
                "--data-dir=/tmp/etcd-data",
            ]
        );
    }

    #[test]
    fn test_etcd_marker_names_host_only() {
        let endpoint = Endpoint::new("127.0.0.1", 2379);
        assert_eq!(
            EtcdProfile.readiness_marker(&endpoint),
            "serving insecure client requests on 127.0.0.1"
        );
    }

    #[test]
    fn test_api_server_args_with_etcd() {
        let profile = ApiServerProfile {
            etcd_url: Some("http://127.0.0.1:2379".to_string()),
        };
        let args = profile.args(&Endpoint::new("127.0.0.1", 8080), Path::new("/tmp/certs"));

        assert_eq!(
            args,
            vec![
                "--admission-control=AlwaysAdmit",
                "--storage-backend=etcd3",
                "--etcd-servers=http://127.0.0.1:2379",
                "--cert-dir=/tmp/certs",
                "--insecure-port=8080",
                "--insecure-bind-address=127.0.0.1",
            ]
        );
        assert_eq!(profile.binary_name(), "kube-apiserver");
    }

    #[test]
    fn test_api_server_omits_unset_etcd() {
        let args = ApiServerProfile::default().args(&Endpoint::new("h", 1), Path::new("/d"));
        assert!(!args.iter().any(|a| a.starts_with("--etcd-servers")));
    }
}
