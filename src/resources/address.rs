//! Client address allocation.

use std::net::TcpListener;

use crate::types::{Error, Result};

/// Hands out a host/port pair for a process to listen on.
#[cfg_attr(test, mockall::automock)]
pub trait AddressManager: Send + Sync {
    /// Reserve an address. Returns `(port, host)`.
    fn initialize(&mut self) -> Result<(u16, String)>;

    /// Port from the last successful `initialize`.
    fn port(&self) -> Result<u16>;

    /// Host from the last successful `initialize`.
    fn host(&self) -> Result<String>;
}

/// Picks a free ephemeral port on a fixed host (`127.0.0.1` by default).
///
/// The probe socket is released before returning, so another process can in
/// principle grab the port before the supervised process binds it.
#[derive(Debug, Clone)]
pub struct DefaultAddressManager {
    host: String,
    port: Option<u16>,
}

impl DefaultAddressManager {
    pub fn new() -> Self {
        Self::with_host("127.0.0.1")
    }

    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
        }
    }
}

impl Default for DefaultAddressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressManager for DefaultAddressManager {
    fn initialize(&mut self) -> Result<(u16, String)> {
        let listener = TcpListener::bind((self.host.as_str(), 0)).map_err(|e| {
            Error::allocation(format!("cannot bind ephemeral port on {}: {}", self.host, e))
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| Error::allocation(format!("cannot read bound address: {}", e)))?
            .port();
        drop(listener);

        self.port = Some(port);
        Ok((port, self.host.clone()))
    }

    fn port(&self) -> Result<u16> {
        self.port
            .ok_or_else(|| Error::not_initialized("address manager has not allocated a port"))
    }

    fn host(&self) -> Result<String> {
        if self.port.is_none() {
            return Err(Error::not_initialized(
                "address manager has not allocated a host",
            ));
        }
        Ok(self.host.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_fail_before_initialize() {
        let manager = DefaultAddressManager::new();
        assert!(matches!(manager.port(), Err(Error::NotInitialized(_))));
        assert!(matches!(manager.host(), Err(Error::NotInitialized(_))));
    }

    #[test]
    fn test_initialize_allocates_ephemeral_port() {
        let mut manager = DefaultAddressManager::new();
        let (port, host) = manager.initialize().unwrap();

        assert_ne!(port, 0);
        assert_eq!(host, "127.0.0.1");
        assert_eq!(manager.port().unwrap(), port);
        assert_eq!(manager.host().unwrap(), host);
    }

    #[test]
    fn test_port_is_free_after_initialize() {
        let mut manager = DefaultAddressManager::new();
        let (port, host) = manager.initialize().unwrap();

        assert!(TcpListener::bind((host.as_str(), port)).is_ok());
    }

    #[test]
    fn test_reinitialize_replaces_address() {
        let mut manager = DefaultAddressManager::new();
        manager.initialize().unwrap();
        let (port, _) = manager.initialize().unwrap();

        assert_eq!(manager.port().unwrap(), port);
    }

    #[test]
    fn test_non_local_host_is_allocation_error() {
        let mut manager = DefaultAddressManager::with_host("192.0.2.1");
        assert!(matches!(manager.initialize(), Err(Error::Allocation(_))));
        assert!(manager.port().is_err());
    }
}
