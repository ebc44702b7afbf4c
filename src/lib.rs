//! # Kube Testenv - Ephemeral Control Plane Supervisor
//!
//! Launches etcd and kube-apiserver as disposable child processes for
//! integration tests:
//! - Readiness detection by watching live stderr for a marker line
//! - Bounded start and stop via timeout races (no polling)
//! - Per-run address and data directory allocation with cleanup on stop
//! - Swappable collaborators (address manager, data dir manager, session starter)
//!
//! ## Architecture
//!
//! ```text
//!   ControlPlane ──start/stop/url──▶ ApiServer
//!                                     ├── Supervisor<EtcdProfile>
//!                                     └── Supervisor<ApiServerProfile>
//!                                              │
//!                          ┌───────────────────┼────────────────────┐
//!                    AddressManager     DataDirManager      SessionStarter
//!                                                                   │
//!                                                      Session + OutputBuffer
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod control_plane;
pub mod resources;
pub mod session;
pub mod supervisor;
pub mod types;

// Internal utilities
pub mod observability;

pub use control_plane::{ApiServer, ControlPlane, ControlPlaneProcess};
pub use supervisor::{Etcd, Supervisor, SupervisorState};
pub use types::{Config, Error, ProcessConfig, Result};
