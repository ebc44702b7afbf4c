//! Resource collaborators consumed by the supervisor.
//!
//! Each is a narrow capability trait with a default implementation:
//! - **Addresses**: [`AddressManager`] / [`DefaultAddressManager`]
//! - **Data directories**: [`DataDirManager`] / [`TempDirManager`]
//! - **Binaries**: [`default_bin_path`]

pub mod address;
pub mod binaries;
pub mod data_dir;

pub use address::{AddressManager, DefaultAddressManager};
pub use binaries::{asset_env_var, default_bin_path};
pub use data_dir::{DataDirManager, TempDirManager};

#[cfg(test)]
pub use address::MockAddressManager;
#[cfg(test)]
pub use data_dir::MockDataDirManager;
