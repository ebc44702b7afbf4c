//! Binary path resolution.

use std::env;
use std::path::PathBuf;

/// Environment variable naming the directory that holds test binaries.
pub const ASSETS_DIR_ENV: &str = "KUBE_TESTENV_ASSETS";

/// Fallback assets directory, relative to the working directory.
pub const DEFAULT_ASSETS_DIR: &str = "assets/bin";

/// Name of the per-binary override variable, e.g. `TEST_ASSET_KUBE_APISERVER`.
pub fn asset_env_var(name: &str) -> String {
    format!("TEST_ASSET_{}", name.to_uppercase().replace('-', "_"))
}

/// Resolve a binary by name.
///
/// `TEST_ASSET_<NAME>` wins when set and non-empty; otherwise the binary is
/// looked up as `<assets dir>/<name>`.
pub fn default_bin_path(name: &str) -> PathBuf {
    if let Some(path) = env::var_os(asset_env_var(name)).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }

    env::var_os(ASSETS_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR))
        .join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_env_var() {
        assert_eq!(asset_env_var("etcd"), "TEST_ASSET_ETCD");
        assert_eq!(asset_env_var("kube-apiserver"), "TEST_ASSET_KUBE_APISERVER");
    }

    #[test]
    fn test_env_override_wins() {
        let name = "testenv-override-probe";
        env::set_var(asset_env_var(name), "/opt/custom/probe");

        assert_eq!(default_bin_path(name), PathBuf::from("/opt/custom/probe"));
        env::remove_var(asset_env_var(name));
    }

    #[test]
    fn test_falls_back_to_assets_dir() {
        let path = default_bin_path("testenv-unset-probe");
        assert!(path.ends_with("testenv-unset-probe"));
    }
}
