pub mod clean;
pub mod direct;

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub use clean::*;

/// Environment variable naming the active kubeconfig.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("failed to determine home directory; set HOME")]
    NoHome,
}

pub fn home_dir() -> Result<PathBuf, PathError> {
    env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .or_else(|| env::var_os("USERPROFILE").filter(|home| !home.is_empty()))
        .map(PathBuf::from)
        .ok_or(PathError::NoHome)
}

/// Picks the kubeconfig to operate on: the explicit path, then `KUBECONFIG`, then
/// `<home>/.kube/config`.
///
/// For a `KUBECONFIG` list the first entry that `exists` wins, falling back to the first
/// entry when none do. That is the file `kubectl config set-*` writes to. `home` is only
/// consulted when neither of the other sources yields a path.
pub fn resolve_kubeconfig_path(
    explicit: Option<&Path>,
    from_env: Option<&OsStr>,
    exists: impl Fn(&Path) -> bool,
    home: impl FnOnce() -> Result<PathBuf, PathError>,
) -> Result<PathBuf, PathError> {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path.to_path_buf());
    }
    let entries: Vec<PathBuf> = from_env
        .map(|value| {
            env::split_paths(value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();
    if let Some(found) = entries.iter().find(|p| exists(p)) {
        return Ok(found.clone());
    }
    if let Some(first) = entries.into_iter().next() {
        return Ok(first);
    }
    Ok(home()?.join(".kube").join("config"))
}

/// [`resolve_kubeconfig_path`] against the process environment and filesystem.
pub fn kubeconfig_path(explicit: Option<&Path>) -> Result<PathBuf, PathError> {
    resolve_kubeconfig_path(
        explicit,
        env::var_os(KUBECONFIG_ENV).as_deref(),
        Path::exists,
        home_dir,
    )
}
