use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables consulted by [`LoaderConfig::from_env`].
pub const ROLES_PATH_ENV_VARS: [&str; 2] = ["DEFAULT_ROLES_PATH", "ANSIBLE_ROLES_PATH"];

/// Loader settings. Everything the loader needs from outside the project
/// tree is passed in here; the loader never reads the environment itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directories searched for `<dir>/<role name>` after `<root>/roles`.
    #[serde(default)]
    pub roles_path: Vec<PathBuf>,
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roles_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.roles_path.push(path.into());
        self
    }

    /// Builds a config from `DEFAULT_ROLES_PATH` and `ANSIBLE_ROLES_PATH`
    /// (colon separated, in that order).
    pub fn from_env() -> Self {
        let roles_path = ROLES_PATH_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .flat_map(|value| split_search_path(&value))
            .collect();
        Self { roles_path }
    }
}

pub(crate) fn split_search_path(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}
