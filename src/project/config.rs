use crate::loader::config::split_search_path;
use crate::loader::LoaderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from a project's own configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub inventory: Vec<PathBuf>,
    #[serde(default)]
    pub roles_path: Vec<PathBuf>,
}

impl ProjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the entries of a colon separated roles path.
    pub fn with_roles_path(mut self, value: &str) -> Self {
        self.roles_path.extend(split_search_path(value));
        self
    }

    pub fn with_inventory(mut self, path: impl Into<PathBuf>) -> Self {
        self.inventory.push(path.into());
        self
    }

    /// `base` with this project's roles path appended. Relative entries are
    /// resolved against `root`.
    pub fn loader_config(&self, root: &Path, base: &LoaderConfig) -> LoaderConfig {
        let mut config = base.clone();
        config
            .roles_path
            .extend(self.roles_path.iter().map(|path| root.join(path)));
        config
    }
}
