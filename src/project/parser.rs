use crate::loader::data_loader::is_yaml_file;
use crate::loader::{DataLoader, LoaderConfig};
use crate::project::{Project, ProjectConfig, ProjectError};
use crate::template::JinjaTemplater;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MAIN_PLAYBOOK_STEM: &str = "site";

/// Builds [`Project`]s from a directory tree.
#[derive(Debug, Clone, Default)]
pub struct ProjectParser {
    config: ProjectConfig,
    loader_config: LoaderConfig,
}

impl ProjectParser {
    pub fn new(config: ProjectConfig) -> Self {
        Self {
            config,
            loader_config: LoaderConfig::default(),
        }
    }

    /// Search directories consulted before the project's own roles path.
    pub fn with_loader_config(mut self, loader_config: LoaderConfig) -> Self {
        self.loader_config = loader_config;
        self
    }

    /// Parses one project rooted at `root`. With no `playbooks`, every YAML
    /// file directly under the root is tried and those that are not
    /// playbooks are skipped. Relative playbook paths are taken from `root`.
    pub fn parse_project(
        &self,
        root: impl AsRef<Path>,
        playbooks: &[PathBuf],
    ) -> Result<Project, ProjectError> {
        let root = root.as_ref();
        let mut project = self.init_project(root)?;

        let paths = if playbooks.is_empty() {
            root_playbooks(root)?
        } else {
            playbooks.iter().map(|path| root.join(path)).collect()
        };

        for path in paths {
            let playbook = project.loader.load_playbook(None, &path)?;
            if playbook.is_empty() {
                debug!("No plays in {}", path.display());
                continue;
            }
            project.add_playbook(playbook, is_main_playbook(&path));
        }

        info!(
            "Parsed project {} ({} playbooks)",
            root.display(),
            project.playbooks().len() + usize::from(project.main_playbook().is_some())
        );
        Ok(project)
    }

    /// Parses one project per playbook, each with its own loader.
    pub fn parse(
        &self,
        root: impl AsRef<Path>,
        playbooks: &[PathBuf],
    ) -> Result<Vec<Project>, ProjectError> {
        let root = root.as_ref();
        playbooks
            .iter()
            .map(|playbook| self.parse_project(root, std::slice::from_ref(playbook)))
            .collect()
    }

    fn init_project(&self, root: &Path) -> Result<Project, ProjectError> {
        let loader_config = self.config.loader_config(root, &self.loader_config);
        let loader = DataLoader::new(root, loader_config);
        Ok(Project::new(
            root.to_path_buf(),
            self.config.clone(),
            loader,
            Box::new(JinjaTemplater::new()?),
        ))
    }
}

fn root_playbooks(root: &Path) -> Result<Vec<PathBuf>, ProjectError> {
    let entries = fs::read_dir(root).map_err(|source| ProjectError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ProjectError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_yaml_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_main_playbook(path: &Path) -> bool {
    is_yaml_file(path)
        && path.file_stem().and_then(|stem| stem.to_str()) == Some(MAIN_PLAYBOOK_STEM)
}
