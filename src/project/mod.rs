//! A parsed project: its playbooks plus the loader and templater used to
//! expand them.

pub mod config;
pub mod error;
pub mod parser;

pub use config::ProjectConfig;
pub use error::ProjectError;
pub use parser::ProjectParser;

use crate::compiler::Compiler;
use crate::loader::DataLoader;
use crate::model::{Module, Playbook, ProjectGraph, TaskId};
use crate::template::Templater;
use crate::variables::Variables;
use std::path::{Path, PathBuf};

pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    main_playbook: Option<Playbook>,
    playbooks: Vec<Playbook>,
    loader: DataLoader,
    templater: Box<dyn Templater>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("main_playbook", &self.main_playbook)
            .field("playbooks", &self.playbooks)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl Project {
    pub(crate) fn new(
        root: PathBuf,
        config: ProjectConfig,
        loader: DataLoader,
        templater: Box<dyn Templater>,
    ) -> Self {
        Self {
            root,
            config,
            main_playbook: None,
            playbooks: Vec::new(),
            loader,
            templater,
        }
    }

    /// Replaces the templater used to render include targets and module
    /// parameters.
    pub fn with_templater(mut self, templater: Box<dyn Templater>) -> Self {
        self.templater = templater;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// The `site.yml` playbook, when the project has one.
    pub fn main_playbook(&self) -> Option<&Playbook> {
        self.main_playbook.as_ref()
    }

    pub fn playbooks(&self) -> &[Playbook] {
        &self.playbooks
    }

    pub fn graph(&self) -> &ProjectGraph {
        self.loader.graph()
    }

    pub fn loader(&self) -> &DataLoader {
        &self.loader
    }

    pub(crate) fn add_playbook(&mut self, playbook: Playbook, main: bool) {
        if main {
            self.main_playbook = Some(playbook);
        } else {
            self.playbooks.push(playbook);
        }
    }

    pub fn compiler(&mut self) -> Compiler<'_> {
        Compiler::new(&mut self.loader, self.templater.as_ref())
    }

    /// Every leaf task the project would run, in execution order: the main
    /// playbook's when there is one, otherwise each playbook's in turn.
    pub fn list_tasks(&mut self) -> Result<Vec<TaskId>, ProjectError> {
        let playbooks: Vec<Playbook> = match &self.main_playbook {
            Some(main) => vec![main.clone()],
            None => self.playbooks.clone(),
        };

        let mut compiler = self.compiler();
        let mut tasks = Vec::new();
        for playbook in &playbooks {
            tasks.extend(compiler.compile_playbook(playbook)?);
        }
        Ok(tasks)
    }

    pub fn task_vars(&mut self, task: TaskId) -> Result<Variables, ProjectError> {
        Ok(self.compiler().task_vars(task)?)
    }

    pub fn module(&mut self, task: TaskId, name: &str) -> Result<Option<Module>, ProjectError> {
        Ok(self.compiler().module(task, name)?)
    }
}
