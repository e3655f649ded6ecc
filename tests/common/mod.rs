//! Project fixtures shared by the integration tests

#![allow(dead_code)]

use rustle_expand::{
    CompileError, Compiler, DataLoader, JinjaTemplater, LoaderConfig, ProjectGraph, TaskId,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// A project tree in a temporary directory.
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("Failed to create temporary directory"),
        }
    }

    /// Creates a project from `(relative path, content)` pairs.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let project = Self::new();
        for (path, content) in files {
            project.write(path, content);
        }
        project
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::write(&path, content).expect("Failed to write fixture");
        path
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    pub fn loader(&self) -> DataLoader {
        DataLoader::new(self.root(), LoaderConfig::default())
    }
}

/// Loads and compiles one playbook of `project`, returning the loader that
/// owns the resulting graph.
pub fn compile_playbook(
    project: &TestProject,
    playbook: &str,
) -> Result<(DataLoader, Vec<TaskId>), CompileError> {
    let mut loader = project.loader();
    compile_with_loader(&mut loader, &project.path(playbook)).map(|tasks| (loader, tasks))
}

pub fn compile_with_loader(
    loader: &mut DataLoader,
    playbook: &Path,
) -> Result<Vec<TaskId>, CompileError> {
    let templater = JinjaTemplater::new().expect("Failed to create templater");
    let playbook = loader.load_playbook(None, playbook)?;
    Compiler::new(loader, &templater).compile_playbook(&playbook)
}

/// Declared names of `tasks`, with unnamed tasks as `-`.
pub fn task_names(graph: &ProjectGraph, tasks: &[TaskId]) -> Vec<String> {
    tasks
        .iter()
        .map(|&task| graph.task(task).name().unwrap_or("-").to_string())
        .collect()
}
