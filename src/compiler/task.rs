use crate::compiler::{include_key, CompileError, Compiler};
use crate::loader::LoadRoleOptions;
use crate::model::{MetadataId, PlayId, RoleId, RoleIncludeModule, TaskId, TaskIncludeModule};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

impl<'a> Compiler<'a> {
    pub fn compile_tasks(&mut self, tasks: &[TaskId]) -> Result<Vec<TaskId>, CompileError> {
        let mut compiled = Vec::new();
        for &task in tasks {
            compiled.extend(self.compile_task(task)?);
        }
        Ok(compiled)
    }

    /// Expands one task: blocks into their children, include/import
    /// directives into the compiled target, and leaf tasks into themselves.
    pub fn compile_task(&mut self, task: TaskId) -> Result<Vec<TaskId>, CompileError> {
        let entry = self.loader.graph().task(task);
        if entry.is_block() {
            let children = entry.block.clone();
            return self.compile_tasks(&children);
        }
        if let Some(action) = entry.task_include_action() {
            return self.compile_task_include(task, action);
        }
        if let Some(action) = entry.role_include_action() {
            return self.compile_role_include(task, action);
        }
        Ok(vec![task])
    }

    fn compile_task_include(
        &mut self,
        task: TaskId,
        action: &str,
    ) -> Result<Vec<TaskId>, CompileError> {
        let (metadata, role, play, task_path) = {
            let graph = self.loader.graph();
            let entry = graph.task(task);
            (
                entry.metadata,
                entry.role,
                entry.play,
                graph.metadata(entry.metadata).path().to_path_buf(),
            )
        };

        let target = match self.include_params::<TaskIncludeModule>(task, action, "file") {
            Ok(params) => relative_to_file(&task_path, &params.file),
            Err(e) => return Err(self.include_failed(metadata, action.to_string(), e)),
        };
        debug!("Including tasks from {}", target.display());

        self.enter_include(include_key(&target))?;
        let result = self.load_and_compile_tasks(metadata, role, play, &target);
        self.leave_include();

        let tasks = result
            .map_err(|e| self.include_failed(metadata, target.display().to_string(), e))?;
        self.loader.graph_mut().adopt_tasks(&tasks, task);
        Ok(tasks)
    }

    fn compile_role_include(
        &mut self,
        task: TaskId,
        action: &str,
    ) -> Result<Vec<TaskId>, CompileError> {
        let metadata = self.loader.graph().task(task).metadata;
        let params = match self.include_params::<RoleIncludeModule>(task, action, "name") {
            Ok(params) => params,
            Err(e) => return Err(self.include_failed(metadata, action.to_string(), e)),
        };
        let options = LoadRoleOptions::default()
            .tasks_from(params.tasks_from.as_deref())
            .defaults_from(params.defaults_from.as_deref())
            .vars_from(params.vars_from.as_deref())
            .public(params.public);
        let play = self.loader.graph().task_play(task);
        debug!("Including role {} ({})", params.name, options.tasks_file);

        self.enter_include(format!("role:{}:{}", params.name, options.tasks_file))?;
        let result = self
            .loader
            .load_role_with_options(Some(metadata), play, &params.name, &options)
            .map_err(CompileError::from)
            .and_then(|role| self.compile_role(role));
        self.leave_include();

        let tasks = result
            .map_err(|e| self.include_failed(metadata, format!("role {}", params.name), e))?;
        self.loader.graph_mut().adopt_tasks(&tasks, task);
        Ok(tasks)
    }

    fn load_and_compile_tasks(
        &mut self,
        parent: MetadataId,
        role: Option<RoleId>,
        play: Option<PlayId>,
        path: &Path,
    ) -> Result<Vec<TaskId>, CompileError> {
        let loaded = self.loader.load_tasks_in(Some(parent), role, play, path)?;
        self.compile_tasks(&loaded)
    }

    /// Decodes the parameters of an include directive from either its
    /// free-form string (bound to `free_form_key`) or its mapping. Unlike
    /// [`Compiler::free_form`], a free-form target that fails to render is
    /// an error.
    fn include_params<T: DeserializeOwned>(
        &mut self,
        task: TaskId,
        action: &str,
        free_form_key: &str,
    ) -> Result<T, CompileError> {
        let invalid = |reason: String| CompileError::InvalidIncludeParams {
            action: action.to_string(),
            reason,
        };

        let raw = self.loader.graph().task(task).raw.get(action).cloned();
        let value = match raw {
            Some(Value::String(template)) => {
                let vars = self.task_vars(task)?;
                let rendered = self
                    .templater
                    .evaluate(&template, &vars)
                    .map_err(|e| invalid(format!("failed to render {template:?}: {e}")))?;
                let mut params = Map::new();
                params.insert(free_form_key.to_string(), Value::String(rendered));
                Value::Object(params)
            }
            Some(Value::Object(_)) => match self.module(task, action)? {
                Some(module) => module.into_value(),
                None => Value::Object(Map::new()),
            },
            _ => {
                return Err(invalid(
                    "expected a file name or a parameter mapping".to_string(),
                ))
            }
        };

        serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
    }
}

/// Resolves `file` against the directory of the file that references it.
/// Absolute targets are returned as-is.
fn relative_to_file(referer: &Path, file: &str) -> PathBuf {
    referer
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(file)
}
