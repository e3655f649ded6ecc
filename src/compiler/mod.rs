//! Expansion of blocks, includes and role dependencies into the ordered
//! list of leaf tasks that would run.

pub mod error;
mod play;
mod role;
mod task;

pub use error::CompileError;

use crate::loader::DataLoader;
use crate::model::{MetadataId, Module, ProjectGraph, TaskId};
use crate::template::{TemplateError, Templater};
use crate::variables::{VariableResolver, Variables};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Walks the project graph depth-first, calling back into the loader for
/// every include, import and role dependency it meets.
pub struct Compiler<'a> {
    loader: &'a mut DataLoader,
    templater: &'a dyn Templater,
    resolver: VariableResolver,
    /// Include targets currently being expanded, outermost first.
    include_stack: Vec<String>,
}

impl<'a> Compiler<'a> {
    pub fn new(loader: &'a mut DataLoader, templater: &'a dyn Templater) -> Self {
        Self {
            loader,
            templater,
            resolver: VariableResolver::new(),
            include_stack: Vec::new(),
        }
    }

    pub fn loader(&self) -> &DataLoader {
        &*self.loader
    }

    pub fn graph(&self) -> &ProjectGraph {
        self.loader.graph()
    }

    /// Resolved variables of a task. The first call caches the snapshot on
    /// the task; later calls return it unchanged.
    pub fn task_vars(&mut self, task: TaskId) -> Result<Variables, CompileError> {
        if let Some(vars) = &self.loader.graph().task(task).cached_vars {
            return Ok(vars.clone());
        }

        let play = self.loader.graph().task_play(task);
        let vars = self.resolver.get_vars(self.loader, play, Some(task))?;
        self.loader.graph_mut().task_mut(task).cached_vars = Some(vars.clone());
        Ok(vars)
    }

    /// Rendered parameters of action `name`, when the task declares it as a
    /// mapping. Parameters whose template fails to render are dropped.
    pub fn module(&mut self, task: TaskId, name: &str) -> Result<Option<Module>, CompileError> {
        let params = match self.loader.graph().task(task).raw.get(name) {
            Some(Value::Object(params)) => params.clone(),
            _ => return Ok(None),
        };

        let vars = self.task_vars(task)?;
        let mut module = Module::new();
        for (key, value) in params {
            match self.render_value(&value, &vars) {
                Ok(rendered) => {
                    module.insert(key, rendered);
                }
                Err(e) => warn!("Dropping parameter {key:?} of {name}: {e}"),
            }
        }
        Ok(Some(module))
    }

    /// Rendered free-form parameter of action `name`, e.g.
    /// `include_tasks: "{{ file }}"`.
    pub fn free_form(
        &mut self,
        task: TaskId,
        name: &str,
    ) -> Result<Option<String>, CompileError> {
        let raw = match self.loader.graph().task(task).raw.get(name) {
            Some(Value::String(raw)) => raw.clone(),
            _ => return Ok(None),
        };

        let vars = self.task_vars(task)?;
        match self.templater.evaluate(&raw, &vars) {
            Ok(rendered) => Ok(Some(rendered)),
            Err(e) => {
                warn!("Failed to render {name} parameter {raw:?}: {e}");
                Ok(None)
            }
        }
    }

    fn render_value(&self, value: &Value, vars: &Variables) -> Result<Value, TemplateError> {
        match value {
            Value::String(template) => self.templater.evaluate(template, vars).map(Value::String),
            Value::Array(items) => items
                .iter()
                .map(|item| self.render_value(item, vars))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(entries) => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.render_value(item, vars)?)))
                .collect::<Result<serde_json::Map<_, _>, TemplateError>>()
                .map(Value::Object),
            other => {
                debug!("Leaving {other} unrendered");
                Ok(other.clone())
            }
        }
    }

    /// Pushes an include target, failing when it is already being expanded.
    fn enter_include(&mut self, key: String) -> Result<(), CompileError> {
        if let Some(start) = self.include_stack.iter().position(|entry| *entry == key) {
            let mut chain = self.include_stack[start..].to_vec();
            chain.push(key);
            return Err(CompileError::CyclicInclude { chain });
        }
        self.include_stack.push(key);
        Ok(())
    }

    fn leave_include(&mut self) {
        self.include_stack.pop();
    }

    fn include_failed(
        &self,
        scope: MetadataId,
        target: String,
        error: CompileError,
    ) -> CompileError {
        match error {
            CompileError::IncludeFailed { .. } | CompileError::CyclicInclude { .. } => error,
            other => CompileError::IncludeFailed {
                chain: self.loader.graph().describe(scope),
                target,
                source: Box::new(other),
            },
        }
    }
}

/// Stable identity of a file on the include stack.
fn include_key(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
