use crate::model::metadata::MetadataId;
use crate::model::module::{with_builtin_prefix, IMPORT_PLAYBOOK_ACTION, INCLUDE_PLAYBOOK_ACTION};
use crate::model::{RoleId, TaskId};
use crate::variables::Variables;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

static PLAYBOOK_IMPORT_ACTIONS: Lazy<Vec<String>> =
    Lazy::new(|| with_builtin_prefix(&[IMPORT_PLAYBOOK_ACTION, INCLUDE_PLAYBOOK_ACTION]));

/// Handle of a [`Play`] in the project graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayId(pub(crate) usize);

/// An ordered list of plays loaded from one document.
#[derive(Debug, Clone, Default)]
pub struct Playbook {
    pub(crate) path: PathBuf,
    pub(crate) plays: Vec<PlayId>,
}

impl Playbook {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            plays: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn plays(&self) -> &[PlayId] {
        &self.plays
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }
}

/// A role reference as written in a play's `roles` list or a role's
/// `dependencies`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleDefinition {
    pub(crate) name: String,
    pub(crate) vars: Variables,
    pub(crate) metadata: MetadataId,
}

impl RoleDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    pub fn metadata(&self) -> MetadataId {
        self.metadata
    }
}

#[derive(Debug, Clone)]
pub struct Play {
    pub(crate) name: Option<String>,
    pub(crate) hosts: Option<String>,
    pub(crate) role_definitions: Vec<RoleDefinition>,
    pub(crate) pre_tasks: Vec<TaskId>,
    pub(crate) tasks: Vec<TaskId>,
    pub(crate) post_tasks: Vec<TaskId>,
    pub(crate) vars: Variables,
    pub(crate) vars_files: Vec<String>,
    pub(crate) raw: Map<String, Value>,
    pub(crate) roles: Vec<RoleId>,
    pub(crate) metadata: MetadataId,
}

impl Play {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn hosts(&self) -> Option<&str> {
        self.hosts.as_deref()
    }

    pub fn role_definitions(&self) -> &[RoleDefinition] {
        &self.role_definitions
    }

    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }

    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    pub fn vars_files(&self) -> &[String] {
        &self.vars_files
    }

    pub fn metadata(&self) -> MetadataId {
        self.metadata
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Pre-tasks, tasks and post-tasks in execution order.
    pub fn list_tasks(&self) -> Vec<TaskId> {
        let mut tasks =
            Vec::with_capacity(self.pre_tasks.len() + self.tasks.len() + self.post_tasks.len());
        tasks.extend_from_slice(&self.pre_tasks);
        tasks.extend_from_slice(&self.tasks);
        tasks.extend_from_slice(&self.post_tasks);
        tasks
    }

    /// Target of an `import_playbook` directive, if this play is one.
    pub fn import_playbook(&self) -> Option<&str> {
        PLAYBOOK_IMPORT_ACTIONS
            .iter()
            .find_map(|action| self.raw.get(action.as_str()))
            .and_then(Value::as_str)
    }
}
