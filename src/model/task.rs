use crate::model::metadata::MetadataId;
use crate::model::module::{
    with_builtin_prefix, IMPORT_ROLE_ACTION, IMPORT_TASKS_ACTION, INCLUDE_ROLE_ACTION,
    INCLUDE_TASKS_ACTION,
};
use crate::model::{PlayId, RoleId};
use crate::variables::Variables;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

static TASK_INCLUDE_ACTIONS: Lazy<Vec<String>> =
    Lazy::new(|| with_builtin_prefix(&[INCLUDE_TASKS_ACTION, IMPORT_TASKS_ACTION]));

static ROLE_INCLUDE_ACTIONS: Lazy<Vec<String>> =
    Lazy::new(|| with_builtin_prefix(&[INCLUDE_ROLE_ACTION, IMPORT_ROLE_ACTION]));

/// Handle of a [`Task`] in the project graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) usize);

/// How a task expands during compilation, in the order the forms are tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Block,
    TaskInclude,
    RoleInclude,
    Leaf,
}

/// A single task declaration. Tasks can wrap a block of child tasks or
/// reference other task files and roles through include directives.
#[derive(Debug, Clone)]
pub struct Task {
    pub(crate) name: Option<String>,
    pub(crate) block: Vec<TaskId>,
    pub(crate) vars: Variables,
    pub(crate) raw: Map<String, Value>,
    pub(crate) metadata: MetadataId,
    pub(crate) parent: Option<TaskId>,
    pub(crate) role: Option<RoleId>,
    pub(crate) play: Option<PlayId>,
    pub(crate) cached_vars: Option<Variables>,
}

impl Task {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn block(&self) -> &[TaskId] {
        &self.block
    }

    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    /// The task mapping exactly as declared.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn metadata(&self) -> MetadataId {
        self.metadata
    }

    /// The block or include task this task was expanded from.
    pub fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    pub fn role(&self) -> Option<RoleId> {
        self.role
    }

    pub fn cached_vars(&self) -> Option<&Variables> {
        self.cached_vars.as_ref()
    }

    pub fn is_block(&self) -> bool {
        !self.block.is_empty()
    }

    pub fn is_task_include(&self) -> bool {
        self.action_one_of(&TASK_INCLUDE_ACTIONS).is_some()
    }

    pub fn is_role_include(&self) -> bool {
        self.action_one_of(&ROLE_INCLUDE_ACTIONS).is_some()
    }

    pub fn kind(&self) -> TaskKind {
        if self.is_block() {
            TaskKind::Block
        } else if self.is_task_include() {
            TaskKind::TaskInclude
        } else if self.is_role_include() {
            TaskKind::RoleInclude
        } else {
            TaskKind::Leaf
        }
    }

    /// The first declared key among `actions`.
    pub fn action_one_of<'a>(&self, actions: &'a [String]) -> Option<&'a str> {
        actions
            .iter()
            .find(|action| self.raw.contains_key(action.as_str()))
            .map(String::as_str)
    }

    pub(crate) fn task_include_action(&self) -> Option<&'static str> {
        self.action_one_of(&TASK_INCLUDE_ACTIONS)
    }

    pub(crate) fn role_include_action(&self) -> Option<&'static str> {
        self.action_one_of(&ROLE_INCLUDE_ACTIONS)
    }

    /// Raw, unrendered parameter of an action.
    pub fn action_param(&self, action: &str) -> Option<&Value> {
        self.raw.get(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_from(raw: Value) -> Task {
        Task {
            name: raw.get("name").and_then(Value::as_str).map(String::from),
            block: Vec::new(),
            vars: Variables::new(),
            raw: raw.as_object().cloned().unwrap_or_default(),
            metadata: MetadataId(0),
            parent: None,
            role: None,
            play: None,
            cached_vars: None,
        }
    }

    #[test]
    fn test_kind_matches_bare_and_prefixed_actions() {
        let bare = task_from(json!({"name": "inc", "include_tasks": "other.yml"}));
        assert_eq!(bare.kind(), TaskKind::TaskInclude);

        let prefixed = task_from(json!({"ansible.builtin.import_tasks": {"file": "other.yml"}}));
        assert_eq!(prefixed.kind(), TaskKind::TaskInclude);

        let role = task_from(json!({"ansible.builtin.include_role": {"name": "web"}}));
        assert_eq!(role.kind(), TaskKind::RoleInclude);

        let leaf = task_from(json!({"name": "Create bucket", "amazon.aws.s3_bucket": {"name": "b"}}));
        assert_eq!(leaf.kind(), TaskKind::Leaf);
    }

    #[test]
    fn test_action_param_returns_unrendered_value() {
        let task = task_from(json!({
            "name": "Create an empty bucket",
            "amazon.aws.s3_bucket": {"name": "mys3bucket", "state": "present"}
        }));

        let param = task.action_param("amazon.aws.s3_bucket").unwrap();
        assert_eq!(param["name"], json!("mys3bucket"));
        assert!(task.action_param("debug").is_none());
    }
}
