use crate::model::metadata::MetadataId;
use crate::model::play::RoleDefinition;
use crate::model::{PlayId, TaskId};
use crate::variables::Variables;
use std::path::{Path, PathBuf};

/// Handle of a [`Role`] in the project graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleId(pub(crate) usize);

/// Contents of a role's `meta/main.yml`.
#[derive(Debug, Clone, Default)]
pub struct RoleMeta {
    pub(crate) metadata: Option<MetadataId>,
    pub(crate) dependencies: Vec<RoleDefinition>,
}

impl RoleMeta {
    pub fn metadata(&self) -> Option<MetadataId> {
        self.metadata
    }

    pub fn dependencies(&self) -> &[RoleDefinition] {
        &self.dependencies
    }
}

/// A role loaded from `roles/<name>` with one particular file selection.
#[derive(Debug, Clone)]
pub struct Role {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) public: bool,
    pub(crate) metadata: MetadataId,
    pub(crate) play: Option<PlayId>,
    pub(crate) tasks: Vec<TaskId>,
    pub(crate) defaults: Variables,
    pub(crate) vars: Variables,
    pub(crate) meta: RoleMeta,
    pub(crate) direct_deps: Option<Vec<RoleId>>,
    pub(crate) all_deps: Option<Vec<RoleId>>,
}

impl Role {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn metadata(&self) -> MetadataId {
        self.metadata
    }

    pub fn play(&self) -> Option<PlayId> {
        self.play
    }

    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    pub fn defaults(&self) -> &Variables {
        &self.defaults
    }

    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    pub fn meta(&self) -> &RoleMeta {
        &self.meta
    }

    /// Direct dependencies, once they have been loaded.
    pub fn direct_dependencies(&self) -> Option<&[RoleId]> {
        self.direct_deps.as_deref()
    }
}
