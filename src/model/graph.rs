use crate::model::metadata::{Metadata, MetadataId};
use crate::model::{Play, PlayId, Role, RoleId, Task, TaskId};

/// Arena owning every entity loaded for a project. Back-references between
/// entities are handles into this arena.
#[derive(Debug, Default)]
pub struct ProjectGraph {
    metadata: Vec<Metadata>,
    tasks: Vec<Task>,
    plays: Vec<Play>,
    roles: Vec<Role>,
}

impl ProjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self, id: MetadataId) -> &Metadata {
        &self.metadata[id.0]
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }

    pub fn play(&self, id: PlayId) -> &Play {
        &self.plays[id.0]
    }

    pub fn role(&self, id: RoleId) -> &Role {
        &self.roles[id.0]
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    /// The play a task runs in: its role's play for role tasks.
    pub fn task_play(&self, id: TaskId) -> Option<PlayId> {
        let task = self.task(id);
        match task.role {
            Some(role) => self.role(role).play,
            None => task.play,
        }
    }

    pub fn task_metadata(&self, id: TaskId) -> &Metadata {
        self.metadata(self.task(id).metadata)
    }

    /// Provenance chain of `id`, outermost scope first.
    pub fn provenance(&self, id: MetadataId) -> Vec<&Metadata> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(meta_id) = current {
            let meta = self.metadata(meta_id);
            chain.push(meta);
            current = meta.parent();
        }
        chain.reverse();
        chain
    }

    /// Human-readable include chain for diagnostics.
    pub fn describe(&self, id: MetadataId) -> String {
        self.provenance(id)
            .iter()
            .map(|meta| meta.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub(crate) fn add_metadata(&mut self, metadata: Metadata) -> MetadataId {
        self.metadata.push(metadata);
        MetadataId(self.metadata.len() - 1)
    }

    pub(crate) fn add_task(&mut self, task: Task) -> TaskId {
        self.tasks.push(task);
        TaskId(self.tasks.len() - 1)
    }

    pub(crate) fn add_play(&mut self, play: Play) -> PlayId {
        self.plays.push(play);
        PlayId(self.plays.len() - 1)
    }

    pub(crate) fn add_role(&mut self, role: Role) -> RoleId {
        self.roles.push(role);
        RoleId(self.roles.len() - 1)
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.tasks[id.0]
    }

    pub(crate) fn play_mut(&mut self, id: PlayId) -> &mut Play {
        &mut self.plays[id.0]
    }

    pub(crate) fn role_mut(&mut self, id: RoleId) -> &mut Role {
        &mut self.roles[id.0]
    }

    /// Tasks a task was expanded from, nearest first.
    pub fn task_ancestors(&self, id: TaskId) -> Vec<TaskId> {
        let mut ancestors = Vec::new();
        let mut current = self.task(id).parent;
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.task(parent).parent;
        }
        ancestors
    }

    /// Makes `parent` an ancestor of every task in `tasks`: the outermost
    /// task of each chain that does not reach `parent` yet is reparented.
    pub(crate) fn adopt_tasks(&mut self, tasks: &[TaskId], parent: TaskId) {
        for &task in tasks {
            let mut root = task;
            while let Some(next) = self.task(root).parent {
                if next == parent {
                    break;
                }
                root = next;
            }
            if root != parent && self.task(root).parent.is_none() {
                self.task_mut(root).parent = Some(parent);
            }
        }
    }
}
