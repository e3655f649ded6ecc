use crate::loader::{DataLoader, LoadError};
use crate::model::{PlayId, RoleId, TaskId};
use crate::variables::{assign, Variables};
use std::path::Path;
use tracing::debug;

/// Merges variables from every static scope visible to a task.
///
/// Sources, lowest precedence first:
///
/// 1. default variables of the play's roles (and of the task's own role),
///    each layered over its dependencies' defaults
/// 2. play `vars`
/// 3. play `vars_files`, in declared order
/// 4. `vars/` of the play's roles
/// 5. `vars/` of the role owning the task
/// 6. the task's own `vars`
///
/// Inventory, facts and extra vars are runtime sources and never appear.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableResolver;

impl VariableResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn get_vars(
        &self,
        loader: &mut DataLoader,
        play: Option<PlayId>,
        task: Option<TaskId>,
    ) -> Result<Variables, LoadError> {
        let mut vars = Variables::new();
        let play_roles: Vec<RoleId> = play
            .map(|play| loader.graph().play(play).roles.clone())
            .unwrap_or_default();
        let task_role = task.and_then(|task| loader.graph().task(task).role);

        for &role in &play_roles {
            assign(&mut vars, &loader.load_default_vars(role)?);
        }
        if let Some(role) = task_role.filter(|role| !play_roles.contains(role)) {
            assign(&mut vars, &loader.load_default_vars(role)?);
        }

        if let Some(play) = play {
            let (play_vars, vars_files, play_dir) = {
                let entry = loader.graph().play(play);
                let path = loader.graph().metadata(entry.metadata).path();
                (
                    entry.vars.clone(),
                    entry.vars_files.clone(),
                    path.parent().unwrap_or(Path::new("")).to_path_buf(),
                )
            };
            assign(&mut vars, &play_vars);

            for file in &vars_files {
                if file.contains("{{") {
                    debug!("Skipping templated vars file {file:?}");
                    continue;
                }
                assign(&mut vars, &loader.load_play_vars_file(&play_dir, file)?);
            }

            for &role in &play_roles {
                assign(&mut vars, &loader.graph().role(role).vars);
            }
        }

        if let Some(task) = task {
            let graph = loader.graph();
            if let Some(role) = task_role {
                assign(&mut vars, &graph.role(role).vars);
            }
            assign(&mut vars, &graph.task(task).vars);
        }

        Ok(vars)
    }
}
