use crate::compiler::{include_key, CompileError, Compiler};
use crate::model::{PlayId, Playbook, TaskId};
use tracing::debug;

impl<'a> Compiler<'a> {
    pub fn compile_playbook(&mut self, playbook: &Playbook) -> Result<Vec<TaskId>, CompileError> {
        self.enter_include(include_key(playbook.path()))?;
        let result = self.compile_plays(playbook.plays());
        self.leave_include();
        result
    }

    /// Compiles a play, or the playbook it imports. Pre-tasks, tasks and
    /// post-tasks come first, then the play's roles in declared order.
    pub fn compile_play(&mut self, play: PlayId) -> Result<Vec<TaskId>, CompileError> {
        let entry = self.loader.graph().play(play);
        let metadata = entry.metadata;

        if let Some(target) = entry.import_playbook() {
            let path = self.loader.root().join(target);
            debug!("Importing playbook {}", path.display());
            return self
                .loader
                .load_playbook(Some(metadata), &path)
                .map_err(CompileError::from)
                .and_then(|playbook| self.compile_playbook(&playbook))
                .map_err(|e| self.include_failed(metadata, path.display().to_string(), e));
        }

        let tasks = entry.list_tasks();
        let roles = entry.roles.clone();
        let mut compiled = self.compile_tasks(&tasks)?;
        for role in roles {
            compiled.extend(self.compile_role(role)?);
        }
        Ok(compiled)
    }

    fn compile_plays(&mut self, plays: &[PlayId]) -> Result<Vec<TaskId>, CompileError> {
        let mut compiled = Vec::new();
        for &play in plays {
            compiled.extend(self.compile_play(play)?);
        }
        Ok(compiled)
    }
}
