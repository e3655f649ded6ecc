use crate::compiler::{CompileError, Compiler};
use crate::model::{RoleId, TaskId};
use tracing::debug;

impl<'a> Compiler<'a> {
    /// Compiles every dependency of a role, depth-first, followed by the
    /// role's own tasks.
    pub fn compile_role(&mut self, role: RoleId) -> Result<Vec<TaskId>, CompileError> {
        let mut path = Vec::new();
        self.compile_role_on_path(role, &mut path)
    }

    fn compile_role_on_path(
        &mut self,
        role: RoleId,
        path: &mut Vec<String>,
    ) -> Result<Vec<TaskId>, CompileError> {
        self.loader.enter_dependency(role, path)?;
        debug!("Compiling role {}", self.loader.graph().role(role).name());

        let mut compiled = Vec::new();
        for dep in self.loader.load_direct_dependencies(role)? {
            compiled.extend(self.compile_role_on_path(dep, path)?);
        }
        path.pop();

        let tasks = self.loader.graph().role(role).tasks.clone();
        compiled.extend(self.compile_tasks(&tasks)?);
        Ok(compiled)
    }
}
