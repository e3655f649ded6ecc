use crate::loader::data_loader::DataLoader;
use crate::loader::error::LoadError;
use crate::model::RoleId;
use crate::variables::{assign, Variables};

impl DataLoader {
    /// Loads the roles named in a role's `meta/main.yml` dependencies. The
    /// result is memoized on the role, so each dependency is loaded once.
    pub fn load_direct_dependencies(&mut self, role: RoleId) -> Result<Vec<RoleId>, LoadError> {
        if let Some(deps) = &self.graph().role(role).direct_deps {
            return Ok(deps.clone());
        }

        let (definitions, play) = {
            let entry = self.graph().role(role);
            (entry.meta.dependencies.clone(), entry.play)
        };
        let mut deps = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            deps.push(self.load_role(Some(definition.metadata), play, &definition.name)?);
        }

        self.graph_mut().role_mut(role).direct_deps = Some(deps.clone());
        Ok(deps)
    }

    /// Transitive dependencies in post-order: each dependency's own
    /// dependencies come before it.
    pub fn all_dependencies(&mut self, role: RoleId) -> Result<Vec<RoleId>, LoadError> {
        let mut path = Vec::new();
        self.collect_dependencies(role, &mut path)
    }

    /// Default variables of a role layered over those of its dependencies.
    /// Later dependencies override earlier ones and the role's own defaults
    /// win over all of them.
    pub fn load_default_vars(&mut self, role: RoleId) -> Result<Variables, LoadError> {
        let mut path = Vec::new();
        self.layer_default_vars(role, &mut path)
    }

    /// Pushes `role` onto a dependency path, failing if it is already on it.
    pub(crate) fn enter_dependency(
        &self,
        role: RoleId,
        path: &mut Vec<String>,
    ) -> Result<(), LoadError> {
        let name = self.graph().role(role).name.clone();
        if let Some(start) = path.iter().position(|entry| *entry == name) {
            let mut cycle = path[start..].to_vec();
            cycle.push(name);
            return Err(LoadError::CyclicDependency { cycle });
        }
        path.push(name);
        Ok(())
    }

    fn collect_dependencies(
        &mut self,
        role: RoleId,
        path: &mut Vec<String>,
    ) -> Result<Vec<RoleId>, LoadError> {
        if let Some(all) = &self.graph().role(role).all_deps {
            return Ok(all.clone());
        }

        self.enter_dependency(role, path)?;
        let mut all = Vec::new();
        for dep in self.load_direct_dependencies(role)? {
            all.extend(self.collect_dependencies(dep, path)?);
            all.push(dep);
        }
        path.pop();

        self.graph_mut().role_mut(role).all_deps = Some(all.clone());
        Ok(all)
    }

    fn layer_default_vars(
        &mut self,
        role: RoleId,
        path: &mut Vec<String>,
    ) -> Result<Variables, LoadError> {
        let mut vars = Variables::new();
        for dep in self.collect_dependencies(role, path)? {
            assign(&mut vars, &self.graph().role(dep).defaults);
        }
        assign(&mut vars, &self.graph().role(role).defaults);
        Ok(vars)
    }
}
