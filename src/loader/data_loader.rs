use crate::loader::config::LoaderConfig;
use crate::loader::decode::{
    decode_playbook, decode_role_meta, decode_task_list, decode_variables, Document, RawPlay,
    RawRoleDefinition, RawTask,
};
use crate::loader::error::LoadError;
use crate::model::{
    Metadata, MetadataId, Play, PlayId, Playbook, ProjectGraph, Role, RoleDefinition, RoleId,
    RoleMeta, ScopeKind, Task, TaskId,
};
use crate::variables::{assign, Variables};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const DEFAULT_ROLE_FILE: &str = "main";

/// Selects which file of each role folder gets loaded. Used by
/// `include_role` / `import_role` through `tasks_from`, `vars_from` and
/// `defaults_from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRoleOptions {
    pub tasks_file: String,
    pub defaults_file: String,
    pub vars_file: String,
    pub public: Option<bool>,
}

impl Default for LoadRoleOptions {
    fn default() -> Self {
        Self {
            tasks_file: DEFAULT_ROLE_FILE.to_string(),
            defaults_file: DEFAULT_ROLE_FILE.to_string(),
            vars_file: DEFAULT_ROLE_FILE.to_string(),
            public: None,
        }
    }
}

impl LoadRoleOptions {
    pub fn tasks_from(mut self, file: Option<&str>) -> Self {
        if let Some(file) = file.filter(|file| !file.is_empty()) {
            self.tasks_file = file.to_string();
        }
        self
    }

    pub fn defaults_from(mut self, file: Option<&str>) -> Self {
        if let Some(file) = file.filter(|file| !file.is_empty()) {
            self.defaults_file = file.to_string();
        }
        self
    }

    pub fn vars_from(mut self, file: Option<&str>) -> Self {
        if let Some(file) = file.filter(|file| !file.is_empty()) {
            self.vars_file = file.to_string();
        }
        self
    }

    pub fn public(mut self, public: Option<bool>) -> Self {
        self.public = public;
        self
    }
}

/// Where stamped tasks come from.
#[derive(Clone, Copy)]
struct TaskOrigin<'a> {
    path: &'a Path,
    role: Option<RoleId>,
    play: Option<PlayId>,
}

/// Loads playbooks, roles and task files into the project graph.
///
/// The role cache maps a role name to its resolved directory only; every
/// load of a role re-reads its files.
#[derive(Debug)]
pub struct DataLoader {
    root: PathBuf,
    config: LoaderConfig,
    graph: ProjectGraph,
    role_cache: HashMap<String, PathBuf>,
}

impl DataLoader {
    pub fn new(root: impl Into<PathBuf>, config: LoaderConfig) -> Self {
        Self {
            root: root.into(),
            config,
            graph: ProjectGraph::new(),
            role_cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn graph(&self) -> &ProjectGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut ProjectGraph {
        &mut self.graph
    }

    pub fn cached_role_path(&self, name: &str) -> Option<&Path> {
        self.role_cache.get(name).map(PathBuf::as_path)
    }

    pub fn load_role(
        &mut self,
        parent: Option<MetadataId>,
        play: Option<PlayId>,
        name: &str,
    ) -> Result<RoleId, LoadError> {
        self.load_role_with_options(parent, play, name, &LoadRoleOptions::default())
    }

    pub fn load_role_with_options(
        &mut self,
        parent: Option<MetadataId>,
        play: Option<PlayId>,
        name: &str,
        options: &LoadRoleOptions,
    ) -> Result<RoleId, LoadError> {
        let role_path = match self.role_cache.get(name) {
            Some(path) => path.clone(),
            None => self.resolve_role_path(name)?,
        };
        debug!("Loading role {name} from {}", role_path.display());

        let metadata = self.graph.add_metadata(
            Metadata::new(ScopeKind::Role, &role_path, Default::default())
                .with_parent(parent)
                .with_label(Some(name.to_string())),
        );
        let role = self.graph.add_role(Role {
            name: name.to_string(),
            path: role_path.clone(),
            public: options.public.unwrap_or(false),
            metadata,
            play,
            tasks: Vec::new(),
            defaults: Variables::new(),
            vars: Variables::new(),
            meta: RoleMeta::default(),
            direct_deps: None,
            all_deps: None,
        });

        let tasks_file = selection(&options.tasks_file);
        let defaults_file = selection(&options.defaults_file);
        let vars_file = selection(&options.vars_file);

        for entry in WalkDir::new(&role_path).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_yaml_file(entry.path()) {
                continue;
            }
            let Some((folder, file)) = role_file(&role_path, entry.path()) else {
                continue;
            };

            match folder.as_str() {
                "tasks" if file == tasks_file => {
                    let tasks = self.load_tasks_in(Some(metadata), Some(role), play, entry.path())?;
                    self.graph.role_mut(role).tasks.extend(tasks);
                }
                "defaults" if file == defaults_file => {
                    if let Some(vars) = self.parse_vars_file(entry.path()) {
                        assign(&mut self.graph.role_mut(role).defaults, &vars);
                    }
                }
                "vars" if file == vars_file => {
                    if let Some(vars) = self.parse_vars_file(entry.path()) {
                        assign(&mut self.graph.role_mut(role).vars, &vars);
                    }
                }
                "meta" if file == Path::new(DEFAULT_ROLE_FILE) => {
                    if let Some(meta) = self.parse_meta_file(entry.path(), metadata) {
                        self.graph.role_mut(role).meta = meta;
                    }
                }
                _ => {}
            }
        }

        self.role_cache.insert(name.to_string(), role_path);
        Ok(role)
    }

    /// Decodes a task list. Every task, including block children, is
    /// stamped with `path` and `role`.
    pub fn load_tasks(
        &mut self,
        parent: Option<MetadataId>,
        role: Option<RoleId>,
        path: &Path,
    ) -> Result<Vec<TaskId>, LoadError> {
        self.load_tasks_in(parent, role, None, path)
    }

    pub(crate) fn load_tasks_in(
        &mut self,
        parent: Option<MetadataId>,
        role: Option<RoleId>,
        play: Option<PlayId>,
        path: &Path,
    ) -> Result<Vec<TaskId>, LoadError> {
        let content = read_file(path)?;
        let raw_tasks = Document::parse(path, &content)
            .and_then(|document| decode_task_list(&document))
            .map_err(|e| LoadError::TaskDecode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let origin = TaskOrigin { path, role, play };
        Ok(self.stamp_tasks(raw_tasks, origin, parent, None))
    }

    /// Loads a playbook. Documents that are not shaped like a playbook give
    /// an empty playbook, since not every YAML file in a project is one.
    pub fn load_playbook(
        &mut self,
        parent: Option<MetadataId>,
        path: &Path,
    ) -> Result<Playbook, LoadError> {
        let content = read_file(path)?;
        let raw_plays = match Document::parse(path, &content)
            .and_then(|document| decode_playbook(&document))
        {
            Ok(plays) => plays,
            Err(e) => {
                debug!("Skipping {}: not a playbook ({e})", path.display());
                return Ok(Playbook::empty(path));
            }
        };

        let mut playbook = Playbook::empty(path);
        for raw in raw_plays {
            let play = self.stamp_play(raw, path, parent)?;
            playbook.plays.push(play);
        }
        Ok(playbook)
    }

    /// Reads `<play_dir>/vars/<filename>`.
    pub fn load_play_vars_file(
        &self,
        play_dir: &Path,
        filename: &str,
    ) -> Result<Variables, LoadError> {
        let path = if Path::new(filename).is_absolute() {
            PathBuf::from(filename)
        } else {
            play_dir.join("vars").join(filename)
        };

        let content = fs::read_to_string(&path).map_err(|e| LoadError::VarsFileRead {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Document::parse(&path, &content)
            .and_then(|document| decode_variables(&document))
            .map_err(|e| LoadError::VarsFileRead {
                path,
                reason: e.to_string(),
            })
    }

    fn resolve_role_path(&self, name: &str) -> Result<PathBuf, LoadError> {
        let candidates: Vec<PathBuf> = std::iter::once(self.root.join("roles").join(name))
            .chain(self.config.roles_path.iter().map(|dir| dir.join(name)))
            .collect();

        match candidates.iter().find(|path| path.is_dir()) {
            Some(path) => Ok(path.clone()),
            None => Err(LoadError::RoleNotFound {
                name: name.to_string(),
                searched: candidates,
            }),
        }
    }

    fn parse_vars_file(&self, path: &Path) -> Option<Variables> {
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                Document::parse(path, &content)
                    .and_then(|document| decode_variables(&document))
                    .map_err(|e| e.to_string())
            });
        match parsed {
            Ok(vars) => Some(vars),
            Err(reason) => {
                warn!("Ignoring variables file {}: {reason}", path.display());
                None
            }
        }
    }

    fn parse_meta_file(&mut self, path: &Path, role_metadata: MetadataId) -> Option<RoleMeta> {
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                Document::parse(path, &content)
                    .and_then(|document| decode_role_meta(&document))
                    .map_err(|e| e.to_string())
            });
        let raw = match parsed {
            Ok(raw) => raw,
            Err(reason) => {
                warn!("Ignoring role metadata {}: {reason}", path.display());
                return None;
            }
        };

        let metadata = self.graph.add_metadata(
            Metadata::new(ScopeKind::RoleMeta, path, raw.range).with_parent(Some(role_metadata)),
        );
        let dependencies = raw
            .dependencies
            .into_iter()
            .map(|definition| self.stamp_role_definition(definition, path, metadata))
            .collect();
        Some(RoleMeta {
            metadata: Some(metadata),
            dependencies,
        })
    }

    fn stamp_play(
        &mut self,
        raw: RawPlay,
        path: &Path,
        parent: Option<MetadataId>,
    ) -> Result<PlayId, LoadError> {
        let metadata = self.graph.add_metadata(
            Metadata::new(ScopeKind::Play, path, raw.range)
                .with_parent(parent)
                .with_label(raw.name.clone()),
        );
        let play = self.graph.add_play(Play {
            name: raw.name,
            hosts: raw.hosts,
            role_definitions: Vec::new(),
            pre_tasks: Vec::new(),
            tasks: Vec::new(),
            post_tasks: Vec::new(),
            vars: raw.vars,
            vars_files: raw.vars_files,
            raw: raw.raw,
            roles: Vec::new(),
            metadata,
        });

        let origin = TaskOrigin {
            path,
            role: None,
            play: Some(play),
        };
        let pre_tasks = self.stamp_tasks(raw.pre_tasks, origin, Some(metadata), None);
        let tasks = self.stamp_tasks(raw.tasks, origin, Some(metadata), None);
        let post_tasks = self.stamp_tasks(raw.post_tasks, origin, Some(metadata), None);
        let role_definitions: Vec<RoleDefinition> = raw
            .roles
            .into_iter()
            .map(|definition| self.stamp_role_definition(definition, path, metadata))
            .collect();

        let mut roles = Vec::with_capacity(role_definitions.len());
        for definition in &role_definitions {
            roles.push(self.load_role(Some(definition.metadata), Some(play), &definition.name)?);
        }

        let entry = self.graph.play_mut(play);
        entry.pre_tasks = pre_tasks;
        entry.tasks = tasks;
        entry.post_tasks = post_tasks;
        entry.role_definitions = role_definitions;
        entry.roles = roles;
        Ok(play)
    }

    fn stamp_role_definition(
        &mut self,
        raw: RawRoleDefinition,
        path: &Path,
        parent: MetadataId,
    ) -> RoleDefinition {
        let metadata = self.graph.add_metadata(
            Metadata::new(ScopeKind::RoleDefinition, path, raw.range)
                .with_parent(Some(parent))
                .with_label(Some(raw.name.clone())),
        );
        RoleDefinition {
            name: raw.name,
            vars: raw.vars,
            metadata,
        }
    }

    fn stamp_tasks(
        &mut self,
        raw_tasks: Vec<RawTask>,
        origin: TaskOrigin<'_>,
        parent_metadata: Option<MetadataId>,
        parent_task: Option<TaskId>,
    ) -> Vec<TaskId> {
        raw_tasks
            .into_iter()
            .map(|raw| self.stamp_task(raw, origin, parent_metadata, parent_task))
            .collect()
    }

    fn stamp_task(
        &mut self,
        raw: RawTask,
        origin: TaskOrigin<'_>,
        parent_metadata: Option<MetadataId>,
        parent_task: Option<TaskId>,
    ) -> TaskId {
        let metadata = self.graph.add_metadata(
            Metadata::new(ScopeKind::Task, origin.path, raw.range)
                .with_parent(parent_metadata)
                .with_label(raw.name.clone()),
        );
        let task = self.graph.add_task(Task {
            name: raw.name,
            block: Vec::new(),
            vars: raw.vars,
            raw: raw.raw,
            metadata,
            parent: parent_task,
            role: origin.role,
            play: origin.play,
            cached_vars: None,
        });

        let block = self.stamp_tasks(raw.block, origin, Some(metadata), Some(task));
        self.graph.task_mut(task).block = block;
        task
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// A file-selection option without its YAML extension.
fn selection(name: &str) -> PathBuf {
    let path = Path::new(name);
    if is_yaml_file(path) {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

/// Splits a file inside a role into its top-level folder and the remaining
/// path without extension, e.g. `tasks/sub/setup.yml` -> (`tasks`, `sub/setup`).
fn role_file(role_path: &Path, path: &Path) -> Option<(String, PathBuf)> {
    let relative = path.strip_prefix(role_path).ok()?;
    let mut components = relative.components();
    let folder = match components.next()? {
        Component::Normal(folder) => folder.to_str()?.to_string(),
        _ => return None,
    };
    let rest = components.as_path();
    if rest.as_os_str().is_empty() {
        return None;
    }
    Some((folder, rest.with_extension("")))
}
