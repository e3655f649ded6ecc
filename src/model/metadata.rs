use marked_yaml::Node;
use std::fmt;
use std::path::{Path, PathBuf};

/// Line span of a loaded entity inside its source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub start_line: usize,
    pub end_line: usize,
}

impl Range {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Range of a span-aware YAML node. The end line is taken from the
    /// deepest trailing child because block collections carry no end marker.
    pub fn from_node(node: &Node) -> Self {
        Self {
            start_line: start_line(node),
            end_line: end_line(node),
        }
    }
}

fn start_line(node: &Node) -> usize {
    node.span().start().map(|marker| marker.line()).unwrap_or(0)
}

fn end_line(node: &Node) -> usize {
    let mut current = node;
    loop {
        let next = match current {
            Node::Mapping(mapping) => mapping.values().last(),
            Node::Sequence(sequence) => sequence.last(),
            Node::Scalar(_) => None,
        };
        match next {
            Some(child) => current = child,
            None => return start_line(current),
        }
    }
}

/// Handle of a [`Metadata`] record in the project graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetadataId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Playbook,
    Play,
    Role,
    RoleMeta,
    RoleDefinition,
    Task,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeKind::Playbook => "playbook",
            ScopeKind::Play => "play",
            ScopeKind::Role => "role",
            ScopeKind::RoleMeta => "role meta",
            ScopeKind::RoleDefinition => "role definition",
            ScopeKind::Task => "task",
        };
        f.write_str(name)
    }
}

/// Provenance of a loaded entity: where it came from and what encloses it.
#[derive(Debug, Clone)]
pub struct Metadata {
    path: PathBuf,
    range: Range,
    parent: Option<MetadataId>,
    kind: ScopeKind,
    label: Option<String>,
}

impl Metadata {
    pub fn new(kind: ScopeKind, path: impl Into<PathBuf>, range: Range) -> Self {
        Self {
            path: path.into(),
            range,
            parent: None,
            kind,
            label: None,
        }
    }

    pub fn with_parent(mut self, parent: Option<MetadataId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn parent(&self) -> Option<MetadataId> {
        self.parent
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.range.start_line)?;
        match &self.label {
            Some(label) => write!(f, " ({} {label:?})", self.kind),
            None => write!(f, " ({})", self.kind),
        }
    }
}
