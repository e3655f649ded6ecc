//! Rustle Expand - static task expansion for Ansible projects
//!
//! This crate loads the playbooks, roles and task files of a project and
//! computes, without executing anything, the ordered list of leaf tasks the
//! project would run. Include and import directives, nested blocks and role
//! dependencies are expanded the way an execution engine would expand them,
//! and every task keeps its provenance for downstream scanners.

pub mod compiler;
pub mod loader;
pub mod model;
pub mod project;
pub mod template;
pub mod variables;

pub use compiler::{CompileError, Compiler};
pub use loader::{DataLoader, LoadError, LoadRoleOptions, LoaderConfig};
pub use model::*;
pub use project::{Project, ProjectConfig, ProjectError, ProjectParser};
pub use template::{JinjaTemplater, TemplateError, Templater};
pub use variables::{VariableResolver, Variables};
