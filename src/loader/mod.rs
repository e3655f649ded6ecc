//! Loading of playbooks, roles and task files from a project tree.

pub mod config;
pub mod data_loader;
pub(crate) mod decode;
mod dependencies;
pub mod error;

pub use config::*;
pub use data_loader::*;
pub use error::*;
