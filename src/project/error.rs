use crate::compiler::CompileError;
use crate::loader::LoadError;
use crate::template::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to load project: {0}")]
    Load(#[from] LoadError),

    #[error("Failed to compile project: {0}")]
    Compile(#[from] CompileError),

    #[error("Failed to initialize templating: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to read project directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
