use crate::loader::LoadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A directive's target could not be loaded or compiled. `chain` is the
    /// provenance of the directive, outermost scope first.
    #[error("Failed to include {target} (from {chain}): {source}")]
    IncludeFailed {
        chain: String,
        target: String,
        #[source]
        source: Box<CompileError>,
    },

    #[error("Include cycle: {}", chain.join(" -> "))]
    CyclicInclude { chain: Vec<String> },

    #[error("Invalid parameters for {action}: {reason}")]
    InvalidIncludeParams { action: String, reason: String },
}
