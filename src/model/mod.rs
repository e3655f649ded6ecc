//! Entity model: tasks, plays, roles and the arena that owns them.

pub mod graph;
pub mod metadata;
pub mod module;
pub mod play;
pub mod role;
pub mod task;

pub use graph::*;
pub use metadata::*;
pub use module::*;
pub use play::*;
pub use role::*;
pub use task::*;
