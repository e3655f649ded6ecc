//! String templating of task parameters.

pub mod converter;
pub mod error;
pub mod helpers;
pub mod jinja;

pub use converter::JinjaConverter;
pub use error::TemplateError;
pub use jinja::JinjaTemplater;

use crate::variables::Variables;

/// Renders a template expression against a variable mapping.
pub trait Templater {
    fn evaluate(&self, template: &str, vars: &Variables) -> Result<String, TemplateError>;
}
