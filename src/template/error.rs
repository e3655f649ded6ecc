use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template rendering failed: {message}")]
    RenderingFailed { message: String },

    #[error("Template conversion failed: {message}")]
    ConversionFailed { message: String },

    #[error("Unbalanced template blocks: {block_type}")]
    UnbalancedBlocks { block_type: String },

    #[error("Template validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Unsupported Jinja2 feature: {feature}")]
    Unsupported { feature: &'static str },
}

impl From<handlebars::RenderError> for TemplateError {
    fn from(error: handlebars::RenderError) -> Self {
        TemplateError::RenderingFailed {
            message: error.to_string(),
        }
    }
}

impl From<regex::Error> for TemplateError {
    fn from(error: regex::Error) -> Self {
        TemplateError::ConversionFailed {
            message: error.to_string(),
        }
    }
}
