use crate::template::converter::JinjaConverter;
use crate::template::error::TemplateError;
use crate::template::helpers::{default_helper, loose_eq, loose_ne};
use crate::template::Templater;
use crate::variables::Variables;
use handlebars::Handlebars;
use serde_json::Value;

/// Default [`Templater`]: converts the Jinja2 subset found in task
/// parameters to Handlebars and renders it against the task's variables.
pub struct JinjaTemplater {
    handlebars: Handlebars<'static>,
    converter: JinjaConverter,
}

impl JinjaTemplater {
    pub fn new() -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_helper("default", Box::new(default_helper));
        handlebars.register_helper("eq", Box::new(loose_eq));
        handlebars.register_helper("ne", Box::new(loose_ne));

        Ok(Self {
            handlebars,
            converter: JinjaConverter::new()?,
        })
    }

    /// In strict mode a reference to an undefined variable is an error
    /// instead of rendering empty.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.handlebars.set_strict_mode(strict);
        self
    }

    pub fn is_strict(&self) -> bool {
        self.handlebars.strict_mode()
    }
}

impl Templater for JinjaTemplater {
    fn evaluate(&self, template: &str, vars: &Variables) -> Result<String, TemplateError> {
        if !is_template(template) {
            return Ok(template.to_string());
        }

        let converted = self.converter.convert(template)?;
        let context = Value::Object(
            vars.iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        );
        Ok(self.handlebars.render_template(&converted, &context)?)
    }
}

fn is_template(value: &str) -> bool {
    value.contains("{{") || value.contains("{%")
}
