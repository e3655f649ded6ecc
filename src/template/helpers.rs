//! Handlebars helpers backing the converted Jinja2 filters and comparisons.

use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperResult, Output, RenderContext,
};
use serde_json::Value;

/// Text form of a value as Jinja2 would print it.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `{{default value fallback}}`: the fallback replaces null, missing and
/// empty-string values.
pub fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let fallback = h.param(1).map(|v| as_text(v.value())).unwrap_or_default();
    let text = match h.param(0).map(|v| v.value()) {
        None | Some(Value::Null) => fallback,
        Some(Value::String(s)) if s.is_empty() => fallback,
        Some(value) => as_text(value),
    };
    out.write(&text)?;
    Ok(())
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Number(l), Value::Number(r)) => l == r,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (l, r) => as_text(l) == as_text(r),
    }
}

// Comparisons return JSON booleans so they also work as `#if` subexpressions.
// Unlike the built-in `eq`, numbers and their string forms compare equal.
handlebars_helper!(loose_eq: |left: Json, right: Json| values_equal(left, right));
handlebars_helper!(loose_ne: |left: Json, right: Json| !values_equal(left, right));

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Handlebars<'static> {
        let mut handlebars = Handlebars::new();
        handlebars.register_helper("default", Box::new(default_helper));
        handlebars.register_helper("eq", Box::new(loose_eq));
        handlebars.register_helper("ne", Box::new(loose_ne));
        handlebars
    }

    #[test]
    fn test_default_helper() {
        let handlebars = registry();
        let template = "{{default name 'unknown'}}";

        let result = handlebars
            .render_template(template, &json!({"name": "Alice"}))
            .unwrap();
        assert_eq!(result, "Alice");

        let result = handlebars
            .render_template(template, &json!({"name": ""}))
            .unwrap();
        assert_eq!(result, "unknown");

        let result = handlebars.render_template(template, &json!({})).unwrap();
        assert_eq!(result, "unknown");

        let result = handlebars
            .render_template("{{default port 80}}", &json!({"port": 8080}))
            .unwrap();
        assert_eq!(result, "8080");
    }

    #[test]
    fn test_equality_helpers() {
        let handlebars = registry();

        let result = handlebars
            .render_template("{{eq name 'Alice'}}", &json!({"name": "Alice"}))
            .unwrap();
        assert_eq!(result, "true");

        let result = handlebars
            .render_template("{{ne name 'Alice'}}", &json!({"name": "Bob"}))
            .unwrap();
        assert_eq!(result, "true");

        let result = handlebars
            .render_template("{{eq port '80'}}", &json!({"port": 80}))
            .unwrap();
        assert_eq!(result, "true");

        let result = handlebars
            .render_template(
                "{{#if (eq env 'prod')}}live{{else}}test{{/if}}",
                &json!({"env": "staging"}),
            )
            .unwrap();
        assert_eq!(result, "test");
    }
}
