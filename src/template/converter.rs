//! Conversion of the Jinja2 subset used in task parameters to Handlebars.

use crate::template::error::TemplateError;
use regex::{Captures, Regex};

/// Statements that have no Handlebars counterpart.
const UNSUPPORTED_STATEMENTS: &[(&str, &str)] = &[
    ("set", "variable assignment"),
    ("include", "template inclusion"),
    ("import", "template import"),
    ("extends", "template inheritance"),
    ("block", "template blocks"),
    ("macro", "macros"),
    ("raw", "raw blocks"),
    ("filter", "filter blocks"),
];

pub struct JinjaConverter {
    statement: Regex,
    default_quoted: Regex,
    default_literal: Regex,
    if_comparison: Regex,
    if_statement: Regex,
    elif_statement: Regex,
    else_statement: Regex,
    endif_statement: Regex,
    for_statement: Regex,
    endfor_statement: Regex,
    comparison_expression: Regex,
}

impl JinjaConverter {
    pub fn new() -> Result<Self, TemplateError> {
        Ok(Self {
            statement: Regex::new(r"\{%-?\s*(\w+)[^%]*-?%\}")?,
            default_quoted: Regex::new(
                r#"\{\{\s*([\w.]+)\s*\|\s*default\(\s*(?:'([^']*)'|"([^"]*)")\s*\)\s*\}\}"#,
            )?,
            default_literal: Regex::new(
                r#"\{\{\s*([\w.]+)\s*\|\s*default\(\s*([^)'"]*?)\s*\)\s*\}\}"#,
            )?,
            if_comparison: Regex::new(
                r#"\{%-?\s*if\s+([\w.]+)\s*(==|!=)\s*(?:"([^"]*)"|'([^']*)')\s*-?%\}"#,
            )?,
            if_statement: Regex::new(r"\{%-?\s*if\s+(.+?)\s*-?%\}")?,
            elif_statement: Regex::new(r"\{%-?\s*elif\s+(.+?)\s*-?%\}")?,
            else_statement: Regex::new(r"\{%-?\s*else\s*-?%\}")?,
            endif_statement: Regex::new(r"\{%-?\s*endif\s*-?%\}")?,
            for_statement: Regex::new(r"\{%-?\s*for\s+(\w+)\s+in\s+([\w.]+)\s*-?%\}")?,
            endfor_statement: Regex::new(r"\{%-?\s*endfor\s*-?%\}")?,
            comparison_expression: Regex::new(
                r#"\{\{\s*([\w.]+)\s*(==|!=)\s*(?:"([^"]*)"|'([^']*)')\s*\}\}"#,
            )?,
        })
    }

    /// Validates `template` and rewrites it as a Handlebars template.
    pub fn convert(&self, template: &str) -> Result<String, TemplateError> {
        self.validate(template)?;

        let template = self.convert_default_filters(template);
        let template = self.convert_conditionals(&template);
        let template = self.convert_loops(&template)?;
        Ok(self
            .comparison_expression
            .replace_all(&template, |caps: &Captures| {
                format!("{{{{{} {} '{}'}}}}", helper_for(&caps[2]), &caps[1], literal(caps))
            })
            .into_owned())
    }

    pub fn validate(&self, template: &str) -> Result<(), TemplateError> {
        check_delimiters(template, "{{", "}}", "variable reference")?;
        check_delimiters(template, "{%", "%}", "control block")?;

        let mut if_depth = 0usize;
        let mut for_depth = 0usize;
        for caps in self.statement.captures_iter(template) {
            let keyword = &caps[1];
            if let Some((_, feature)) = UNSUPPORTED_STATEMENTS
                .iter()
                .find(|(statement, _)| *statement == keyword)
            {
                return Err(TemplateError::Unsupported { feature: *feature });
            }

            match keyword {
                "if" => if_depth += 1,
                "elif" if if_depth == 0 => {
                    return Err(unbalanced("elif without if"));
                }
                "endif" => {
                    if_depth = if_depth
                        .checked_sub(1)
                        .ok_or_else(|| unbalanced("unmatched endif"))?;
                }
                "for" => for_depth += 1,
                "endfor" => {
                    for_depth = for_depth
                        .checked_sub(1)
                        .ok_or_else(|| unbalanced("unmatched endfor"))?;
                }
                _ => {}
            }
        }

        if if_depth != 0 {
            return Err(unbalanced(&format!("if (missing {if_depth} endif)")));
        }
        if for_depth != 0 {
            return Err(unbalanced(&format!("for (missing {for_depth} endfor)")));
        }
        Ok(())
    }

    fn convert_default_filters(&self, template: &str) -> String {
        let template = self
            .default_quoted
            .replace_all(template, |caps: &Captures| {
                format!("{{{{default {} '{}'}}}}", &caps[1], literal_at(caps, 2))
            });
        self.default_literal
            .replace_all(&template, "{{default $1 $2}}")
            .into_owned()
    }

    fn convert_conditionals(&self, template: &str) -> String {
        let template = self.if_comparison.replace_all(template, |caps: &Captures| {
            format!(
                "{{{{#if ({} {} '{}')}}}}",
                helper_for(&caps[2]),
                &caps[1],
                literal(caps)
            )
        });
        let template = self.if_statement.replace_all(&template, "{{#if $1}}");
        let template = self.elif_statement.replace_all(&template, "{{else if $1}}");
        let template = self.else_statement.replace_all(&template, "{{else}}");
        self.endif_statement
            .replace_all(&template, "{{/if}}")
            .into_owned()
    }

    /// Loops become `#each` blocks; inside them the loop variable is the
    /// current context, so `item.name` becomes `name` and `item` becomes
    /// `this`.
    fn convert_loops(&self, template: &str) -> Result<String, TemplateError> {
        let loop_vars: Vec<String> = self
            .for_statement
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect();

        let mut result = self
            .for_statement
            .replace_all(template, "{{#each $2}}")
            .into_owned();
        result = self
            .endfor_statement
            .replace_all(&result, "{{/each}}")
            .into_owned();

        for var in loop_vars {
            let var = regex::escape(&var);
            let property = Regex::new(&format!(r"\{{\{{\s*{var}\.([\w.]+)\s*\}}\}}"))?;
            result = property.replace_all(&result, "{{$1}}").into_owned();
            let itself = Regex::new(&format!(r"\{{\{{\s*{var}\s*\}}\}}"))?;
            result = itself.replace_all(&result, "{{this}}").into_owned();
        }
        Ok(result)
    }
}

fn check_delimiters(
    template: &str,
    open: &str,
    close: &str,
    what: &str,
) -> Result<(), TemplateError> {
    let opened = template.matches(open).count();
    let closed = template.matches(close).count();
    if opened != closed {
        return Err(TemplateError::ValidationFailed {
            message: format!("Unclosed {what} ({opened} opened, {closed} closed)"),
        });
    }
    Ok(())
}

fn unbalanced(block_type: &str) -> TemplateError {
    TemplateError::UnbalancedBlocks {
        block_type: block_type.to_string(),
    }
}

fn helper_for(operator: &str) -> &'static str {
    if operator == "!=" {
        "ne"
    } else {
        "eq"
    }
}

/// The quoted literal of a comparison, whichever quote style matched.
fn literal<'a>(caps: &'a Captures) -> &'a str {
    literal_at(caps, 3)
}

fn literal_at<'a>(caps: &'a Captures, first: usize) -> &'a str {
    caps.get(first)
        .or_else(|| caps.get(first + 1))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(template: &str) -> String {
        JinjaConverter::new().unwrap().convert(template).unwrap()
    }

    #[test]
    fn test_convert_simple_conditionals() {
        assert_eq!(
            convert("{% if condition %}true{% else %}false{% endif %}"),
            "{{#if condition}}true{{else}}false{{/if}}"
        );
    }

    #[test]
    fn test_convert_comparison_conditionals() {
        assert_eq!(
            convert(r#"{% if env == "prod" %}live{% endif %}"#),
            "{{#if (eq env 'prod')}}live{{/if}}"
        );
        assert_eq!(
            convert("{% if env != 'prod' %}test{% endif %}"),
            "{{#if (ne env 'prod')}}test{{/if}}"
        );
    }

    #[test]
    fn test_convert_loops_rewrites_loop_variable() {
        assert_eq!(
            convert("{% for pkg in packages %}{{ pkg }} {% endfor %}"),
            "{{#each packages}}{{this}} {{/each}}"
        );
        assert_eq!(
            convert("{% for user in users %}{{ user.name }}{% endfor %}"),
            "{{#each users}}{{name}}{{/each}}"
        );
    }

    #[test]
    fn test_convert_default_filters() {
        assert_eq!(
            convert("{{ name | default('unknown') }} {{port | default(8080)}}"),
            "{{default name 'unknown'}} {{default port 8080}}"
        );
        assert_eq!(
            convert(r#"{{ app.user | default("www") }}"#),
            "{{default app.user 'www'}}"
        );
    }

    #[test]
    fn test_validate_balanced_blocks() {
        let converter = JinjaConverter::new().unwrap();
        assert!(converter
            .validate("{% if x %}{% for y in z %}{{y}}{% endfor %}{% endif %}")
            .is_ok());
        assert!(matches!(
            converter.validate("{% if x %}content"),
            Err(TemplateError::UnbalancedBlocks { .. })
        ));
        assert!(matches!(
            converter.validate("{% endfor %}"),
            Err(TemplateError::UnbalancedBlocks { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unsupported_statements() {
        let converter = JinjaConverter::new().unwrap();
        assert!(matches!(
            converter.validate("{% set x = 1 %}{{ x }}"),
            Err(TemplateError::Unsupported { feature: "variable assignment" })
        ));
        assert!(matches!(
            converter.validate("{{ name "),
            Err(TemplateError::ValidationFailed { .. })
        ));
    }
}
