//! YAML documents decoded into owned, not yet stamped entity trees.
//!
//! Values come from `serde_yaml`; line ranges come from a second,
//! span-aware parse with `marked-yaml`. The span parse is best effort: when
//! it fails (anchors, tags it rejects) entities get an empty range.

use crate::loader::error::DecodeError;
use crate::model::Range;
use crate::variables::Variables;
use marked_yaml::{LoaderOptions, Node};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

pub(crate) struct Document {
    value: Value,
    marks: Option<Node>,
}

impl Document {
    pub(crate) fn parse(path: &Path, content: &str) -> Result<Self, DecodeError> {
        if content.trim().is_empty() {
            return Ok(Self {
                value: Value::Null,
                marks: None,
            });
        }

        let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
        let value = yaml_to_json(yaml);
        let marks = parse_marks(path, content, &value);
        Ok(Self { value, marks })
    }

    fn root(&self) -> (&Value, Marks<'_>) {
        (&self.value, Marks(self.marks.as_ref()))
    }
}

/// Span-aware parse of `content`. `marked-yaml` only accepts a top-level
/// mapping or sequence, so the shape is taken from the decoded `value`.
fn parse_marks(path: &Path, content: &str, value: &Value) -> Option<Node> {
    let options = LoaderOptions::default().error_on_duplicate_keys(false);
    let options = match value {
        Value::Array(_) => options.toplevel_sequence(),
        Value::Object(_) => options.toplevel_mapping(),
        _ => return None,
    };
    match marked_yaml::parse_yaml_with_options(0, content, options) {
        Ok(node) => Some(node),
        Err(e) => {
            debug!("No line information for {}: {e}", path.display());
            None
        }
    }
}

/// Converts a YAML value, dropping tags (`!vault` and friends) and turning
/// non-string mapping keys into their string form.
pub(crate) fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (mapping_key(key), yaml_to_json(value)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn mapping_key(key: serde_yaml::Value) -> String {
    match yaml_to_json(key) {
        Value::String(s) => s,
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Cursor into the span-aware tree, following the same path as the value.
#[derive(Clone, Copy)]
struct Marks<'a>(Option<&'a Node>);

impl<'a> Marks<'a> {
    fn item(self, index: usize) -> Marks<'a> {
        Marks(
            self.0
                .and_then(Node::as_sequence)
                .and_then(|sequence| sequence.get(index)),
        )
    }

    fn key(self, key: &str) -> Marks<'a> {
        Marks(
            self.0
                .and_then(Node::as_mapping)
                .and_then(|mapping| mapping.get_node(key)),
        )
    }

    fn range(self) -> Range {
        self.0.map(Range::from_node).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawTask {
    pub range: Range,
    pub name: Option<String>,
    pub vars: Variables,
    pub raw: Map<String, Value>,
    pub block: Vec<RawTask>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawRoleDefinition {
    pub range: Range,
    pub name: String,
    pub vars: Variables,
}

#[derive(Debug, Clone)]
pub(crate) struct RawPlay {
    pub range: Range,
    pub name: Option<String>,
    pub hosts: Option<String>,
    pub roles: Vec<RawRoleDefinition>,
    pub pre_tasks: Vec<RawTask>,
    pub tasks: Vec<RawTask>,
    pub post_tasks: Vec<RawTask>,
    pub vars: Variables,
    pub vars_files: Vec<String>,
    pub raw: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RawRoleMeta {
    pub range: Range,
    pub dependencies: Vec<RawRoleDefinition>,
}

pub(crate) fn decode_task_list(document: &Document) -> Result<Vec<RawTask>, DecodeError> {
    let (value, marks) = document.root();
    decode_tasks(value, marks, "tasks")
}

pub(crate) fn decode_playbook(document: &Document) -> Result<Vec<RawPlay>, DecodeError> {
    let (value, marks) = document.root();
    let plays = value
        .as_array()
        .ok_or_else(|| unexpected("a list of plays", "playbook", value))?;

    plays
        .iter()
        .enumerate()
        .map(|(i, play)| decode_play(play, marks.item(i), &format!("plays[{i}]")))
        .collect()
}

pub(crate) fn decode_role_meta(document: &Document) -> Result<RawRoleMeta, DecodeError> {
    let (value, marks) = document.root();
    match value {
        Value::Null => Ok(RawRoleMeta::default()),
        Value::Object(mapping) => {
            let dependencies = match mapping.get("dependencies") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        decode_role_definition(
                            item,
                            marks.key("dependencies").item(i),
                            &format!("dependencies[{i}]"),
                        )
                    })
                    .collect::<Result<_, _>>()?,
                Some(other) => return Err(unexpected("a list", "dependencies", other)),
            };
            Ok(RawRoleMeta {
                range: marks.range(),
                dependencies,
            })
        }
        other => Err(unexpected("a mapping", "meta", other)),
    }
}

pub(crate) fn decode_variables(document: &Document) -> Result<Variables, DecodeError> {
    let (value, _) = document.root();
    variables(Some(value), "variables")
}

fn decode_tasks(value: &Value, marks: Marks<'_>, location: &str) -> Result<Vec<RawTask>, DecodeError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode_task(item, marks.item(i), &format!("{location}[{i}]")))
            .collect(),
        other => Err(unexpected("a list of tasks", location, other)),
    }
}

fn decode_task(value: &Value, marks: Marks<'_>, location: &str) -> Result<RawTask, DecodeError> {
    let mapping = value
        .as_object()
        .ok_or_else(|| unexpected("a task mapping", location, value))?;

    let block_location = format!("{location}.block");
    let block = match mapping.get("block") {
        Some(block) => decode_tasks(block, marks.key("block"), &block_location)?,
        None => Vec::new(),
    };

    Ok(RawTask {
        range: marks.range(),
        name: scalar_string(mapping.get("name"), &format!("{location}.name"))?,
        vars: variables(mapping.get("vars"), &format!("{location}.vars"))?,
        raw: mapping.clone(),
        block,
    })
}

fn decode_play(value: &Value, marks: Marks<'_>, location: &str) -> Result<RawPlay, DecodeError> {
    let mapping = value
        .as_object()
        .ok_or_else(|| unexpected("a play mapping", location, value))?;

    let task_section = |key: &str| match mapping.get(key) {
        Some(tasks) => decode_tasks(tasks, marks.key(key), &format!("{location}.{key}")),
        None => Ok(Vec::new()),
    };

    let roles = match mapping.get("roles") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                decode_role_definition(
                    item,
                    marks.key("roles").item(i),
                    &format!("{location}.roles[{i}]"),
                )
            })
            .collect::<Result<_, _>>()?,
        Some(other) => return Err(unexpected("a list of roles", location, other)),
    };

    let vars_files = string_list(
        mapping.get("vars_files").or_else(|| mapping.get("var_files")),
        &format!("{location}.vars_files"),
    )?;

    Ok(RawPlay {
        range: marks.range(),
        name: scalar_string(mapping.get("name"), &format!("{location}.name"))?,
        hosts: from_value::<Option<OneOrMany>>(
            mapping.get("hosts").unwrap_or(&Value::Null),
            &format!("{location}.hosts"),
        )?
        .map(|hosts| hosts.into_vec().join(",")),
        roles,
        pre_tasks: task_section("pre_tasks")?,
        tasks: task_section("tasks")?,
        post_tasks: task_section("post_tasks")?,
        vars: variables(mapping.get("vars"), &format!("{location}.vars"))?,
        vars_files,
        raw: mapping.clone(),
    })
}

fn decode_role_definition(
    value: &Value,
    marks: Marks<'_>,
    location: &str,
) -> Result<RawRoleDefinition, DecodeError> {
    let (name, vars) = match from_value::<RoleReference>(value, location)? {
        RoleReference::Name(name) => (name, Variables::new()),
        RoleReference::Mapping { role, name, vars } => {
            let name = role
                .or(name)
                .ok_or_else(|| unexpected("a role name", location, value))?;
            (name, vars.unwrap_or_default())
        }
    };

    Ok(RawRoleDefinition {
        range: marks.range(),
        name,
        vars,
    })
}

/// A role reference: `- web` or `- role: web` (`name` is accepted too).
#[derive(Deserialize)]
#[serde(untagged)]
enum RoleReference {
    Name(String),
    Mapping {
        role: Option<String>,
        name: Option<String>,
        vars: Option<Variables>,
    },
}

/// A string or a list of strings, e.g. `hosts: web` or `hosts: [web, db]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

fn from_value<T: DeserializeOwned>(value: &Value, location: &str) -> Result<T, DecodeError> {
    T::deserialize(value).map_err(|source| DecodeError::Invalid {
        location: location.to_string(),
        source,
    })
}

fn variables(value: Option<&Value>, location: &str) -> Result<Variables, DecodeError> {
    match value {
        None => Ok(Variables::new()),
        Some(value) => {
            from_value::<Option<Variables>>(value, location).map(Option::unwrap_or_default)
        }
    }
}

fn scalar_string(value: Option<&Value>, location: &str) -> Result<Option<String>, DecodeError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(unexpected("a string", location, other)),
    }
}

fn string_list(value: Option<&Value>, location: &str) -> Result<Vec<String>, DecodeError> {
    match value {
        None => Ok(Vec::new()),
        Some(value) => from_value::<Option<OneOrMany>>(value, location)
            .map(|list| list.map(OneOrMany::into_vec).unwrap_or_default()),
    }
}

fn unexpected(expected: &'static str, location: &str, found: &Value) -> DecodeError {
    DecodeError::UnexpectedShape {
        expected,
        location: location.to_string(),
        found: value_kind(found),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
