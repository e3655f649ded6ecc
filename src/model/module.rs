use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

pub const BUILTIN_PREFIX: &str = "ansible.builtin.";

pub const INCLUDE_TASKS_ACTION: &str = "include_tasks";
pub const IMPORT_TASKS_ACTION: &str = "import_tasks";
pub const INCLUDE_ROLE_ACTION: &str = "include_role";
pub const IMPORT_ROLE_ACTION: &str = "import_role";
pub const IMPORT_PLAYBOOK_ACTION: &str = "import_playbook";
pub const INCLUDE_PLAYBOOK_ACTION: &str = "include_playbook";

/// Bare names followed by their `ansible.builtin.` spellings.
pub fn with_builtin_prefix(actions: &[&str]) -> Vec<String> {
    actions
        .iter()
        .map(|action| action.to_string())
        .chain(
            actions
                .iter()
                .map(|action| format!("{BUILTIN_PREFIX}{action}")),
        )
        .collect()
}

/// Rendered parameters of a task action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module(HashMap<String, Value>);

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the string-valued parameters.
    pub fn to_string_map(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|s| (key.clone(), s.to_string())))
            .collect()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }
}

impl Deref for Module {
    type Target = HashMap<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Module {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<(String, Value)> for Module {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parameters of `include_tasks` / `import_tasks`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskIncludeModule {
    pub file: String,
}

/// Parameters of `include_role` / `import_role`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoleIncludeModule {
    pub name: String,
    #[serde(default)]
    pub tasks_from: Option<String>,
    #[serde(default)]
    pub defaults_from: Option<String>,
    #[serde(default)]
    pub vars_from: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub public: Option<bool>,
}

fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleBool {
        Bool(bool),
        Text(String),
    }

    match Option::<FlexibleBool>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FlexibleBool::Bool(value)) => Ok(Some(value)),
        Some(FlexibleBool::Text(text)) => match text.to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" | "1" => Ok(Some(true)),
            "no" | "false" | "off" | "0" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean value: {other}"
            ))),
        },
    }
}
