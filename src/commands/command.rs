use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One placeholder a step needs filled before it runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArgumentDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

/// The `{{name}}` token an argument called `name` replaces.
#[must_use]
pub fn placeholder(name: &str) -> String {
    format!("{{{{{name}}}}}")
}

/// A single step of a command set
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Command {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub platforms: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_on_error: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgumentDef>,
}

impl Command {
    /// Shell text to run on `platform`.
    ///
    /// A matching platform variant wins. When variants exist but none matches and there is no
    /// generic `command`, the step is unsupported on this platform and the result is empty.
    /// Otherwise the generic `command` is returned, which may itself be empty.
    #[must_use]
    pub fn resolve_text(&self, platform: &str) -> &str {
        if let Some(text) = self.platforms.get(platform) {
            return text;
        }
        if !self.platforms.is_empty() && self.command.is_empty() {
            return "";
        }
        &self.command
    }

    /// Platform keys this step has variants for, sorted.
    #[must_use]
    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms.keys().map(String::as_str).collect()
    }
}
