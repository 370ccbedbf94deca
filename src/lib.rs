//! Core implementation of the ShellDock command runbook
//!
//! ShellDock stores named, versioned sets of shell command steps as YAML documents in two
//! repositories: a bundled one shipped with the installation and a local overlay under the
//! user's home directory that takes precedence. Sets are looked up by name (optionally with a
//! version or tag), previewed, and executed step by step with platform-specific command text
//! and templated arguments.

pub mod args;
pub mod commands;
pub mod config_file;
pub mod filter;
pub mod logger;
pub mod manager;
pub mod platform;
pub mod repository;
pub mod run;

/// A command-set name with an optional version or tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub name: String,
    /// Empty for the latest version.
    pub version: String,
}

impl Selector {
    /// Parse `name` or `name@version`; a version embedded with `@` wins over `version_flag`.
    #[must_use]
    pub fn parse(input: &str, version_flag: Option<&str>) -> Selector {
        match input.find('@') {
            Some(idx) if idx > 0 => Selector {
                name: input[..idx].to_string(),
                version: input[idx + 1..].to_string(),
            },
            _ => Selector {
                name: input.to_string(),
                version: version_flag.unwrap_or_default().to_string(),
            },
        }
    }
}
