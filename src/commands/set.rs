use serde::{Deserialize, Deserializer, Serialize};

use crate::commands::command::Command;

/// Version-flattened view of a command set, ready to execute
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandSet {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "version_string")]
    pub version: String,
    #[serde(default)]
    pub commands: Vec<Command>,
}

/// One version entry of a versioned command set
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionInfo {
    #[serde(default, deserialize_with = "version_string")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub latest: bool,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl VersionInfo {
    /// Whether `requested` selects this entry, by exact version, normalized version number or
    /// case-insensitive tag.
    #[must_use]
    pub fn matches(&self, requested: &str) -> bool {
        versions_match(&self.version, requested)
            || (!self.tag.is_empty() && self.tag.eq_ignore_ascii_case(requested))
    }
}

/// Canonical on-disk shape: a named list of versions
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionedCommandSet {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub versions: Vec<VersionInfo>,
}

impl VersionedCommandSet {
    /// Index of the entry that "latest" resolves to.
    ///
    /// The first entry flagged `latest` wins. Without a flag the entry with the highest version
    /// number wins, first one on ties; entries whose version has no numeric part never win.
    #[must_use]
    pub fn latest_index(&self) -> Option<usize> {
        if let Some(idx) = self.versions.iter().position(|v| v.latest) {
            return Some(idx);
        }
        let mut best: Option<(usize, u64)> = None;
        for (idx, info) in self.versions.iter().enumerate() {
            let num = version_number(&info.version);
            if num > best.map_or(0, |(_, n)| n) {
                best = Some((idx, num));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Find the entry selected by `requested`; empty or `latest` selects the latest entry.
    #[must_use]
    pub fn find(&self, requested: &str) -> Option<&VersionInfo> {
        if is_latest_request(requested) {
            return self.latest_index().map(|idx| &self.versions[idx]);
        }
        self.versions.iter().find(|v| v.matches(requested))
    }

    /// Flatten one of this set's entries into an executable view.
    #[must_use]
    pub fn project(&self, info: &VersionInfo) -> CommandSet {
        CommandSet {
            name: self.name.clone(),
            description: info.description.clone(),
            version: info.version.clone(),
            commands: info.commands.clone(),
        }
    }

    /// Update the entry matching `version` in place, or append a new one.
    pub fn upsert(&mut self, version: &str, description: &str, commands: &[Command]) {
        if let Some(existing) = self
            .versions
            .iter_mut()
            .find(|v| versions_match(&v.version, version))
        {
            existing.description = description.to_string();
            existing.commands = commands.to_vec();
        } else {
            self.versions.push(VersionInfo {
                version: version.to_string(),
                description: description.to_string(),
                commands: commands.to_vec(),
                ..Default::default()
            });
        }
    }

    /// Flag exactly one entry as latest: the highest version number, earliest entry on ties.
    pub fn mark_latest(&mut self) {
        let mut winner = 0;
        let mut highest = 0;
        for (idx, info) in self.versions.iter().enumerate() {
            let num = version_number(&info.version);
            if num > highest {
                highest = num;
                winner = idx;
            }
        }
        for (idx, info) in self.versions.iter_mut().enumerate() {
            info.latest = idx == winner;
        }
    }
}

impl From<CommandSet> for VersionedCommandSet {
    /// Convert a bare single-version document into a one-entry versioned set.
    fn from(bare: CommandSet) -> Self {
        let version = if bare.version.is_empty() {
            "v1".to_string()
        } else {
            canonical_version(&bare.version)
        };
        VersionedCommandSet {
            name: bare.name,
            description: String::new(),
            versions: vec![VersionInfo {
                version,
                description: bare.description,
                latest: true,
                commands: bare.commands,
                ..Default::default()
            }],
        }
    }
}

/// A parsed command-set file in either of its two shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Versioned(VersionedCommandSet),
    Bare(CommandSet),
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "version_string")]
    version: String,
    #[serde(default)]
    commands: Vec<Command>,
    #[serde(default)]
    versions: Vec<VersionInfo>,
}

impl Document {
    /// Parse a YAML command-set document.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the text is not a valid command-set document.
    pub fn parse(contents: &str) -> Result<Document, serde_yaml::Error> {
        let raw: RawDocument = serde_yaml::from_str(contents)?;
        if raw.versions.is_empty() {
            Ok(Document::Bare(CommandSet {
                name: raw.name,
                description: raw.description,
                version: raw.version,
                commands: raw.commands,
            }))
        } else {
            Ok(Document::Versioned(VersionedCommandSet {
                name: raw.name,
                description: raw.description,
                versions: raw.versions,
            }))
        }
    }
}

/// Empty and `latest` both mean "resolve the latest version".
#[must_use]
pub fn is_latest_request(version: &str) -> bool {
    version.is_empty() || version == "latest"
}

/// Strip a single leading `v`/`V`.
#[must_use]
pub fn normalize_version(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

/// Numeric part of a version like `v12`; anything non-numeric counts as 0.
#[must_use]
pub fn version_number(version: &str) -> u64 {
    normalize_version(version).parse().unwrap_or(0)
}

/// `v1`, `V1` and `1` all denote the same version.
#[must_use]
pub fn versions_match(a: &str, b: &str) -> bool {
    a == b || normalize_version(a) == normalize_version(b)
}

/// Prefix purely numeric versions with `v`; anything else is kept as written.
#[must_use]
pub fn canonical_version(version: &str) -> String {
    if !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) {
        format!("v{version}")
    } else {
        version.to_string()
    }
}

fn version_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => String::new(),
        Some(Raw::Text(s)) => s,
        Some(Raw::Int(n)) => n.to_string(),
        Some(Raw::Float(f)) => f.to_string(),
    })
}
