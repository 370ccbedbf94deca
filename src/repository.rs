//! Filesystem-backed command-set repository
//!
//! A repository owns one root directory. Command sets live in `<name>.yaml` files either at the
//! root or anywhere below it; lookups by name check the root first and then walk subdirectories
//! breadth-first in lexicographic order.

use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::commands::set::{
    CommandSet, Document, VersionedCommandSet, canonical_version, is_latest_request,
    versions_match,
};

const EXTENSION: &str = "yaml";

/// Subdirectory levels searched below a repository root
const MAX_DEPTH: usize = 16;

/// Errors that can occur while reading or writing command sets
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("command set '{name}'{} not found in {location}", version_suffix(.version.as_deref()))]
    NotFound {
        name: String,
        version: Option<String>,
        location: String,
    },
    #[error("command set '{name}' version '{version}' not found (available: {available})")]
    VersionNotFound {
        name: String,
        version: String,
        available: String,
    },
    #[error("Unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to parse command set {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

fn version_suffix(version: Option<&str>) -> String {
    match version {
        Some(v) if !v.is_empty() => format!(" version '{v}'"),
        _ => String::new(),
    }
}

/// A directory of command-set documents
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Repository { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `name`, if any.
    #[must_use]
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let file_name = format!("{name}.{EXTENSION}");
        let direct = self.root.join(&file_name);
        if direct.is_file() {
            return Some(direct);
        }
        YamlFiles::new(&self.root)
            .find(|path| path.file_name().is_some_and(|f| f == file_name.as_str()))
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }

    fn load(&self, name: &str) -> Result<Option<(PathBuf, Document)>, RepoError> {
        let Some(path) = self.locate(name) else {
            return Ok(None);
        };
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(RepoError::Io { path, source }),
        };
        let document = Document::parse(&contents).map_err(|source| RepoError::Yaml {
            path: path.clone(),
            source,
        })?;
        Ok(Some((path, document)))
    }

    /// Resolve `name` at `version` (empty or `latest` for the latest version).
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if no file holds the set, `RepoError::VersionNotFound` if the
    /// requested version or tag is absent, or an I/O or YAML error if the file cannot be read.
    pub fn get_command_set(&self, name: &str, version: &str) -> Result<CommandSet, RepoError> {
        let Some((path, document)) = self.load(name)? else {
            return Err(RepoError::NotFound {
                name: name.to_string(),
                version: Some(version.to_string()),
                location: self.root.display().to_string(),
            });
        };
        debug!("Resolving '{name}' version '{version}' from {}", path.display());
        match document {
            Document::Versioned(versioned) => match versioned.find(version) {
                Some(info) => Ok(versioned.project(info)),
                None => Err(RepoError::VersionNotFound {
                    name: name.to_string(),
                    version: if version.is_empty() {
                        "latest".to_string()
                    } else {
                        version.to_string()
                    },
                    available: versioned
                        .versions
                        .iter()
                        .map(|v| v.version.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                }),
            },
            Document::Bare(set) => {
                if !is_latest_request(version) && !versions_match(&set.version, version) {
                    return Err(RepoError::VersionNotFound {
                        name: name.to_string(),
                        version: version.to_string(),
                        available: set.version,
                    });
                }
                Ok(set)
            }
        }
    }

    /// Describe every version of `name`, marking the one "latest" resolves to.
    ///
    /// Returns an empty list when the set does not exist.
    ///
    /// # Errors
    ///
    /// Returns an I/O or YAML error if the file exists but cannot be read.
    pub fn list_versions(&self, name: &str) -> Result<Vec<String>, RepoError> {
        let Some((_, document)) = self.load(name)? else {
            return Ok(Vec::new());
        };
        Ok(match document {
            Document::Versioned(versioned) => {
                let latest = versioned.latest_index();
                versioned
                    .versions
                    .iter()
                    .enumerate()
                    .map(|(idx, info)| {
                        let mut label = info.version.clone();
                        if !info.tag.is_empty() {
                            label.push_str(&format!(" [{}]", info.tag));
                        }
                        if latest == Some(idx) {
                            label.push_str(" (latest)");
                        }
                        label
                    })
                    .collect()
            }
            Document::Bare(set) => {
                let version = if set.version.is_empty() { "v1" } else { &set.version };
                vec![format!("{version} (latest)")]
            }
        })
    }

    /// Write `set` into the version slot `version` of its document, creating the file if needed.
    ///
    /// An empty or `latest` version falls back to `set.version`, then to `v1`. Bare documents are
    /// converted to the versioned shape. Afterwards exactly one entry is flagged latest.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Io` if the directory or file cannot be written.
    pub fn save_command_set(&self, set: &CommandSet, version: &str) -> Result<PathBuf, RepoError> {
        let slot = if is_latest_request(version) {
            if set.version.is_empty() { "v1" } else { set.version.as_str() }
        } else {
            version
        };
        let slot = canonical_version(slot);

        let (path, mut versioned) = match self.load(&set.name) {
            Ok(Some((path, Document::Versioned(versioned)))) => (path, versioned),
            Ok(Some((path, Document::Bare(bare)))) => (path, VersionedCommandSet::from(bare)),
            Ok(None) => (self.default_path(&set.name), VersionedCommandSet::default()),
            Err(RepoError::Yaml { path, source }) => {
                warn!("Replacing unparseable command set {}: {source}", path.display());
                (path, VersionedCommandSet::default())
            }
            Err(e) => return Err(e),
        };

        if versioned.name.is_empty() {
            versioned.name.clone_from(&set.name);
        }
        versioned.upsert(&slot, &set.description, &set.commands);
        versioned.mark_latest();

        let contents = serde_yaml::to_string(&versioned).map_err(|source| RepoError::Yaml {
            path: path.clone(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| RepoError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, contents).map_err(|source| RepoError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Saved '{}' version '{slot}' to {}", set.name, path.display());
        Ok(path)
    }

    fn default_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{EXTENSION}"))
    }

    /// Names of all command sets below the root; a missing root is empty.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Io` if the root exists but cannot be read.
    pub fn list_command_sets(&self) -> Result<BTreeSet<String>, RepoError> {
        if !self.root.is_dir() {
            return Ok(BTreeSet::new());
        }
        fs::read_dir(&self.root).map_err(|source| RepoError::Io {
            path: self.root.clone(),
            source,
        })?;
        Ok(YamlFiles::new(&self.root)
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect())
    }

    /// Remove the file holding `name`.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the set does not exist, or `RepoError::Io` if removal fails.
    pub fn delete_command_set(&self, name: &str) -> Result<(), RepoError> {
        let path = self.locate(name).ok_or_else(|| RepoError::NotFound {
            name: name.to_string(),
            version: None,
            location: self.root.display().to_string(),
        })?;
        fs::remove_file(&path).map_err(|source| RepoError::Io { path, source })
    }
}

/// Breadth-first walk yielding `*.yaml` files, entries of each directory in name order.
struct YamlFiles {
    dirs: VecDeque<(PathBuf, usize)>,
    files: VecDeque<PathBuf>,
}

impl YamlFiles {
    fn new(root: &Path) -> Self {
        YamlFiles {
            dirs: VecDeque::from([(root.to_path_buf(), 0)]),
            files: VecDeque::new(),
        }
    }

    fn expand(&mut self, dir: &Path, depth: usize) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if depth > 0 {
                    warn!("Skipping unreadable directory {}: {e}", dir.display());
                }
                return;
            }
        };
        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();
        for path in paths {
            if path.is_dir() {
                if depth < MAX_DEPTH {
                    self.dirs.push_back((path, depth + 1));
                }
            } else if path.extension().is_some_and(|ext| ext == EXTENSION) {
                self.files.push_back(path);
            }
        }
    }
}

impl Iterator for YamlFiles {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if let Some(file) = self.files.pop_front() {
                return Some(file);
            }
            let (dir, depth) = self.dirs.pop_front()?;
            self.expand(&dir, depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command::Command;

    const VERSIONED: &str = r#"
name: test
description: Test command set
versions:
  - version: "v1"
    description: Version 1
    commands:
      - description: Command 1
        command: echo "v1"
  - version: "v2"
    latest: true
    tag: stable
    description: Version 2
    commands:
      - description: Command 2
        command: echo "v2"
  - version: "v3"
    description: Version 3
    commands: []
"#;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn sample(name: &str, description: &str, version: &str) -> CommandSet {
        CommandSet {
            name: name.to_string(),
            description: description.to_string(),
            version: version.to_string(),
            commands: vec![Command {
                description: "say".to_string(),
                command: format!("echo {description}"),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_get_single_version() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "test.yaml",
            "name: test\ndescription: Test\nversion: \"v1\"\ncommands:\n  - description: Test\n    command: echo test\n",
        );
        let repo = Repository::new(dir.path());
        let set = repo.get_command_set("test", "").unwrap();
        assert_eq!(set.name, "test");
        assert_eq!(set.version, "v1");
        assert_eq!(set.commands.len(), 1);
    }

    #[test]
    fn test_get_versioned() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "test.yaml", VERSIONED);
        let repo = Repository::new(dir.path());
        assert_eq!(repo.get_command_set("test", "").unwrap().version, "v2");
        assert_eq!(repo.get_command_set("test", "latest").unwrap().version, "v2");
        assert_eq!(repo.get_command_set("test", "1").unwrap().version, "v1");
        assert_eq!(repo.get_command_set("test", "STABLE").unwrap().version, "v2");
        let v1 = repo.get_command_set("test", "v1").unwrap();
        assert_eq!(v1.description, "Version 1");
        assert_eq!(v1.name, "test");
    }

    #[test]
    fn test_missing_version_of_versioned_set() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "test.yaml", VERSIONED);
        let repo = Repository::new(dir.path());
        match repo.get_command_set("test", "v9").unwrap_err() {
            RepoError::VersionNotFound { version, available, .. } => {
                assert_eq!(version, "v9");
                assert_eq!(available, "v1, v2, v3");
            }
            other => panic!("Expected VersionNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn test_bare_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "git.yaml", "name: git\nversion: v2\ncommands: []\n");
        let repo = Repository::new(dir.path());
        assert!(matches!(
            repo.get_command_set("git", "v1"),
            Err(RepoError::VersionNotFound { .. })
        ));
        assert_eq!(repo.get_command_set("git", "").unwrap().version, "v2");
        assert_eq!(repo.get_command_set("git", "2").unwrap().version, "v2");
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path());
        let err = repo.get_command_set("nonexistent", "").unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
        assert!(err.to_string().contains("'nonexistent'"));
    }

    #[test]
    fn test_subdirectory_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/tool.yaml", "name: tool\ndescription: from b\ncommands: []\n");
        write(dir.path(), "a/tool.yaml", "name: tool\ndescription: from a\ncommands: []\n");
        let repo = Repository::new(dir.path());
        assert!(repo.exists("tool"));
        assert_eq!(repo.get_command_set("tool", "").unwrap().description, "from a");

        write(dir.path(), "tool.yaml", "name: tool\ndescription: root\ncommands: []\n");
        assert_eq!(repo.get_command_set("tool", "").unwrap().description, "root");
    }

    #[test]
    fn test_missing_root_is_empty() {
        let repo = Repository::new("/dev/null/shelldock");
        assert!(!repo.exists("docker"));
        assert!(repo.list_command_sets().unwrap().is_empty());
        assert!(repo.list_versions("docker").unwrap().is_empty());
    }

    #[test]
    fn test_list_command_sets_recursive_dedup() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "docker.yaml", "name: docker\n");
        write(dir.path(), "cloud/aws.yaml", "name: aws\n");
        write(dir.path(), "cloud/deep/docker.yaml", "name: docker\n");
        write(dir.path(), "notes.txt", "ignored");
        let repo = Repository::new(dir.path());
        let names: Vec<_> = repo.list_command_sets().unwrap().into_iter().collect();
        assert_eq!(names, vec!["aws", "docker"]);
    }

    #[test]
    fn test_list_versions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "test.yaml", VERSIONED);
        write(dir.path(), "bare.yaml", "name: bare\ncommands: []\n");
        let repo = Repository::new(dir.path());
        assert_eq!(
            repo.list_versions("test").unwrap(),
            vec!["v1", "v2 [stable] (latest)", "v3"]
        );
        assert_eq!(repo.list_versions("bare").unwrap(), vec!["v1 (latest)"]);
        assert!(repo.list_versions("absent").unwrap().is_empty());
    }

    #[test]
    fn test_save_new_and_append_version() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path().join("nested"));
        repo.save_command_set(&sample("web", "first", ""), "").unwrap();
        assert_eq!(repo.get_command_set("web", "").unwrap().version, "v1");

        repo.save_command_set(&sample("web", "second", ""), "2").unwrap();
        let latest = repo.get_command_set("web", "").unwrap();
        assert_eq!(latest.version, "v2");
        assert_eq!(latest.description, "second");
        assert_eq!(repo.get_command_set("web", "v1").unwrap().description, "first");

        repo.save_command_set(&sample("web", "first again", "v1"), "latest").unwrap();
        assert_eq!(repo.get_command_set("web", "v1").unwrap().description, "first again");
        assert_eq!(repo.list_versions("web").unwrap(), vec!["v1", "v2 (latest)"]);
    }

    #[test]
    fn test_save_converts_bare_document() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "git.yaml",
            "name: git\ndescription: old\nversion: \"3\"\ncommands: []\n",
        );
        let repo = Repository::new(dir.path());
        repo.save_command_set(&sample("git", "new", ""), "v2").unwrap();
        assert_eq!(repo.list_versions("git").unwrap(), vec!["v3 (latest)", "v2"]);
        assert_eq!(repo.get_command_set("git", "").unwrap().description, "old");
    }

    #[test]
    fn test_save_bare_tie_favors_existing() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "git.yaml",
            "name: git\ndescription: old\nversion: beta\ncommands: []\n",
        );
        let repo = Repository::new(dir.path());
        repo.save_command_set(&sample("git", "new", "rc"), "").unwrap();
        assert_eq!(repo.list_versions("git").unwrap(), vec!["beta (latest)", "rc"]);
    }

    #[test]
    fn test_save_updates_file_in_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ops/deploy.yaml", "name: deploy\nversion: v1\ncommands: []\n");
        let repo = Repository::new(dir.path());
        let path = repo.save_command_set(&sample("deploy", "v2 body", "v2"), "").unwrap();
        assert_eq!(path, dir.path().join("ops/deploy.yaml"));
        assert!(!dir.path().join("deploy.yaml").exists());
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path());
        repo.save_command_set(&sample("tmp", "x", ""), "").unwrap();
        repo.delete_command_set("tmp").unwrap();
        assert!(!repo.exists("tmp"));
        assert!(matches!(
            repo.delete_command_set("tmp"),
            Err(RepoError::NotFound { .. })
        ));
    }
}
