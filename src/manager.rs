//! Local-over-bundled composition of two repositories

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::commands::set::CommandSet;
use crate::repository::{RepoError, Repository};

/// Directory under the user's home holding the local repository and config
pub const LOCAL_REPO_DIR: &str = ".shelldock";

/// Root used when no bundled repository is installed; it can never exist because `/dev/null`
/// is not a directory.
const MISSING_BUNDLED_ROOT: &str = "/dev/null/shelldock";

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Unable to determine the home directory")]
    NoHomeDirectory,
}

/// `~/.shelldock`, if a home directory is known.
#[must_use]
pub fn local_root() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(LOCAL_REPO_DIR))
}

/// Installation locations searched for the bundled repository, in priority order.
#[must_use]
pub fn bundled_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("/usr/share/shelldock/repository"),
        PathBuf::from("/usr/local/share/shelldock/repository"),
    ];
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join("..").join("share").join("shelldock").join("repository"));
        candidates.push(exe_dir.join("repository"));
    }
    candidates.push(PathBuf::from("repository"));
    candidates
}

/// First candidate that is a directory, or a root that behaves as a permanently empty repository.
#[must_use]
pub fn find_bundled_root(candidates: &[PathBuf]) -> PathBuf {
    for candidate in candidates {
        let path = std::path::absolute(candidate).unwrap_or_else(|_| candidate.clone());
        if path.is_dir() {
            info!("Using bundled repository at {}", path.display());
            return path;
        }
    }
    debug!("No bundled repository found");
    PathBuf::from(MISSING_BUNDLED_ROOT)
}

/// Resolves command sets from the local repository first, then the bundled one
#[derive(Debug, Clone)]
pub struct Manager {
    local: Repository,
    bundled: Repository,
}

impl Manager {
    #[must_use]
    pub fn new(local: Repository, bundled: Repository) -> Self {
        Manager { local, bundled }
    }

    /// Build a manager over `~/.shelldock` and the first installed bundled repository.
    ///
    /// # Errors
    ///
    /// Returns `ManagerError::NoHomeDirectory` if the home directory cannot be determined.
    pub fn discover() -> Result<Self, ManagerError> {
        let local = local_root().ok_or(ManagerError::NoHomeDirectory)?;
        let bundled = find_bundled_root(&bundled_candidates());
        debug!("Local repository at {}", local.display());
        Ok(Manager::new(Repository::new(local), Repository::new(bundled)))
    }

    #[must_use]
    pub fn local(&self) -> &Repository {
        &self.local
    }

    #[must_use]
    pub fn bundled(&self) -> &Repository {
        &self.bundled
    }

    /// Resolve `name` at `version`.
    ///
    /// Once the local repository has the name it answers alone, version errors included. With
    /// `local_only` the bundled repository is never consulted.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if neither repository has the name, or any error from the
    /// repository that owns it.
    pub fn get_command_set(
        &self,
        name: &str,
        local_only: bool,
        version: &str,
    ) -> Result<CommandSet, RepoError> {
        if self.local.exists(name) {
            debug!("'{name}' found in local repository");
            return self.local.get_command_set(name, version);
        }
        if !local_only && self.bundled.exists(name) {
            debug!("'{name}' found in bundled repository");
            return self.bundled.get_command_set(name, version);
        }
        Err(RepoError::NotFound {
            name: name.to_string(),
            version: Some(version.to_string()),
            location: if local_only {
                "local directory".to_string()
            } else {
                "local directory or repository".to_string()
            },
        })
    }

    /// Version descriptors for `name` with the same local-first precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if the owning repository's file cannot be read.
    pub fn list_versions(&self, name: &str, local_only: bool) -> Result<Vec<String>, RepoError> {
        if self.local.exists(name) {
            return self.local.list_versions(name);
        }
        if local_only {
            return Ok(Vec::new());
        }
        self.bundled.list_versions(name)
    }

    /// Union of both repositories' set names.
    ///
    /// # Errors
    ///
    /// Returns an error if either repository root exists but cannot be read.
    pub fn list_command_sets(&self) -> Result<BTreeSet<String>, RepoError> {
        let mut names = self.bundled.list_command_sets()?;
        names.extend(self.local.list_command_sets()?);
        Ok(names)
    }
}
