//! Active platform lookup
//!
//! The platform is an opaque key matched against a step's `platforms` map. It comes from the
//! user's configuration or, for `auto`, from detection: `darwin`, `windows`, or on Linux a
//! normalized distribution identifier.

use std::path::Path;

use log::{debug, warn};

use crate::config_file::ConfigError;

/// Generic token for Linux systems whose distribution is unknown
pub const GENERIC_LINUX: &str = "linux";

/// Supplies the platform identifier steps are resolved against
pub trait PlatformResolver {
    /// The configured platform.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the platform setting cannot be read.
    fn platform(&self) -> Result<String, ConfigError>;
}

/// Ask `resolver` for the platform, falling back to detection if it fails.
pub fn resolve_platform(resolver: &dyn PlatformResolver) -> String {
    match resolver.platform() {
        Ok(platform) => platform,
        Err(e) => {
            let detected = detect_platform();
            warn!("Failed to get platform: {e}, using auto-detected '{detected}'");
            detected
        }
    }
}

/// Platform of the running system.
#[must_use]
pub fn detect_platform() -> String {
    match std::env::consts::OS {
        "linux" => detect_linux_distribution(),
        "macos" => "darwin".to_string(),
        "windows" => "windows".to_string(),
        _ => GENERIC_LINUX.to_string(),
    }
}

/// Normalized distribution of the running Linux system, or `linux` if unknown.
#[must_use]
pub fn detect_linux_distribution() -> String {
    if let Some(distro) = std::fs::read_to_string("/etc/os-release")
        .ok()
        .and_then(|contents| parse_os_release(&contents))
    {
        debug!("Detected distribution '{distro}' from /etc/os-release");
        return distro.to_string();
    }
    for (marker, distro) in [
        ("/etc/debian_version", "debian"),
        ("/etc/redhat-release", "centos"),
        ("/etc/arch-release", "arch"),
        ("/etc/SuSE-release", "opensuse"),
    ] {
        if Path::new(marker).exists() {
            debug!("Detected distribution '{distro}' from {marker}");
            return distro.to_string();
        }
    }
    GENERIC_LINUX.to_string()
}

/// Distribution named by `ID`, or failing that `ID_LIKE`, in os-release contents.
#[must_use]
pub fn parse_os_release(contents: &str) -> Option<&'static str> {
    let mut id = None;
    let mut id_like = None;
    for line in contents.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(value.trim_matches(['"', '\'']));
        } else if let Some(value) = line.strip_prefix("ID_LIKE=") {
            id_like = Some(value.trim_matches(['"', '\'']));
        }
    }
    id.and_then(normalize_distro_id)
        .or_else(|| id_like.and_then(normalize_distro_id))
}

/// Known distribution ids and their normalized names; longer ids precede their prefixes.
const DISTROS: [(&str, &str); 15] = [
    ("ubuntu", "ubuntu"),
    ("debian", "debian"),
    ("centos", "centos"),
    ("rhel", "rhel"),
    ("redhat", "rhel"),
    ("fedora", "fedora"),
    ("archlinux", "arch"),
    ("arch", "arch"),
    ("opensuse-leap", "opensuse"),
    ("opensuse-tumbleweed", "opensuse"),
    ("opensuse", "opensuse"),
    ("suse", "opensuse"),
    ("alpine", "alpine"),
    ("amazon", "amazon"),
    ("oracle", "oracle"),
];

/// Map a distribution id to the fixed vocabulary, exact match first, then substring.
#[must_use]
pub fn normalize_distro_id(id: &str) -> Option<&'static str> {
    let id = id.to_lowercase();
    if id.is_empty() {
        return None;
    }
    DISTROS
        .iter()
        .find(|(key, _)| *key == id)
        .or_else(|| DISTROS.iter().find(|(key, _)| id.contains(key)))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl PlatformResolver for Failing {
        fn platform(&self) -> Result<String, ConfigError> {
            Err(ConfigError::NoHomeDirectory)
        }
    }

    #[test]
    fn test_normalize_distro_id() {
        assert_eq!(normalize_distro_id("Ubuntu"), Some("ubuntu"));
        assert_eq!(normalize_distro_id("redhat"), Some("rhel"));
        assert_eq!(normalize_distro_id("archlinux"), Some("arch"));
        assert_eq!(normalize_distro_id("opensuse-tumbleweed"), Some("opensuse"));
        assert_eq!(normalize_distro_id("sles-suse"), Some("opensuse"));
        assert_eq!(normalize_distro_id("gentoo"), None);
        assert_eq!(normalize_distro_id(""), None);
    }

    #[test]
    fn test_parse_os_release_prefers_id() {
        let contents = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n";
        assert_eq!(parse_os_release(contents), Some("ubuntu"));
    }

    #[test]
    fn test_parse_os_release_falls_back_to_id_like() {
        let contents = "ID=\"rocky\"\nID_LIKE=\"rhel fedora\"\n";
        assert_eq!(parse_os_release(contents), Some("rhel"));
        assert_eq!(parse_os_release("ID=gentoo\n"), None);
    }

    #[test]
    fn test_resolve_platform_falls_back_to_detection() {
        assert_eq!(resolve_platform(&Failing), detect_platform());
    }
}
