use std::process::ExitCode;

use clap::Subcommand;

use shelldock::config_file::{AUTO_PLATFORM, Config, UserConfig};
use shelldock::platform::{GENERIC_LINUX, detect_linux_distribution, detect_platform, resolve_platform};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the current configuration
    Show,
    /// Set the platform (ubuntu, debian, centos, fedora, arch, darwin, windows, ... or auto)
    Set {
        /// Platform identifier, or "auto" to detect it on every run
        platform: String,
    },
}

/// View or update the platform setting.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written.
pub fn run(command: &ConfigCommand) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let user_config = UserConfig::discover()?;
    match command {
        ConfigCommand::Show => {
            let config = user_config.load()?;
            println!("ShellDock configuration:");
            println!("  Platform setting: {}", config.platform);
            println!("  Active platform: {}", resolve_platform(&user_config));
            println!("  Config file: {}", user_config.path().display());
        }
        ConfigCommand::Set { platform } => {
            if platform == GENERIC_LINUX {
                log::warn!(
                    "'linux' is ambiguous, consider a distribution such as 'ubuntu' or 'fedora' (detected: {})",
                    detect_linux_distribution()
                );
            }
            user_config.save(&Config {
                platform: platform.clone(),
            })?;
            println!("Platform set to: {platform}");
            if platform == AUTO_PLATFORM {
                println!("Auto-detected platform: {}", detect_platform());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
