use std::process::ExitCode;

use shelldock::manager::Manager;

/// List command sets, grouped by which repository provides them.
///
/// # Errors
///
/// Returns an error if a repository cannot be read.
pub fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let manager = Manager::discover()?;
    let all = manager.list_command_sets()?;
    if all.is_empty() {
        println!("No command sets found.");
        return Ok(ExitCode::SUCCESS);
    }

    let bundled = manager.bundled().list_command_sets()?;
    let local = manager.local().list_command_sets()?;

    let bundled_only: Vec<_> = bundled.difference(&local).collect();
    let both: Vec<_> = bundled.intersection(&local).collect();
    let local_only: Vec<_> = local.difference(&bundled).collect();

    if !bundled_only.is_empty() || !both.is_empty() {
        println!("Repository (bundled with installation):");
        for name in bundled_only {
            println!("  - {name}");
        }
        for name in both {
            println!("  - {name} (also in local)");
        }
        println!();
    }

    if !local_only.is_empty() {
        println!("Local repository ({}):", manager.local().root().display());
        for name in local_only {
            println!("  - {name}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
