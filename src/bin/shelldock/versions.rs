use std::process::ExitCode;

use clap::Args;

use shelldock::manager::Manager;

#[derive(Args, Debug)]
pub struct VersionsArgs {
    /// Command set name
    name: String,

    /// Only check the local repository (skip the bundled repository)
    #[arg(short, long)]
    local: bool,
}

/// List every version and tag of a command set.
///
/// # Errors
///
/// Returns an error if the set's file cannot be read.
pub fn run(args: &VersionsArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let manager = Manager::discover()?;
    let versions = manager.list_versions(&args.name, args.local)?;

    if versions.is_empty() {
        println!("No versions found for command set '{}'", args.name);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Available versions for '{}':", args.name);
    println!();
    for version in versions {
        if version.ends_with("(latest)") {
            println!("  * {version} (default)");
        } else {
            println!("  - {version}");
        }
    }
    println!();
    println!(
        "Use 'shelldock {0}@<version>' or 'shelldock {0} --ver <version>' to run a specific version or tag",
        args.name
    );
    Ok(ExitCode::SUCCESS)
}
