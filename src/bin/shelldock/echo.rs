use std::process::ExitCode;

use clap::Args;

use shelldock::config_file::UserConfig;
use shelldock::filter::filter;
use shelldock::platform::resolve_platform;

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Command set to print, optionally as name@version
    name: String,

    /// Only check the local repository (skip the bundled repository)
    #[arg(short, long)]
    local: bool,

    /// Version or tag to print (default: latest)
    #[arg(long, value_name = "VERSION")]
    ver: Option<String>,

    /// Skip steps, e.g. 1,2 or 1-3
    #[arg(long, value_name = "STEPS", default_value = "")]
    skip: String,

    /// Print only these steps, e.g. 3,4 or 1-3
    #[arg(long, value_name = "STEPS", default_value = "")]
    only: String,
}

/// Print the resolved command text of each step, one per line.
///
/// Steps without a command for the platform are left out.
///
/// # Errors
///
/// Returns an error if the set cannot be resolved, the step expression is invalid, or nothing
/// is left after filtering.
pub fn run(args: &EchoArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (selector, set) = crate::load_set(&args.name, args.local, args.ver.as_deref())?;
    let platform = resolve_platform(&UserConfig::discover()?);

    let steps = filter(&set.commands, &args.skip, &args.only)?;
    if steps.is_empty() {
        return Err(format!("no commands to echo in '{}' after filtering", selector.name).into());
    }
    for step in steps {
        let text = step.command.resolve_text(&platform);
        if !text.is_empty() {
            println!("{text}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
