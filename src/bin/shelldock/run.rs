use std::process::ExitCode;

use clap::Args;

use shelldock::Selector;
use shelldock::args::{StdinSource, parse_provided_args};
use shelldock::config_file::UserConfig;
use shelldock::manager::Manager;
use shelldock::run::style::Palette;
use shelldock::run::{RunOptions, RunOutcome, Runner};

#[derive(Args, Debug, Default)]
pub struct RunFlags {
    /// Only check the local repository (skip the bundled repository)
    #[arg(short, long)]
    local: bool,

    /// Version or tag to run (default: latest); name@version also works
    #[arg(long, value_name = "VERSION")]
    ver: Option<String>,

    /// Skip steps, e.g. 1,2,3 or 1-3
    #[arg(long, value_name = "STEPS", default_value = "")]
    skip: String,

    /// Run only these steps, e.g. 1,3,5 or 1-3
    #[arg(long, value_name = "STEPS", default_value = "")]
    only: String,

    /// Execute without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Argument values as key=value pairs, e.g. name=John,email=john@example.com
    #[arg(long, value_name = "PAIRS")]
    args: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Command set to run, optionally as name@version
    pub name: String,

    #[command(flatten)]
    pub flags: RunFlags,
}

/// Run a command set with confirmation and per-step prompting.
///
/// # Errors
///
/// Returns an error if the set cannot be resolved or a step aborts the run.
pub fn run(name: &str, flags: &RunFlags) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let manager = Manager::discover()?;
    let config = UserConfig::discover()?;
    let selector = Selector::parse(name, flags.ver.as_deref());
    let options = RunOptions {
        local_only: flags.local,
        skip: flags.skip.clone(),
        only: flags.only.clone(),
        assume_yes: flags.yes,
        provided_args: flags
            .args
            .as_deref()
            .map(parse_provided_args)
            .unwrap_or_default(),
    };

    let mut input = StdinSource;
    let mut stdout = std::io::stdout();
    let mut runner =
        Runner::resolve(&config, &mut input, &mut stdout).with_palette(Palette::for_stdout());

    match runner.run_selector(&manager, &selector, &options)? {
        RunOutcome::Completed(summary) => {
            if summary.failed.is_empty() && summary.unsupported.is_empty() {
                println!("All commands executed successfully!");
            }
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Cancelled(_) => Ok(ExitCode::SUCCESS),
    }
}
