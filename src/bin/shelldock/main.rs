mod config;
mod echo;
mod list;
mod run;
mod show;
mod versions;

use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};

use shelldock::Selector;
use shelldock::commands::set::CommandSet;
use shelldock::manager::Manager;

#[derive(Parser, Debug)]
#[command(
    name = "shelldock",
    version,
    about = "Store, preview and run sets of shell commands",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Log file path (in addition to warnings on stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    /// Command set to run, optionally as name@version
    name: Option<String>,

    #[command(flatten)]
    run: run::RunFlags,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a saved command set
    Run(run::RunArgs),
    /// Show the commands of a set without executing them
    Show(show::ShowArgs),
    /// Print the commands of a set one per line, ready to copy or pipe
    Echo(echo::EchoArgs),
    /// List available command sets
    List,
    /// List the versions and tags of a command set
    Versions(versions::VersionsArgs),
    /// View or change the platform setting
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?;
    shelldock::logger::init(log_file);

    match cli.command {
        Some(Commands::Run(ref args)) => run::run(&args.name, &args.flags),
        Some(Commands::Show(ref args)) => show::run(args),
        Some(Commands::Echo(ref args)) => echo::run(args),
        Some(Commands::List) => list::run(),
        Some(Commands::Versions(ref args)) => versions::run(args),
        Some(Commands::Config(ref command)) => config::run(command),
        None => match cli.name {
            Some(ref name) => run::run(name, &cli.run),
            None => {
                Cli::command().print_help()?;
                Ok(ExitCode::SUCCESS)
            }
        },
    }
}

/// Resolve `name` (or `name@version`) through the installed repositories.
///
/// # Errors
///
/// Returns an error if the repositories cannot be located or the set cannot be resolved.
pub(crate) fn load_set(
    name: &str,
    local_only: bool,
    version: Option<&str>,
) -> Result<(Selector, CommandSet), Box<dyn std::error::Error>> {
    let manager = Manager::discover()?;
    let selector = Selector::parse(name, version);
    let set = manager.get_command_set(&selector.name, local_only, &selector.version)?;
    Ok((selector, set))
}
