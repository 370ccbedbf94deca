use std::io::Write;
use std::process::ExitCode;

use clap::Args;

use shelldock::config_file::UserConfig;
use shelldock::filter::filter;
use shelldock::platform::resolve_platform;
use shelldock::run::preview::{write_header, write_step, write_unsupported_warning};
use shelldock::run::style::Palette;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Command set to show, optionally as name@version
    name: String,

    /// Only check the local repository (skip the bundled repository)
    #[arg(short, long)]
    local: bool,

    /// Version or tag to show (default: latest)
    #[arg(long, value_name = "VERSION")]
    ver: Option<String>,

    /// Print the resolved command set as JSON
    #[arg(long)]
    json: bool,
}

/// Preview every step of a command set without executing anything.
///
/// # Errors
///
/// Returns an error if the set cannot be resolved or output fails.
pub fn run(args: &ShowArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (selector, set) = crate::load_set(&args.name, args.local, args.ver.as_deref())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(ExitCode::SUCCESS);
    }

    let platform = resolve_platform(&UserConfig::discover()?);
    let palette = Palette::for_stdout();
    let mut out = std::io::stdout().lock();

    write_header(&mut out, palette, &set, &platform)?;
    writeln!(out, "{}", palette.bold("Commands:"))?;
    writeln!(out)?;

    let mut any_unsupported = false;
    for step in filter(&set.commands, "", "")? {
        any_unsupported |= !write_step(&mut out, palette, &step, &platform, &Default::default())?;
    }
    if any_unsupported {
        write_unsupported_warning(&mut out, palette, &platform)?;
    }

    writeln!(
        out,
        "To execute these commands, run: shelldock {}",
        selector.name
    )?;
    Ok(ExitCode::SUCCESS)
}
