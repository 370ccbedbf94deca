//! Human-readable rendering of a command set before it runs

use std::collections::HashMap;
use std::io::{self, Write};

use crate::args::{preview_values, prompted_names, substitute};
use crate::commands::set::CommandSet;
use crate::filter::Step;
use crate::run::style::Palette;

/// Set name, description, version and platform.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn write_header(
    out: &mut dyn Write,
    palette: Palette,
    set: &CommandSet,
    platform: &str,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{} {}", palette.bold("Command Set:"), set.name)?;
    writeln!(out, "{} {}", palette.bold("Description:"), set.description)?;
    writeln!(out, "{} {}", palette.bold("Version:"), set.version)?;
    writeln!(out, "{} {}", palette.bold("Platform:"), platform)
}

/// One numbered step with the text it would run. Returns `false` if the step has no command for
/// `platform`.
///
/// Argument placeholders are filled from `provided` and defaults only; anything else is shown
/// as its `{{name}}` placeholder.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn write_step(
    out: &mut dyn Write,
    palette: Palette,
    step: &Step<'_>,
    platform: &str,
    provided: &HashMap<String, String>,
) -> io::Result<bool> {
    let cmd = step.command;
    writeln!(out, "  {}. {}", step.number, cmd.description)?;
    let text = cmd.resolve_text(platform);
    let supported = !text.is_empty();
    if supported {
        let shown = substitute(text, &preview_values(cmd, provided));
        writeln!(out, "     {} {shown}", palette.dim("$"))?;
        let prompts = prompted_names(cmd, provided);
        if !prompts.is_empty() {
            writeln!(out, "     Will prompt for: {}", prompts.join(", "))?;
        }
    } else {
        writeln!(
            out,
            "     {}",
            palette.yellow(&format!("No command available for platform '{platform}'"))
        )?;
        let available = cmd.platform_names();
        if !available.is_empty() {
            writeln!(out, "     Available platforms: {}", available.join(", "))?;
        }
    }
    if cmd.skip_on_error {
        writeln!(out, "     {}", palette.dim("(skip_on_error: true)"))?;
    }
    writeln!(out)?;
    Ok(supported)
}

/// Advice printed when at least one step cannot run on `platform`.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn write_unsupported_warning(
    out: &mut dyn Write,
    palette: Palette,
    platform: &str,
) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        palette.yellow(&format!(
            "Warning: Some commands are not available for platform '{platform}'"
        ))
    )?;
    writeln!(
        out,
        "   Consider changing your platform with: shelldock config set <platform>"
    )?;
    writeln!(out, "   Unsupported steps are skipped during execution")?;
    writeln!(out)
}
