//! Command-set execution
//!
//! A run resolves the platform and the command set, filters the steps, previews them, asks for
//! confirmation and then executes each step as `sh -c <text>` with inherited standard streams.
//! Steps run strictly one after another. A failing step aborts the run unless it is marked
//! `skip_on_error`; steps with no command for the platform are skipped.

pub mod preview;
pub mod style;

use std::collections::HashMap;
use std::io::{self, Write};
use std::process::{Command as ProcessCommand, ExitStatus};
use std::time::Instant;

use log::{debug, info, warn};
use thiserror::Error;

use crate::Selector;
use crate::args::{ArgError, ArgSource, LineSource, collect_args, resolve_arg, substitute};
use crate::commands::set::CommandSet;
use crate::filter::{FilterError, Step, filter};
use crate::manager::Manager;
use crate::platform::{PlatformResolver, resolve_platform};
use crate::repository::RepoError;
use crate::run::style::{Palette, format_duration};

/// Errors that stop a run
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("no commands to execute in '{name}' after filtering")]
    NoStepsRemaining { name: String },
    #[error("step {step} ({description}): {source}")]
    MissingArgument {
        step: usize,
        description: String,
        #[source]
        source: ArgError,
    },
    #[error("step {step} ({description}) failed with {status}")]
    StepFailed {
        step: usize,
        description: String,
        status: ExitStatus,
    },
    #[error("step {step} ({description}) could not be started: {source}")]
    Spawn {
        step: usize,
        description: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Per-invocation options for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only consult the local repository.
    pub local_only: bool,
    pub skip: String,
    pub only: String,
    /// Execute without asking for confirmation.
    pub assume_yes: bool,
    pub provided_args: HashMap<String, String>,
}

/// Why a run ended without executing anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Confirmation was required but there is no terminal to ask on.
    NotInteractive,
    /// The user did not answer yes.
    Declined,
}

/// What happened to the steps of a completed run, by original step number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<usize>,
    /// Failed steps whose `skip_on_error` let the run continue.
    pub failed: Vec<usize>,
    /// Steps with no command for the platform.
    pub unsupported: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    Cancelled(CancelReason),
}

/// Executes command sets against one fixed platform
pub struct Runner<'a> {
    platform: String,
    input: &'a mut dyn LineSource,
    out: &'a mut dyn Write,
    palette: Palette,
}

impl<'a> Runner<'a> {
    pub fn new(
        platform: impl Into<String>,
        input: &'a mut dyn LineSource,
        out: &'a mut dyn Write,
    ) -> Self {
        Runner {
            platform: platform.into(),
            input,
            out,
            palette: Palette::default(),
        }
    }

    /// Runner for the platform `resolver` reports, or the detected one if it fails.
    pub fn resolve(
        resolver: &dyn PlatformResolver,
        input: &'a mut dyn LineSource,
        out: &'a mut dyn Write,
    ) -> Self {
        Runner::new(resolve_platform(resolver), input, out)
    }

    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Look up `selector` through `manager` and run it.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Repo` if the set cannot be resolved, or any error from [`Runner::run`].
    pub fn run_selector(
        &mut self,
        manager: &Manager,
        selector: &Selector,
        options: &RunOptions,
    ) -> Result<RunOutcome, RunError> {
        let set = manager.get_command_set(&selector.name, options.local_only, &selector.version)?;
        self.run(&set, options)
    }

    /// Filter, preview, confirm and execute `set`.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Filter` or `RunError::NoStepsRemaining` before anything runs, as does
    /// `RunError::MissingArgument` when there is no terminal. Otherwise `RunError::MissingArgument`,
    /// `RunError::StepFailed` or `RunError::Spawn` name the step that aborted the run; steps before
    /// it are not undone.
    pub fn run(&mut self, set: &CommandSet, options: &RunOptions) -> Result<RunOutcome, RunError> {
        let steps = filter(&set.commands, &options.skip, &options.only)?;
        if steps.is_empty() {
            return Err(RunError::NoStepsRemaining {
                name: set.name.clone(),
            });
        }
        info!(
            "Running '{}' version '{}' ({} of {} steps) on '{}'",
            set.name,
            set.version,
            steps.len(),
            set.commands.len(),
            self.platform
        );

        self.preview(set, &steps, options)?;

        if !options.assume_yes
            && let Some(reason) = self.confirm()?
        {
            debug!("Run cancelled: {reason:?}");
            return Ok(RunOutcome::Cancelled(reason));
        }

        if !self.input.is_interactive() {
            self.check_arguments(&steps, &options.provided_args)?;
        }

        self.execute(&steps, &options.provided_args)
            .map(RunOutcome::Completed)
    }

    /// Without a terminal every argument must be known up front, so a missing one aborts the
    /// run before the first step starts.
    fn check_arguments(
        &self,
        steps: &[Step<'_>],
        provided: &HashMap<String, String>,
    ) -> Result<(), RunError> {
        for step in steps {
            let cmd = step.command;
            if cmd.resolve_text(&self.platform).is_empty() {
                continue;
            }
            for def in &cmd.args {
                let source = match resolve_arg(def, provided, false) {
                    Err(e) => e,
                    Ok(ArgSource::Value(value)) if value.is_empty() && def.required => {
                        ArgError::Missing {
                            name: def.name.clone(),
                        }
                    }
                    Ok(_) => continue,
                };
                return Err(RunError::MissingArgument {
                    step: step.number,
                    description: cmd.description.clone(),
                    source,
                });
            }
        }
        Ok(())
    }

    fn preview(
        &mut self,
        set: &CommandSet,
        steps: &[Step<'_>],
        options: &RunOptions,
    ) -> io::Result<()> {
        let palette = self.palette;
        preview::write_header(self.out, palette, set, &self.platform)?;
        let skip = options.skip.trim();
        let only = options.only.trim();
        if !skip.is_empty() {
            writeln!(self.out, "{} {skip}", palette.bold("Skipping steps:"))?;
        } else if !only.is_empty() {
            writeln!(self.out, "{} {only}", palette.bold("Running only steps:"))?;
        }
        writeln!(self.out, "{}", palette.bold("Commands to execute:"))?;
        writeln!(self.out)?;

        let mut any_unsupported = false;
        for step in steps {
            let supported = preview::write_step(
                self.out,
                palette,
                step,
                &self.platform,
                &options.provided_args,
            )?;
            any_unsupported |= !supported;
        }
        if any_unsupported {
            preview::write_unsupported_warning(self.out, palette, &self.platform)?;
        }
        Ok(())
    }

    /// `None` to proceed, otherwise why not.
    fn confirm(&mut self) -> io::Result<Option<CancelReason>> {
        if !self.input.is_interactive() {
            writeln!(
                self.out,
                "{}",
                self.palette
                    .yellow("Not running in a terminal. Use --yes to execute without prompting.")
            )?;
            return Ok(Some(CancelReason::NotInteractive));
        }
        write!(self.out, "Do you want to execute these commands? (y/N): ")?;
        self.out.flush()?;
        let answer = match self.input.read_line() {
            Ok(answer) => answer.unwrap_or_default(),
            Err(e) => {
                warn!("Error reading confirmation: {e}");
                String::new()
            }
        };
        if is_affirmative(&answer) {
            Ok(None)
        } else {
            writeln!(self.out, "Cancelled.")?;
            Ok(Some(CancelReason::Declined))
        }
    }

    fn execute(
        &mut self,
        steps: &[Step<'_>],
        provided: &HashMap<String, String>,
    ) -> Result<RunSummary, RunError> {
        let palette = self.palette;
        writeln!(self.out)?;
        writeln!(self.out, "{}", palette.bold("Executing commands..."))?;
        writeln!(self.out)?;

        let total = steps.len();
        let total_start = Instant::now();
        let mut summary = RunSummary::default();

        for (i, step) in steps.iter().enumerate() {
            let cmd = step.command;
            let prefix = format!("[{}/{total}]", i + 1);
            writeln!(
                self.out,
                "{} {} {}",
                palette.bold(&prefix),
                cmd.description,
                palette.dim(&format!("(step {})", step.number))
            )?;

            let text = cmd.resolve_text(&self.platform);
            if text.is_empty() {
                warn!(
                    "Step {} has no command for platform '{}'",
                    step.number, self.platform
                );
                writeln!(
                    self.out,
                    "{}",
                    palette.yellow(&format!(
                        "SKIP no command available for platform '{}'",
                        self.platform
                    ))
                )?;
                writeln!(self.out)?;
                summary.unsupported.push(step.number);
                continue;
            }

            let values = collect_args(cmd, provided, self.input, self.out).map_err(|source| {
                RunError::MissingArgument {
                    step: step.number,
                    description: cmd.description.clone(),
                    source,
                }
            })?;
            let text = substitute(text, &values);
            writeln!(self.out, "{} {text}", palette.dim("$"))?;
            self.out.flush()?;

            let start = Instant::now();
            let status = shell(&text).status().map_err(|source| RunError::Spawn {
                step: step.number,
                description: cmd.description.clone(),
                source,
            })?;
            let elapsed = palette.dim(&format_duration(start.elapsed()));

            if status.success() {
                writeln!(self.out, "{} {elapsed}", palette.green("PASS"))?;
                writeln!(self.out)?;
                summary.succeeded.push(step.number);
            } else if cmd.skip_on_error {
                warn!("Step {} failed with {status}, continuing", step.number);
                writeln!(
                    self.out,
                    "{} {elapsed} {}",
                    palette.yellow("FAIL"),
                    palette.dim("(skip_on_error, continuing)")
                )?;
                writeln!(self.out)?;
                summary.failed.push(step.number);
            } else {
                writeln!(self.out, "{} {elapsed}", palette.red("FAIL"))?;
                return Err(RunError::StepFailed {
                    step: step.number,
                    description: cmd.description.clone(),
                    status,
                });
            }
        }

        self.write_summary(&summary, total, total_start.elapsed())?;
        Ok(summary)
    }

    fn write_summary(
        &mut self,
        summary: &RunSummary,
        total: usize,
        elapsed: std::time::Duration,
    ) -> io::Result<()> {
        let palette = self.palette;
        writeln!(self.out, "{}", summary_line(palette, summary, total, elapsed))
    }
}

fn summary_line(
    palette: Palette,
    summary: &RunSummary,
    total: usize,
    elapsed: std::time::Duration,
) -> String {
    let mut parts = Vec::new();
    if !summary.succeeded.is_empty() {
        parts.push(palette.green(&format!("{} passed", summary.succeeded.len())));
    }
    if !summary.failed.is_empty() {
        parts.push(palette.yellow(&format!("{} failed", summary.failed.len())));
    }
    if !summary.unsupported.is_empty() {
        parts.push(palette.yellow(&format!("{} unsupported", summary.unsupported.len())));
    }
    format!(
        "{} {} {}",
        palette.bold(&format!("{total} steps:")),
        parts.join(&palette.dim(", ")),
        palette.dim(&format!("({})", format_duration(elapsed)))
    )
}

/// `y` or `yes`, ignoring case and surrounding whitespace.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

fn shell(text: &str) -> ProcessCommand {
    let mut command = ProcessCommand::new("sh");
    command.arg("-c").arg(text);
    command
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_is_affirmative() {
        for answer in ["y", "Y", " yes ", "YES\n"] {
            assert!(is_affirmative(answer), "{answer:?}");
        }
        for answer in ["", "n", "yep", "no", "ye s"] {
            assert!(!is_affirmative(answer), "{answer:?}");
        }
    }

    #[test]
    fn test_summary_line() {
        let summary = RunSummary {
            succeeded: vec![1, 2],
            failed: vec![4],
            unsupported: vec![3],
        };
        let line = summary_line(Palette::new(false), &summary, 4, Duration::from_millis(1500));
        insta::assert_snapshot!(line, @"4 steps: 2 passed, 1 failed, 1 unsupported (1.5s)");
    }
}
