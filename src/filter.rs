//! `--skip` / `--only` step selection
//!
//! Steps are addressed by their 1-indexed position in the command set. Filtering keeps the
//! original numbers so output can refer to "step 4" even after steps 1-3 were dropped.

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::commands::command::Command;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid --{flag} format: {reason}")]
    InvalidExpression { flag: &'static str, reason: String },
    #[error("cannot use both --skip and --only flags together")]
    Conflict,
}

/// A retained step and its original 1-indexed position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step<'a> {
    pub number: usize,
    pub command: &'a Command,
}

/// Parsed step expression such as `1,3,5-7`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSet {
    ranges: Vec<RangeInclusive<usize>>,
}

impl StepSet {
    /// Parse comma-separated step numbers and inclusive `a-b` ranges.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed token: non-numeric, below 1, or a range whose
    /// start exceeds its end.
    pub fn parse(expr: &str) -> Result<StepSet, String> {
        let mut ranges = Vec::new();
        for token in expr.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let range = match token.split_once('-') {
                Some((start, end)) => {
                    let start = parse_step(start)
                        .map_err(|_| format!("invalid start number in range: {token}"))?;
                    let end = parse_step(end)
                        .map_err(|_| format!("invalid end number in range: {token}"))?;
                    if start > end {
                        return Err(format!("range start ({start}) must be <= end ({end})"));
                    }
                    start..=end
                }
                None => {
                    let step = parse_step(token)?;
                    step..=step
                }
            };
            ranges.push(range);
        }
        Ok(StepSet { ranges })
    }

    #[must_use]
    pub fn contains(&self, step: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&step))
    }
}

fn parse_step(token: &str) -> Result<usize, String> {
    let token = token.trim();
    let step: usize = token
        .parse()
        .map_err(|_| format!("invalid step number: {token}"))?;
    if step < 1 {
        return Err(format!("step numbers must be >= 1, got: {step}"));
    }
    Ok(step)
}

/// Keep the steps selected by `skip` or `only`; with neither set every step is kept.
///
/// The result may be empty; deciding whether that is an error is up to the caller.
///
/// # Errors
///
/// Returns `FilterError::Conflict` if both expressions are set, or
/// `FilterError::InvalidExpression` if either is malformed.
pub fn filter<'a>(
    commands: &'a [Command],
    skip: &str,
    only: &str,
) -> Result<Vec<Step<'a>>, FilterError> {
    let skip = skip.trim();
    let only = only.trim();
    if !skip.is_empty() && !only.is_empty() {
        return Err(FilterError::Conflict);
    }
    let skip_set = StepSet::parse(skip)
        .map_err(|reason| FilterError::InvalidExpression { flag: "skip", reason })?;
    let only_set = StepSet::parse(only)
        .map_err(|reason| FilterError::InvalidExpression { flag: "only", reason })?;

    Ok(commands
        .iter()
        .enumerate()
        .map(|(idx, command)| Step {
            number: idx + 1,
            command,
        })
        .filter(|step| {
            if !only.is_empty() {
                only_set.contains(step.number)
            } else if !skip.is_empty() {
                !skip_set.contains(step.number)
            } else {
                true
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(n: usize) -> Vec<Command> {
        (1..=n)
            .map(|i| Command {
                description: format!("Command {i}"),
                ..Default::default()
            })
            .collect()
    }

    fn numbers(steps: &[Step<'_>]) -> Vec<usize> {
        steps.iter().map(|s| s.number).collect()
    }

    #[test]
    fn test_parse_step_set() {
        let set = StepSet::parse("1, 3,5-7").unwrap();
        for (step, expected) in [(1, true), (2, false), (3, true), (5, true), (7, true), (8, false)] {
            assert_eq!(set.contains(step), expected, "step {step}");
        }
        assert!(StepSet::parse("1-1").unwrap().contains(1));
        assert_eq!(StepSet::parse("").unwrap(), StepSet::default());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for expr in ["3-1", "abc", "0", "0-2", "1-x", "-1", "1,,2-", "1-2-3"] {
            assert!(StepSet::parse(expr).is_err(), "expected error for {expr:?}");
        }
    }

    #[test]
    fn test_skip_keeps_original_numbers() {
        let cmds = commands(5);
        let steps = filter(&cmds, "1,3", "").unwrap();
        assert_eq!(numbers(&steps), vec![2, 4, 5]);
        assert_eq!(steps[0].command.description, "Command 2");
    }

    #[test]
    fn test_skip_single_step() {
        let cmds = commands(4);
        for k in 1..=4 {
            let steps = filter(&cmds, &k.to_string(), "").unwrap();
            let expected: Vec<usize> = (1..=4).filter(|&n| n != k).collect();
            assert_eq!(numbers(&steps), expected);
        }
    }

    #[test]
    fn test_only() {
        let cmds = commands(5);
        let steps = filter(&cmds, "", "2-3,5").unwrap();
        assert_eq!(numbers(&steps), vec![2, 3, 5]);
    }

    #[test]
    fn test_only_full_range_is_identity() {
        let cmds = commands(6);
        let steps = filter(&cmds, "", "1-6").unwrap();
        assert_eq!(numbers(&steps), (1..=6).collect::<Vec<_>>());
        assert!(steps.iter().zip(&cmds).all(|(s, c)| std::ptr::eq(s.command, c)));
    }

    #[test]
    fn test_no_filter_keeps_everything() {
        let cmds = commands(3);
        assert_eq!(numbers(&filter(&cmds, "", "").unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn test_out_of_range_only_is_empty() {
        let cmds = commands(3);
        assert!(filter(&cmds, "", "9").unwrap().is_empty());
    }

    #[test]
    fn test_both_flags_conflict() {
        let cmds = commands(3);
        assert_eq!(filter(&cmds, "1", "2"), Err(FilterError::Conflict));
    }

    #[test]
    fn test_invalid_expression_names_flag() {
        let cmds = commands(3);
        match filter(&cmds, "", "x") {
            Err(FilterError::InvalidExpression { flag, .. }) => assert_eq!(flag, "only"),
            other => panic!("Expected InvalidExpression, got: {other:?}"),
        }
    }
}
