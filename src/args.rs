//! Argument collection and `{{name}}` placeholder substitution
//!
//! Value resolution is split from terminal I/O: [`resolve_arg`] decides whether a value is
//! already known or has to be asked for, and [`collect_args`] performs the asking through a
//! [`LineSource`].

use std::collections::HashMap;
use std::io::{self, BufRead, IsTerminal, Write};

use log::{debug, warn};
use thiserror::Error;

use crate::commands::command::{ArgumentDef, Command, placeholder};

#[derive(Error, Debug)]
pub enum ArgError {
    #[error(
        "required argument '{name}' not provided and not in a terminal (use --args {name}=<value>)"
    )]
    NotInteractive { name: String },
    #[error("required argument '{name}' is missing")]
    Missing { name: String },
    #[error("failed to write prompt: {0}")]
    Io(#[from] io::Error),
}

/// Line-oriented input used for confirmation and argument prompts
pub trait LineSource {
    /// Whether a user can answer prompts.
    fn is_interactive(&self) -> bool;

    /// Read one line without its terminator; `None` once the input is closed.
    ///
    /// # Errors
    ///
    /// Returns the underlying read error.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// The process's standard input
#[derive(Debug, Default)]
pub struct StdinSource;

impl LineSource for StdinSource {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Parse `key=value` pairs separated by commas, splitting each on its first `=`.
///
/// Keys and values are trimmed; entries without `=` or with an empty key are dropped.
#[must_use]
pub fn parse_provided_args(input: &str) -> HashMap<String, String> {
    input
        .split(',')
        .filter_map(|entry| {
            let (key, value) = entry.trim().split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Replace every `{{name}}` whose name is in `values`; unknown placeholders stay verbatim.
///
/// The text is scanned once, so substituted values are never scanned again.
#[must_use]
pub fn substitute(text: &str, values: &HashMap<String, String>) -> String {
    let tokens: Vec<(String, &str)> = values
        .iter()
        .map(|(name, value)| (placeholder(name), value.as_str()))
        .collect();
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let candidate = &rest[open..];
        match tokens
            .iter()
            .filter(|(token, _)| candidate.starts_with(token.as_str()))
            .max_by_key(|(token, _)| token.len())
        {
            Some((token, value)) => {
                result.push_str(value);
                rest = &candidate[token.len()..];
            }
            None => {
                result.push('{');
                rest = &candidate[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Where an argument's value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSource {
    Value(String),
    /// Ask the user, showing this message.
    Prompt(String),
}

/// Decide an argument's value without touching the terminal.
///
/// Order: an explicit override, then (for arguments without prompt text) the default or an
/// empty optional value, then (without a terminal) the default or an empty optional value,
/// and finally an interactive prompt.
///
/// # Errors
///
/// Returns `ArgError::NotInteractive` for a required argument with no override, no default and
/// no terminal to ask on.
pub fn resolve_arg(
    def: &ArgumentDef,
    provided: &HashMap<String, String>,
    interactive: bool,
) -> Result<ArgSource, ArgError> {
    if let Some(value) = provided.get(&def.name) {
        return Ok(ArgSource::Value(value.clone()));
    }
    if def.prompt.is_empty() {
        if !def.default.is_empty() {
            return Ok(ArgSource::Value(def.default.clone()));
        }
        if !def.required {
            return Ok(ArgSource::Value(String::new()));
        }
    }
    if !interactive {
        if def.required && def.default.is_empty() {
            return Err(ArgError::NotInteractive {
                name: def.name.clone(),
            });
        }
        return Ok(ArgSource::Value(def.default.clone()));
    }
    Ok(ArgSource::Prompt(prompt_message(def)))
}

/// Prompt line for `def`, with a default or optional hint.
#[must_use]
pub fn prompt_message(def: &ArgumentDef) -> String {
    let prompt = if def.prompt.is_empty() {
        format!("Enter {}", def.name)
    } else {
        def.prompt.clone()
    };
    let message = if !def.default.is_empty() {
        format!("{prompt} [default: {}]", def.default)
    } else if def.required {
        prompt
    } else {
        format!("{prompt} (optional)")
    };
    if message.ends_with(':') || message.ends_with('?') {
        format!("{message} ")
    } else {
        format!("{message}: ")
    }
}

/// Turn a prompt answer (`None` if nothing could be read) into a value.
///
/// # Errors
///
/// Returns `ArgError::Missing` if the answer is blank, there is no default and the argument is
/// required.
pub fn accept_answer(def: &ArgumentDef, answer: Option<&str>) -> Result<String, ArgError> {
    let answer = answer.map_or("", str::trim);
    if !answer.is_empty() {
        return Ok(answer.to_string());
    }
    if !def.default.is_empty() {
        return Ok(def.default.clone());
    }
    if def.required {
        return Err(ArgError::Missing {
            name: def.name.clone(),
        });
    }
    Ok(String::new())
}

/// Resolve every argument of `cmd`, prompting on `input` where needed.
///
/// # Errors
///
/// Returns an `ArgError` for the first required argument that ends up without a value, or if
/// the prompt cannot be written.
pub fn collect_args(
    cmd: &Command,
    provided: &HashMap<String, String>,
    input: &mut dyn LineSource,
    out: &mut dyn Write,
) -> Result<HashMap<String, String>, ArgError> {
    let mut values = HashMap::new();
    for def in &cmd.args {
        let value = match resolve_arg(def, provided, input.is_interactive())? {
            ArgSource::Value(value) => value,
            ArgSource::Prompt(message) => {
                write!(out, "{message}")?;
                out.flush()?;
                let answer = input.read_line().unwrap_or_else(|e| {
                    warn!("Error reading input for '{}': {e}", def.name);
                    None
                });
                accept_answer(def, answer.as_deref())?
            }
        };
        if value.is_empty() && def.required {
            return Err(ArgError::Missing {
                name: def.name.clone(),
            });
        }
        debug!("Argument '{}' resolved", def.name);
        values.insert(def.name.clone(), value);
    }
    Ok(values)
}

/// Values known without prompting: overrides, then defaults.
#[must_use]
pub fn preview_values(cmd: &Command, provided: &HashMap<String, String>) -> HashMap<String, String> {
    cmd.args
        .iter()
        .filter_map(|def| {
            provided
                .get(&def.name)
                .or((!def.default.is_empty()).then_some(&def.default))
                .map(|value| (def.name.clone(), value.clone()))
        })
        .collect()
}

/// Arguments of `cmd` that will be asked for interactively.
#[must_use]
pub fn prompted_names<'a>(cmd: &'a Command, provided: &HashMap<String, String>) -> Vec<&'a str> {
    cmd.args
        .iter()
        .filter(|def| !def.prompt.is_empty() && !provided.contains_key(&def.name))
        .map(|def| def.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct Scripted {
        interactive: bool,
        lines: VecDeque<&'static str>,
    }

    impl LineSource for Scripted {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn read_line(&mut self) -> io::Result<Option<String>> {
            Ok(self.lines.pop_front().map(str::to_string))
        }
    }

    fn arg(name: &str, prompt: &str, default: &str, required: bool) -> ArgumentDef {
        ArgumentDef {
            name: name.to_string(),
            prompt: prompt.to_string(),
            default: default.to_string(),
            required,
        }
    }

    fn provided(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_provided_args() {
        let args = parse_provided_args(" name = John , email=a=b@c.d,novalue,=x,");
        assert_eq!(args.len(), 2);
        assert_eq!(args["name"], "John");
        assert_eq!(args["email"], "a=b@c.d");
        assert!(parse_provided_args("").is_empty());
    }

    #[test]
    fn test_substitute() {
        let values = provided(&[("name", "X"), ("port", "80")]);
        assert_eq!(
            substitute("echo {{name}}:{{port}} {{name}}", &values),
            "echo X:80 X"
        );
    }

    #[test]
    fn test_substitute_leaves_unknown_verbatim() {
        let empty = HashMap::new();
        let text = "run {{missing}} {{ spaced }} {{open";
        assert_eq!(substitute(text, &empty), text);
        assert_eq!(substitute(&substitute(text, &empty), &empty), text);
    }

    #[test]
    fn test_substitute_after_stray_braces() {
        let values = provided(&[("name", "X")]);
        assert_eq!(substitute("echo '{{' {{name}}", &values), "echo '{{' X");
        assert_eq!(substitute("{{{name}}}", &values), "{X}");
        assert_eq!(substitute("{{{{name}}", &values), "{{X");
    }

    #[test]
    fn test_substitute_values_are_not_rescanned() {
        let values = provided(&[("a", "{{b}}"), ("b", "B")]);
        assert_eq!(substitute("{{a}} {{b}}", &values), "{{b}} B");
    }

    #[test]
    fn test_resolve_order() {
        let required = arg("user", "User?", "", true);
        let overrides = provided(&[("user", "bob")]);
        assert_eq!(
            resolve_arg(&required, &overrides, false).unwrap(),
            ArgSource::Value("bob".to_string())
        );

        let silent_default = arg("tag", "", "latest", true);
        assert_eq!(
            resolve_arg(&silent_default, &HashMap::new(), true).unwrap(),
            ArgSource::Value("latest".to_string())
        );

        let silent_optional = arg("extra", "", "", false);
        assert_eq!(
            resolve_arg(&silent_optional, &HashMap::new(), true).unwrap(),
            ArgSource::Value(String::new())
        );

        assert!(matches!(
            resolve_arg(&required, &HashMap::new(), false),
            Err(ArgError::NotInteractive { .. })
        ));

        let prompted_default = arg("host", "Host", "localhost", true);
        assert_eq!(
            resolve_arg(&prompted_default, &HashMap::new(), false).unwrap(),
            ArgSource::Value("localhost".to_string())
        );
        assert_eq!(
            resolve_arg(&prompted_default, &HashMap::new(), true).unwrap(),
            ArgSource::Prompt("Host [default: localhost]: ".to_string())
        );
    }

    #[test]
    fn test_prompt_message_hints() {
        assert_eq!(prompt_message(&arg("u", "User?", "", true)), "User? ");
        assert_eq!(prompt_message(&arg("u", "User", "", false)), "User (optional): ");
        assert_eq!(prompt_message(&arg("u", "", "", true)), "Enter u: ");
    }

    #[test]
    fn test_accept_answer() {
        let def = arg("host", "Host", "localhost", true);
        assert_eq!(accept_answer(&def, Some("  example ")).unwrap(), "example");
        assert_eq!(accept_answer(&def, Some("")).unwrap(), "localhost");
        assert_eq!(accept_answer(&def, None).unwrap(), "localhost");
        let required = arg("user", "User", "", true);
        assert!(matches!(
            accept_answer(&required, Some(" ")),
            Err(ArgError::Missing { .. })
        ));
        let optional = arg("note", "Note", "", false);
        assert_eq!(accept_answer(&optional, None).unwrap(), "");
    }

    #[test]
    fn test_collect_args_prompts_in_order() {
        let cmd = Command {
            command: "ssh {{user}}@{{host}}".to_string(),
            args: vec![arg("user", "User", "", true), arg("host", "Host", "h", false)],
            ..Default::default()
        };
        let mut input = Scripted {
            interactive: true,
            lines: VecDeque::from(["alice", ""]),
        };
        let mut out = Vec::new();
        let values = collect_args(&cmd, &HashMap::new(), &mut input, &mut out).unwrap();
        assert_eq!(values["user"], "alice");
        assert_eq!(values["host"], "h");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "User: Host [default: h]: "
        );
    }

    #[test]
    fn test_collect_args_empty_override_for_required() {
        let cmd = Command {
            args: vec![arg("user", "", "", true)],
            ..Default::default()
        };
        let mut input = Scripted {
            interactive: false,
            lines: VecDeque::new(),
        };
        let err = collect_args(&cmd, &provided(&[("user", "")]), &mut input, &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, ArgError::Missing { .. }));
    }

    #[test]
    fn test_preview_values_and_prompted_names() {
        let cmd = Command {
            args: vec![
                arg("a", "A", "", true),
                arg("b", "B", "dflt", false),
                arg("c", "", "", false),
            ],
            ..Default::default()
        };
        let overrides = provided(&[("a", "given")]);
        let values = preview_values(&cmd, &overrides);
        assert_eq!(values["a"], "given");
        assert_eq!(values["b"], "dflt");
        assert!(!values.contains_key("c"));
        assert_eq!(prompted_names(&cmd, &overrides), vec!["b"]);
    }
}
