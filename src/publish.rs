//! Publishing hosted spaces.
//!
//! A hosted space with a `semp:publishMethod` is uploaded by running the
//! method's command:
//!
//! ```turtle
//! <http://example.org/> a semp:HostedSpace ;
//!     semp:publishMethod <#rsync> .
//! <#rsync> a semp:PublishMethod ;
//!     semp:command "rsync" ;
//!     semp:invocation ( "-a" "{1}" "{user}@example.org:www/" ) ;
//!     semp:askFor "user" ;
//!     semp:askForHidden "password" .
//! ```
//!
//! Placeholders in the command and its arguments:
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{0}` | empty string |
//! | `{1}` | local build path of the space |
//! | `{2}` | base URI of the space |
//! | `{name}` | variable `name`, prompted for unless already known |
//! | `{{`, `}}` | literal braces |
//!
//! Variables are asked for once per run and reused for later spaces.

use crate::exec::{Cmd, ExecError};
use crate::graph::{Term, TripleSource};
use crate::space::SpaceTable;
use crate::vocab;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish method {method} has no semp:command")]
    MissingCommand { method: String },
    #[error("invalid template {template:?}: {message}")]
    Template { template: String, message: String },
    #[error("cannot read variable {variable}: {source}")]
    Prompt {
        variable: String,
        source: io::Error,
    },
    #[error("`{program}` exited with {}", describe_code(.code))]
    CommandFailed { program: String, code: Option<i32> },
    #[error(transparent)]
    Exec(#[from] ExecError),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Asks the operator for variable values.
pub trait Prompter {
    fn ask(&mut self, name: &str, hidden: bool) -> io::Result<String>;
}

/// Runs publish commands.
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[String]) -> Result<(), PublishError>;
}

/// Prompts on stderr; hidden values are read with echo disabled.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, name: &str, hidden: bool) -> io::Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{name}: ")?;
        stderr.flush()?;
        if hidden {
            let value = read_hidden();
            writeln!(stderr)?;
            value
        } else {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

fn read_hidden() -> io::Result<String> {
    use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

    let _raw = RawMode::enable()?;
    let mut value = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read()?
        else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }
        match code {
            KeyCode::Enter => return Ok(value),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
            }
            KeyCode::Char(c) => value.push(c),
            KeyCode::Backspace => {
                value.pop();
            }
            _ => {}
        }
    }
}

/// Runs commands attached to the terminal.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, program: &str, args: &[String]) -> Result<(), PublishError> {
        let status = Cmd::new(program).args(args).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(PublishError::CommandFailed {
                program: program.to_string(),
                code: status.code(),
            })
        }
    }
}

/// A `semp:PublishMethod` description.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishMethod {
    pub id: Term,
    pub command: String,
    pub invocation: Vec<String>,
    pub ask_for: Vec<String>,
    pub ask_for_hidden: Vec<String>,
}

impl PublishMethod {
    pub fn read(conf: &dyn TripleSource, id: &Term) -> Result<Self, PublishError> {
        let command = conf
            .value(id, vocab::COMMAND)
            .map(|t| t.value().to_string())
            .ok_or_else(|| PublishError::MissingCommand {
                method: id.value().to_string(),
            })?;
        let invocation = match conf.value(id, vocab::INVOCATION) {
            Some(Term::Literal(lit)) => vec![lit.lexical],
            Some(head) => conf.list(&head).iter().map(|t| t.value().to_string()).collect(),
            None => Vec::new(),
        };
        Ok(Self {
            id: id.clone(),
            command,
            invocation,
            ask_for: names(conf, id, vocab::ASK_FOR),
            ask_for_hidden: names(conf, id, vocab::ASK_FOR_HIDDEN),
        })
    }

    /// Variables to ask for, visible ones first, each with its hidden flag.
    pub fn variables(&self) -> impl Iterator<Item = (&str, bool)> {
        self.ask_for
            .iter()
            .map(|n| (n.as_str(), false))
            .chain(self.ask_for_hidden.iter().map(|n| (n.as_str(), true)))
    }
}

/// Variable names given as literals or as a collection of literals.
fn names(conf: &dyn TripleSource, id: &Term, predicate: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut listed = Vec::new();
    for object in conf.objects(id, predicate) {
        match object {
            Term::Literal(lit) => literals.push(lit.lexical),
            head => listed.extend(conf.list(&head).iter().map(|t| t.value().to_string())),
        }
    }
    literals.sort();
    literals.extend(listed);
    literals
}

/// Expand `{n}` and `{name}` placeholders in `template`.
pub fn format_template(
    template: &str,
    positional: &[&str],
    variables: &HashMap<String, String>,
) -> Result<String, PublishError> {
    let error = |message: String| PublishError::Template {
        template: template.to_string(),
        message,
    };
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(error("single '}' outside a placeholder".into())),
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => key.push(c),
                        None => return Err(error("unclosed placeholder".into())),
                    }
                }
                let value = match key.parse::<usize>() {
                    Ok(index) => positional
                        .get(index)
                        .copied()
                        .ok_or_else(|| error(format!("no positional value {{{index}}}")))?,
                    Err(_) => variables
                        .get(&key)
                        .map(String::as_str)
                        .ok_or_else(|| error(format!("unknown variable {{{key}}}")))?,
                };
                out.push_str(value);
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Result of publishing one hosted space.
#[derive(Debug)]
pub struct PublishOutcome {
    pub space: String,
    pub result: Result<(), PublishError>,
}

/// Publish every hosted space that declares a publish method, in base URI
/// order.
///
/// `variables` holds already known values; prompted values are added to it.
/// A failing space is recorded and the next one is attempted, except when
/// prompting itself fails, which ends the run.
pub fn publish(
    conf: &dyn TripleSource,
    spaces: &SpaceTable,
    prompter: &mut dyn Prompter,
    runner: &mut dyn CommandRunner,
    variables: &mut HashMap<String, String>,
) -> Vec<PublishOutcome> {
    let mut targets: Vec<_> = spaces
        .spaces()
        .iter()
        .filter_map(|s| s.publish_method.as_ref().map(|m| (s, m)))
        .collect();
    targets.sort_by(|a, b| a.0.base_uri.cmp(&b.0.base_uri));

    let mut outcomes = Vec::new();
    for (space, method) in targets {
        let result = PublishMethod::read(conf, method).and_then(|method| {
            for (name, hidden) in method.variables() {
                if !variables.contains_key(name) {
                    let value = prompter
                        .ask(name, hidden)
                        .map_err(|source| PublishError::Prompt {
                            variable: name.to_string(),
                            source,
                        })?;
                    variables.insert(name.to_string(), value);
                }
            }
            let local = spaces.local_path(space);
            let positional = ["", local.as_str(), space.base_uri.as_str()];
            let program = format_template(&method.command, &positional, variables)?;
            let args = method
                .invocation
                .iter()
                .map(|arg| format_template(arg, &positional, variables))
                .collect::<Result<Vec<_>, _>>()?;
            runner.run(&program, &args)
        });
        let stop = matches!(result, Err(PublishError::Prompt { .. }));
        outcomes.push(PublishOutcome {
            space: space.base_uri.clone(),
            result,
        });
        if stop {
            break;
        }
    }
    outcomes
}
