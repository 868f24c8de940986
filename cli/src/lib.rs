//! Line-oriented transport for a [`wrap_core::App`].
//!
//! Each input line is one command:
//!
//! ```text
//! <path> <json>            read
//! <ACTION> <path> <json>   CREATE, READ, UPDATE or DELETE
//! exit
//! ```
//!
//! The path may carry a query string; its pairs become the request flags.

pub mod config;
pub mod demo;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use thiserror::Error;
use wrap_core::{Action, App, CliRequest, CliResponse, InvalidAction, Target};

pub const PROMPT: &str = "--> ";

const CLI_BASE: &str = "http://app.cli/";

#[derive(Debug, Clone)]
pub enum Command {
    Exit,
    Call {
        action: Action,
        target: Target,
        input: String,
    },
}

/// Why a line was rejected before reaching any handler.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("could not understand query")]
    Unrecognized,
    #[error("invalid action")]
    InvalidAction(#[from] InvalidAction),
    #[error("{0}")]
    Url(#[from] url::ParseError),
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().eq_ignore_ascii_case("exit") {
        return Ok(Command::Exit);
    }
    let parts: Vec<&str> = line.splitn(3, ' ').collect();
    let (action, path, input) = match parts.as_slice() {
        [path, input] => (Action::Read, *path, *input),
        [action, path, input] => (action.parse::<Action>()?, *path, *input),
        _ => return Err(CommandError::Unrecognized),
    };
    let target = Target::parse(&format!(
        "{CLI_BASE}{}",
        path.trim().trim_start_matches('/')
    ))?;
    Ok(Command::Call {
        action,
        target,
        input: input.to_string(),
    })
}

/// Read-eval-print loop over an [`App`].
#[derive(Debug, Clone)]
pub struct Listener {
    app: Arc<App>,
}

impl Listener {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    /// Usage hint printed once before the first prompt.
    pub fn banner<W: Write>(output: &mut W) -> io::Result<()> {
        writeln!(output, "Please provide commands in the following format:")?;
        writeln!(
            output,
            "{PROMPT}CREATE command/path?flag1=foo&flag2=bar {{\"input\":\"data\"}}"
        )
    }

    /// Prompt, read, dispatch, print; until `exit` or end of input.
    ///
    /// Rejected lines are reported and the loop carries on. Only I/O
    /// failures on `input` or `output` end it early.
    pub fn listen<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> io::Result<()> {
        let mut line = String::new();
        loop {
            write!(output, "{PROMPT}")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }

            match parse_command(&line) {
                Ok(Command::Exit) => return Ok(()),
                Ok(Command::Call {
                    action,
                    target,
                    input,
                }) => {
                    let response = self.app.handle(
                        CliRequest::new(action, target, input).into(),
                        CliResponse::new().into(),
                    );
                    CliResponse::from(response.into_recorded()).render(&mut output)?;
                }
                Err(err) => {
                    tracing::warn!(%err, line = line.trim_end(), "rejected command");
                    writeln!(output, "{err}")?;
                }
            }
        }
    }
}
