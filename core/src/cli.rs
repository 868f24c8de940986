//! Command-line request and response variants.

use std::io::{self, Write};

use crate::action::Action;
use crate::path::{Flags, Path, Target};
use crate::request::{Inbound, Input};
use crate::response::{Outbound, Recorded};

/// One parsed command line: action, pseudo-URL target and raw JSON input.
#[derive(Debug, Clone)]
pub struct CliRequest {
    action: Action,
    target: Target,
    input: String,
}

impl CliRequest {
    pub fn new(action: Action, target: Target, input: impl Into<String>) -> Self {
        Self {
            action,
            target,
            input: input.into(),
        }
    }

    pub fn raw_input(&self) -> &str {
        &self.input
    }
}

impl Inbound for CliRequest {
    fn action(&self) -> Action {
        self.action
    }

    fn path(&self) -> &Path {
        &self.target.path
    }

    fn flags(&self) -> &Flags {
        &self.target.flags
    }

    fn set_flag(&mut self, key: &str, value: &str) {
        self.target.flags.set(key, value);
    }

    fn input(&self) -> Input<'_> {
        Input::Bytes(self.input.as_bytes())
    }
}

/// Response printed to the terminal once the command has resolved.
#[derive(Debug, Clone, Default)]
pub struct CliResponse {
    pub(crate) recorded: Recorded,
}

impl CliResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print a `status: <code>` line followed by the JSON body, if any.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let status = self.recorded.status().unwrap_or(200);
        writeln!(out, "status: {status}")?;
        if let Some(output) = self.recorded.output() {
            serde_json::to_writer(&mut *out, output)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

impl From<Recorded> for CliResponse {
    fn from(recorded: Recorded) -> Self {
        Self { recorded }
    }
}

impl Outbound for CliResponse {
    fn recorded(&self) -> &Recorded {
        &self.recorded
    }

    fn recorded_mut(&mut self) -> &mut Recorded {
        &mut self.recorded
    }
}
