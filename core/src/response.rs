//! Transport-independent response handling.
//!
//! # Design
//! Every response variant records the same things: a status, headers, a
//! committed flag and the JSON value that was written. That state lives in
//! [`Recorded`]; the [`Outbound`] trait supplies the behaviour on top of it
//! so the commit-once rule is written in exactly one place. Variants only
//! differ in how a committed response leaves the process (see
//! [`crate::http`], [`crate::cli`] and [`crate::sub`]).

use serde::Serialize;
use serde_json::Value;

use crate::cli::CliResponse;
use crate::error::Error;
use crate::http::HttpResponse;
use crate::sub::SubResponse;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// State shared by all response variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorded {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    committed: bool,
    output: Option<Value>,
}

impl Recorded {
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn committed(&self) -> bool {
        self.committed
    }

    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    pub fn into_output(self) -> Option<Value> {
        self.output
    }
}

/// Behaviour common to every response variant.
///
/// Once a response is committed, further writes, status changes and header
/// changes are ignored.
pub trait Outbound {
    fn recorded(&self) -> &Recorded;

    fn recorded_mut(&mut self) -> &mut Recorded;

    fn status(&self) -> Option<u16> {
        self.recorded().status
    }

    fn set_status(&mut self, status: u16) {
        let state = self.recorded_mut();
        if !state.committed {
            state.status = Some(status);
        }
    }

    /// Set `name`, replacing an earlier value for the same header.
    fn set_header(&mut self, name: &str, value: &str) {
        let state = self.recorded_mut();
        if state.committed {
            return;
        }
        state.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        state.headers.push((name.to_string(), value.to_string()));
    }

    fn committed(&self) -> bool {
        self.recorded().committed
    }

    fn output(&self) -> Option<&Value> {
        self.recorded().output.as_ref()
    }

    /// Commit `body` as the response output. Status defaults to 200.
    fn write<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<(), Error> {
        if self.committed() {
            return Ok(());
        }
        let value = serde_json::to_value(body)?;
        let state = self.recorded_mut();
        let status = *state.status.get_or_insert(200);
        tracing::info!(status, body = %value, "<---");
        state.output = Some(value);
        state.committed = true;
        Ok(())
    }

    /// Commit with 204 and no body.
    fn no_content(&mut self) {
        if self.committed() {
            return;
        }
        let state = self.recorded_mut();
        state.status = Some(204);
        state.committed = true;
        tracing::info!(status = 204, "<---");
    }

    fn enable_cors(&mut self, origin: &str, methods: &str, headers: &str) {
        self.set_header("Access-Control-Allow-Origin", origin);
        self.set_header("Access-Control-Allow-Methods", methods);
        self.set_header("Access-Control-Allow-Headers", headers);
    }
}

/// The response of one call, whichever transport it came in on.
#[derive(Debug)]
pub enum Response {
    Http(HttpResponse),
    Cli(CliResponse),
    Sub(SubResponse),
}

impl Outbound for Response {
    fn recorded(&self) -> &Recorded {
        match self {
            Response::Http(r) => r.recorded(),
            Response::Cli(r) => r.recorded(),
            Response::Sub(r) => r.recorded(),
        }
    }

    fn recorded_mut(&mut self) -> &mut Recorded {
        match self {
            Response::Http(r) => r.recorded_mut(),
            Response::Cli(r) => r.recorded_mut(),
            Response::Sub(r) => r.recorded_mut(),
        }
    }
}

impl Response {
    pub fn into_recorded(self) -> Recorded {
        match self {
            Response::Http(r) => r.recorded,
            Response::Cli(r) => r.recorded,
            Response::Sub(r) => r.recorded,
        }
    }
}

impl From<HttpResponse> for Response {
    fn from(r: HttpResponse) -> Self {
        Response::Http(r)
    }
}

impl From<CliResponse> for Response {
    fn from(r: CliResponse) -> Self {
        Response::Cli(r)
    }
}

impl From<SubResponse> for Response {
    fn from(r: SubResponse) -> Self {
        Response::Sub(r)
    }
}
