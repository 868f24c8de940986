//! HTTP request and response variants, as plain data.
//!
//! # Design
//! The core never touches a socket. The HTTP adapter reads method, target,
//! headers and body into an [`HttpRequest`], runs the handler chain, and
//! turns the committed [`HttpResponse`] back into wire form with
//! [`HttpResponse::into_parts`]. All fields use owned types so values can
//! move onto a blocking worker thread without lifetime concerns.

use thiserror::Error;

use crate::action::Action;
use crate::path::{Flags, Path, Target};
use crate::request::{Inbound, Input};
use crate::response::{Outbound, Recorded, APPLICATION_JSON, CONTENT_TYPE};

/// The HTTP method maps to no action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported method: {0}")]
pub struct UnresolvedMethod(pub String);

/// An inbound HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: String,
    action: Action,
    target: Target,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Resolve `method` and build the request. Unknown methods are rejected
    /// here so no handler ever sees them.
    pub fn new(method: &str, target: Target, body: Vec<u8>) -> Result<Self, UnresolvedMethod> {
        let action =
            Action::from_method(method).ok_or_else(|| UnresolvedMethod(method.to_string()))?;
        Ok(Self {
            method: method.to_string(),
            action,
            target,
            headers: Vec::new(),
            body,
        })
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Inbound for HttpRequest {
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
        Input::Bytes(&self.body)
    }
}

/// An outbound HTTP response described as plain data.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub(crate) recorded: Recorded,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status, headers and encoded body ready for the wire.
    ///
    /// An uncommitted response goes out as 200 with an empty body. The
    /// content type is always JSON.
    pub fn into_parts(self) -> (u16, Vec<(String, String)>, Vec<u8>) {
        let status = self.recorded.status().unwrap_or(200);
        let mut headers: Vec<(String, String)> = self
            .recorded
            .headers()
            .iter()
            .filter(|(k, _)| !k.eq_ignore_ascii_case(CONTENT_TYPE))
            .cloned()
            .collect();
        headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
        let body = self
            .recorded
            .into_output()
            .map(|value| value.to_string().into_bytes())
            .unwrap_or_default();
        (status, headers, body)
    }
}

impl From<Recorded> for HttpResponse {
    fn from(recorded: Recorded) -> Self {
        Self { recorded }
    }
}

impl Outbound for HttpResponse {
    fn recorded(&self) -> &Recorded {
        &self.recorded
    }

    fn recorded_mut(&mut self) -> &mut Recorded {
        &mut self.recorded
    }
}
