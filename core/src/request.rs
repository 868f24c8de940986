//! Transport-independent view of an inbound call.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::action::Action;
use crate::cli::CliRequest;
use crate::error::Error;
use crate::http::HttpRequest;
use crate::path::{Flags, Path};
use crate::sub::SubRequest;

/// Body of a request, as the transport delivered it.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Bytes(&'a [u8]),
    Value(&'a Value),
}

/// Behaviour common to every request variant.
pub trait Inbound {
    fn action(&self) -> Action;

    /// The request path with its cursor at the root.
    fn path(&self) -> &Path;

    fn flags(&self) -> &Flags;

    fn set_flag(&mut self, key: &str, value: &str);

    fn input(&self) -> Input<'_>;

    /// Decode the request body into `T`.
    ///
    /// A body that does not decode is the caller's fault and is reported as
    /// `BadRequest`.
    fn bind<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let decoded = match self.input() {
            Input::Bytes(bytes) => serde_json::from_slice(bytes),
            Input::Value(value) => T::deserialize(value),
        };
        decoded.map_err(|e| {
            Error::bad_request(
                "could not decode request body",
                format!("bind {} {}: {e}", self.action(), self.path().as_str()),
            )
        })
    }
}

/// The request of one call, whichever transport it came in on.
#[derive(Debug)]
pub enum Request {
    Http(HttpRequest),
    Cli(CliRequest),
    Sub(SubRequest),
}

impl Inbound for Request {
    fn action(&self) -> Action {
        match self {
            Request::Http(r) => r.action(),
            Request::Cli(r) => r.action(),
            Request::Sub(r) => r.action(),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Request::Http(r) => r.path(),
            Request::Cli(r) => r.path(),
            Request::Sub(r) => r.path(),
        }
    }

    fn flags(&self) -> &Flags {
        match self {
            Request::Http(r) => r.flags(),
            Request::Cli(r) => r.flags(),
            Request::Sub(r) => r.flags(),
        }
    }

    fn set_flag(&mut self, key: &str, value: &str) {
        match self {
            Request::Http(r) => r.set_flag(key, value),
            Request::Cli(r) => r.set_flag(key, value),
            Request::Sub(r) => r.set_flag(key, value),
        }
    }

    fn input(&self) -> Input<'_> {
        match self {
            Request::Http(r) => r.input(),
            Request::Cli(r) => r.input(),
            Request::Sub(r) => r.input(),
        }
    }
}

impl From<HttpRequest> for Request {
    fn from(r: HttpRequest) -> Self {
        Request::Http(r)
    }
}

impl From<CliRequest> for Request {
    fn from(r: CliRequest) -> Self {
        Request::Cli(r)
    }
}

impl From<SubRequest> for Request {
    fn from(r: SubRequest) -> Self {
        Request::Sub(r)
    }
}
