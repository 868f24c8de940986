//! In-process sub-requests.
//!
//! A handler (or a test) can call back into the application's own handler
//! tree without a transport: [`Requester`] builds a [`SubRequest`], runs it
//! against an in-memory [`SubResponse`] and decodes whatever was written.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::action::Action;
use crate::app::App;
use crate::error::{Error, ErrorBody};
use crate::path::{Flags, Path, Target};
use crate::request::{Inbound, Input};
use crate::response::{Outbound, Recorded};

const SUB_BASE: &str = "http://app.sub/";

#[derive(Debug, Clone)]
enum Body {
    Raw(Vec<u8>),
    Data(Value),
}

/// A request constructed in memory.
#[derive(Debug, Clone)]
pub struct SubRequest {
    action: Action,
    path: Path,
    flags: Flags,
    body: Body,
}

impl SubRequest {
    pub fn new(action: Action, path: Path) -> Self {
        Self {
            action,
            path,
            flags: Flags::new(),
            body: Body::Raw(Vec::new()),
        }
    }

    pub fn from_target(action: Action, target: Target) -> Self {
        Self {
            flags: target.flags,
            ..Self::new(action, target.path)
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Raw JSON input, decoded on `bind`.
    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.body = Body::Raw(input.into());
        self
    }

    /// Already-structured input; takes precedence over raw input.
    pub fn with_data(mut self, data: Value) -> Self {
        self.body = Body::Data(data);
        self
    }
}

impl Inbound for SubRequest {
    fn action(&self) -> Action {
        self.action
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn flags(&self) -> &Flags {
        &self.flags
    }

    fn set_flag(&mut self, key: &str, value: &str) {
        self.flags.set(key, value);
    }

    fn input(&self) -> Input<'_> {
        match &self.body {
            Body::Raw(bytes) => Input::Bytes(bytes),
            Body::Data(value) => Input::Value(value),
        }
    }
}

/// A response that only records what was written.
#[derive(Debug, Clone, Default)]
pub struct SubResponse {
    pub(crate) recorded: Recorded,
}

impl SubResponse {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Outbound for SubResponse {
    fn recorded(&self) -> &Recorded {
        &self.recorded
    }

    fn recorded_mut(&mut self) -> &mut Recorded {
        &mut self.recorded
    }
}

/// Builder for a sub-request against an [`App`].
///
/// ```rust,ignore
/// let user: User = app.call().read("user/42").bind()?;
/// ```
#[derive(Debug)]
pub struct Requester {
    app: Arc<App>,
    action: Action,
    target: Result<Target, Error>,
    flags: Option<Flags>,
    data: Option<Result<Value, Error>>,
}

impl Requester {
    pub(crate) fn new(app: Arc<App>) -> Self {
        Self {
            app,
            action: Action::Read,
            target: Ok(Target {
                path: Path::parse(""),
                flags: Flags::new(),
            }),
            flags: None,
            data: None,
        }
    }

    pub fn create(self, command: &str) -> Self {
        self.command(Action::Create, command)
    }

    pub fn read(self, command: &str) -> Self {
        self.command(Action::Read, command)
    }

    pub fn update(self, command: &str) -> Self {
        self.command(Action::Update, command)
    }

    pub fn delete(self, command: &str) -> Self {
        self.command(Action::Delete, command)
    }

    /// Replace the flags parsed from the command's query string.
    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn input<T: Serialize>(mut self, input: &T) -> Self {
        self.data = Some(serde_json::to_value(input).map_err(Error::from));
        self
    }

    /// Run the sub-request and return the raw response.
    pub fn send(self) -> Result<SubResponse, Error> {
        let target = self.target?;
        let mut request = SubRequest::from_target(self.action, target);
        if let Some(flags) = self.flags {
            request = request.with_flags(flags);
        }
        if let Some(data) = self.data {
            request = request.with_data(data?);
        }
        let response = self.app.dispatch(request.into(), SubResponse::new().into())?;
        Ok(SubResponse {
            recorded: response.into_recorded(),
        })
    }

    /// Run the sub-request and decode its output into `T`.
    ///
    /// An error the handler chain rendered into the response comes back as
    /// the matching [`Error`]. A response without output decodes from
    /// `null`, so `bind::<()>()` and `bind::<Option<T>>()` accept it.
    pub fn bind<T: DeserializeOwned>(self) -> Result<T, Error> {
        let response = self.send()?;
        let status = response.status().unwrap_or(200);
        let output = response.recorded.into_output();
        if status >= 400 {
            let body = output
                .and_then(|v| serde_json::from_value::<ErrorBody>(v).ok())
                .unwrap_or_else(|| ErrorBody {
                    code: None,
                    message: "internal server error".to_string(),
                });
            return Err(Error::from_status(status, body).unwrap_or_else(|| {
                Error::internal("internal server error", format!("status {status}"))
            }));
        }
        // A committed response without a body (204) decodes as `null`.
        Ok(serde_json::from_value(output.unwrap_or(Value::Null))?)
    }

    fn command(mut self, action: Action, command: &str) -> Self {
        self.action = action;
        self.target = Target::parse(&format!("{SUB_BASE}{}", command.trim_start_matches('/')))
            .map_err(Error::from);
        self
    }
}
