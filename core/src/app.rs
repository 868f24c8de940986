//! Application handle shared by every transport.
//!
//! # Design
//! An [`App`] is assembled once with [`AppBuilder`] and then frozen behind
//! an `Arc`: the environment, the key/value store and the default handler
//! are read by every call and never mutated after startup. Transports get
//! the handle passed in; there is no global accessor.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::context::{Ctx, Handler};
use crate::error::{Error, HandlerResult};
use crate::request::{Inbound, Request};
use crate::response::Response;
use crate::sub::Requester;

/// Deployment mode of the application.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

type Store = HashMap<String, Arc<dyn Any + Send + Sync>>;

pub struct App {
    env: Environment,
    store: Store,
    default_handler: Handler,
}

impl App {
    /// An app in development mode whose default handler answers Not Found.
    pub fn new() -> Arc<Self> {
        AppBuilder::new().build()
    }

    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn env(&self) -> Environment {
        self.env
    }

    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }

    pub fn is_testing(&self) -> bool {
        self.env == Environment::Testing
    }

    pub fn is_production(&self) -> bool {
        self.env == Environment::Production
    }

    /// Typed lookup in the store. `None` if absent or of another type.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.store.get(key)?.downcast_ref()
    }

    pub fn default_handler(&self) -> &Handler {
        &self.default_handler
    }

    /// Run one call through the default handler and render any error it
    /// returns into the response.
    pub fn handle(self: &Arc<Self>, request: Request, response: Response) -> Response {
        let (mut ctx, result) = self.run(request, response);
        if let Err(err) = result {
            ctx.error(&err);
        }
        ctx.into_response()
    }

    /// Like [`App::handle`], but hands a top-level error back instead of
    /// rendering it.
    pub(crate) fn dispatch(
        self: &Arc<Self>,
        request: Request,
        response: Response,
    ) -> Result<Response, Error> {
        let (ctx, result) = self.run(request, response);
        result?;
        Ok(ctx.into_response())
    }

    /// Start building an in-process sub-request.
    pub fn call(self: &Arc<Self>) -> Requester {
        Requester::new(Arc::clone(self))
    }

    fn run(self: &Arc<Self>, request: Request, response: Response) -> (Ctx, HandlerResult) {
        tracing::info!(
            action = %request.action(),
            path = request.path().as_str(),
            flags = ?request.flags(),
            "--->"
        );
        let mut ctx = Ctx::new(Arc::clone(self), request, response);
        let handler = Arc::clone(&self.default_handler);
        let result = handler(&mut ctx);
        (ctx, result)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.store.keys().collect();
        keys.sort();
        f.debug_struct("App")
            .field("env", &self.env)
            .field("store", &keys)
            .finish_non_exhaustive()
    }
}

/// Startup-time configuration of an [`App`].
pub struct AppBuilder {
    env: Environment,
    store: Store,
    default_handler: Option<Handler>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            env: Environment::default(),
            store: HashMap::new(),
            default_handler: None,
        }
    }

    pub fn env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn store<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.store.insert(key.into(), Arc::new(value));
        self
    }

    /// Top-level handler every call starts in.
    pub fn default_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Ctx) -> HandlerResult + Send + Sync + 'static,
    {
        self.default_handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Arc<App> {
        let default_handler = self
            .default_handler
            .unwrap_or_else(|| Arc::new(|ctx: &mut Ctx| Err(ctx.not_found())));
        Arc::new(App {
            env: self.env,
            store: self.store,
            default_handler,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
