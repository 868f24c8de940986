//! Per-call dispatch context.
//!
//! # Design
//! A [`Ctx`] owns the request, the response and the routing cursor of one
//! call. Handlers are plain functions over `&mut Ctx`; they look at
//! [`Ctx::next`] and either answer, return an [`Error`], or hand over to a
//! child with [`Ctx::advance_and_dispatch`]. The cursor is an owned
//! [`Path`] value: a child runs with an advanced copy and the parent's
//! position is put back when the child returns.
//!
//! Every way into a handler goes through the same guard: nothing runs once
//! the response is committed, and a returned error is rendered through the
//! response exactly once.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::action::Action;
use crate::app::App;
use crate::error::{render_error, Error, HandlerResult};
use crate::path::{Flags, Path};
use crate::request::{Inbound, Request};
use crate::response::{Outbound, Response, APPLICATION_JSON, CONTENT_TYPE};
use crate::user::{Permission, User};

/// A shareable handler, as stored by the app and the verb slots.
pub type Handler = Arc<dyn Fn(&mut Ctx) -> HandlerResult + Send + Sync>;

pub struct Ctx {
    app: Arc<App>,
    request: Request,
    response: Response,
    path: Path,
    user: Option<Arc<dyn User>>,
    handler: Option<Handler>,
    else_handler: Option<Handler>,
}

impl Ctx {
    pub fn new(app: Arc<App>, request: Request, response: Response) -> Self {
        let path = request.path().clone();
        Self {
            app,
            request,
            response,
            path,
            user: None,
            handler: None,
            else_handler: None,
        }
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    pub fn action(&self) -> Action {
        self.request.action()
    }

    /// Routing position of the handler currently running.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> &str {
        self.path.current()
    }

    pub fn next(&self) -> &str {
        self.path.next()
    }

    pub fn flags(&self) -> &Flags {
        self.request.flags()
    }

    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.request.bind()
    }

    pub fn committed(&self) -> bool {
        self.response.committed()
    }

    pub fn user(&self) -> Option<&Arc<dyn User>> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: Arc<dyn User>) {
        self.user = Some(user);
    }

    /// `false` when there is no current user.
    pub fn user_can(&self, permission: Permission) -> bool {
        self.user.as_deref().is_some_and(|user| user.can(permission))
    }

    /// Write `body` as JSON.
    pub fn json<T: Serialize + ?Sized>(&mut self, body: &T) -> HandlerResult {
        self.response.set_header(CONTENT_TYPE, APPLICATION_JSON);
        self.response.write(body)
    }

    pub fn no_content(&mut self) {
        self.response.no_content();
    }

    /// Run `handler` now if the request carries `action` and nothing has
    /// been written yet. Returns whether it ran.
    pub fn run_if_action<F>(&mut self, action: Action, handler: F) -> bool
    where
        F: FnOnce(&mut Ctx) -> HandlerResult,
    {
        if self.action() != action || self.committed() {
            return false;
        }
        self.call(handler);
        true
    }

    /// Step one segment deeper and run `handler` there.
    ///
    /// No-op once the response is committed. Verb registrations made by the
    /// child do not leak back to the caller.
    pub fn advance_and_dispatch<F>(&mut self, handler: F)
    where
        F: FnOnce(&mut Ctx) -> HandlerResult,
    {
        if self.committed() {
            return;
        }
        let child = self.path.advanced();
        let parent = std::mem::replace(&mut self.path, child);
        let slots = (self.handler.take(), self.else_handler.take());

        self.call(handler);

        self.path = parent;
        (self.handler, self.else_handler) = slots;
    }

    /// Register `handler` for `action`. Only a registration matching the
    /// request's action is kept; a later one for the same verb replaces it.
    pub fn on<F>(&mut self, action: Action, handler: F) -> &mut Self
    where
        F: Fn(&mut Ctx) -> HandlerResult + Send + Sync + 'static,
    {
        if self.action() == action {
            self.handler = Some(Arc::new(handler));
        }
        self
    }

    pub fn create<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Ctx) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Action::Create, handler)
    }

    pub fn read<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Ctx) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Action::Read, handler)
    }

    pub fn update<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Ctx) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Action::Update, handler)
    }

    pub fn delete<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Ctx) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Action::Delete, handler)
    }

    /// Fallback used by [`Ctx::resolve`] when no verb handler matched.
    pub fn otherwise<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Ctx) -> HandlerResult + Send + Sync + 'static,
    {
        self.else_handler = Some(Arc::new(handler));
        self
    }

    /// Run the matched verb handler, else the fallback, else the app's
    /// default handler.
    ///
    /// The default handler runs at the current cursor, not at the root: if
    /// it is the top of the tree, it routes whatever segments remain after
    /// this one.
    pub fn resolve(&mut self) {
        let handler = match (self.handler.take(), self.else_handler.take()) {
            (Some(handler), _) | (None, Some(handler)) => handler,
            (None, None) => Arc::clone(self.app.default_handler()),
        };
        self.call(|ctx| handler(ctx));
    }

    /// Render `err` into the response. No-op once committed.
    pub fn error(&mut self, err: &Error) {
        render_error(&mut self.response, err);
    }

    pub fn not_found(&self) -> Error {
        Error::not_found(
            "not found",
            format!("url: {} not found", self.request.path().as_str()),
        )
    }

    pub fn unauthorized(&self) -> Error {
        Error::unauthorized(
            "unauthorized",
            format!(
                "user: {} is unauthorized to request: {}",
                self.user_label(),
                self.request.path().as_str()
            ),
        )
    }

    pub fn not_allowed(&self) -> Error {
        Error::method_not_allowed(
            "not allowed",
            format!(
                "user: {} is not allowed to {} {}",
                self.user_label(),
                self.action(),
                self.request.path().as_str()
            ),
        )
    }

    pub fn bad_request(&self) -> Error {
        Error::bad_request(
            "bad request",
            format!(
                "bad request: {} {} flags: {:?}",
                self.action(),
                self.request.path().as_str(),
                self.flags()
            ),
        )
    }

    pub fn internal_error(&self, err: impl fmt::Display) -> Error {
        Error::internal("internal server error", err.to_string())
    }

    pub fn unprocessable_entity(&self, code: i64, message: impl Into<String>) -> Error {
        Error::unprocessable_entity(code, message)
    }

    fn call<F>(&mut self, handler: F)
    where
        F: FnOnce(&mut Ctx) -> HandlerResult,
    {
        if self.committed() {
            return;
        }
        if let Err(err) = handler(self) {
            self.error(&err);
        }
    }

    fn user_label(&self) -> String {
        self.user
            .as_ref()
            .map_or_else(|| "anonymous".to_string(), |u| u.to_string())
    }
}

impl fmt::Debug for Ctx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ctx")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("path", &self.path)
            .field("user", &self.user.as_ref().map(|u| u.id()))
            .finish_non_exhaustive()
    }
}
