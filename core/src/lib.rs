//! Transport-agnostic request dispatch.
//!
//! # Overview
//! One tree of handler functions serves HTTP requests and command lines
//! alike. A transport adapter turns its input into a [`Request`] and an
//! empty [`Response`], [`App::handle`] wraps both in a [`Ctx`] and calls the
//! application's default handler. Handlers walk the path one segment at a
//! time: they look at [`Ctx::next`], answer, return an [`Error`], or hand
//! over to a child with [`Ctx::advance_and_dispatch`].
//!
//! # Design
//! - No route table and no pattern language; routing is ordinary control
//!   flow inside handlers.
//! - Request and response are closed enums over the HTTP, CLI and in-memory
//!   variants. Shared behaviour lives in the [`Inbound`] and [`Outbound`]
//!   traits.
//! - A response commits at most once. Errors are rendered by the context,
//!   never by handlers, and rendering a committed response does nothing.
//! - The core performs no I/O of its own; adapters own sockets and streams.

pub mod action;
pub mod app;
pub mod cli;
pub mod context;
pub mod error;
pub mod http;
pub mod path;
pub mod request;
pub mod response;
pub mod sub;
pub mod user;

pub use action::{Action, InvalidAction};
pub use app::{App, AppBuilder, Environment};
pub use cli::{CliRequest, CliResponse};
pub use context::{Ctx, Handler};
pub use error::{render_error, BoxError, Error, ErrorBody, HandlerResult};
pub use http::{HttpRequest, HttpResponse, UnresolvedMethod};
pub use path::{Flags, Path, Target};
pub use request::{Inbound, Input, Request};
pub use response::{Outbound, Recorded, Response, APPLICATION_JSON, CONTENT_TYPE};
pub use sub::{Requester, SubRequest, SubResponse};
pub use user::{Permission, User};
