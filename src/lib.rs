//! # layover
//!
//! Composable middleware stacks and pattern-matching routes for HTTP request
//! handling. Transport is somebody else's job: layover takes a [`Request`],
//! runs it through a [`Stack`] and hands back a [`Response`] ready to be
//! written to whatever sink you have.
//!
//! ## The model
//!
//! - A [`Stack`] is an ordered list of [`Middleware`] units. Each unit gets
//!   the request, the response and a [`Next`] cursor, and decides whether to
//!   continue the stack, what to do before, and what to do after.
//! - Stacks nest. A stack pushed onto another stack runs its own units, then
//!   carries on with the enclosing one.
//! - A [`Router`](router::Router) is just another unit. It matches the request
//!   against a [`RouteTable`](router::RouteTable) in registration order and
//!   runs the first route that fits.
//! - Only [`HttpError`]s are turned into error pages. Everything else surfaces
//!   from [`Stack::run`] as is.
//!
//! ## Quick start
//!
//! ```rust
//! use layover::middleware::BaseUrl;
//! use layover::router::{RouteConfig, RouteTable, Router, Target};
//! use layover::{HttpError, Method, Request, Result, Stack, keys};
//!
//! let mut routes = RouteTable::new();
//! routes.map("index", RouteConfig::new("/", Target::function(|_, _, _| Ok("This is the index"))))?;
//! routes.map(
//!     "post",
//!     RouteConfig::new("/post", Target::function(|_, res, _| res.write("This is POST")))
//!         .method(Method::Post),
//! )?;
//! routes.set_error(Target::function(|req, _, _| {
//!     let error = req.attributes().get::<HttpError>(keys::ERROR).cloned();
//!     Ok(error.map(|e| format!("Error {}/{}", e.status(), e.message())))
//! }))?;
//!
//! let app = Stack::new()
//!     .with(BaseUrl::parse("http://domain.com")?)
//!     .with(Router::new(routes));
//!
//! let res = app.dispatch(Request::parse("POST", "http://domain.com/post")?)?;
//! assert_eq!(res.body().text(), "This is POST");
//!
//! let res = app.dispatch(Request::get("http://domain.com/missing")?)?;
//! assert_eq!(res.status(), 404);
//! assert_eq!(res.body().text(), "Error 404/Not found");
//! # Ok::<(), layover::Error>(())
//! ```

mod body;
mod cookies;
mod error;
mod handler;
mod headers;
mod method;
mod request;
mod response;
mod stack;
mod url;

pub mod middleware;
pub mod router;

pub use body::Body;
pub use cookies::{Cookie, CookieDefaults, Cookies};
pub use error::{Error, HttpError, Result};
pub use handler::{FromFn, Middleware, from_fn};
pub use headers::Headers;
pub use method::Method;
pub use request::{Attributes, Request, keys};
pub use response::{IntoReply, Reply, Response};
pub use stack::{Next, Stack};
pub use self::url::Url;
