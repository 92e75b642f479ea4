//! Pattern-matching routes and the [`Router`] middleware.
//!
//! ```rust
//! use layover::router::{RouteConfig, RouteTable, Router, Target};
//! use layover::{Method, Request, Stack};
//!
//! let mut routes = RouteTable::new();
//! routes
//!     .map(
//!         "put",
//!         RouteConfig::new("/put/{id}", Target::function(|req, _, _| {
//!             Ok(format!("This is PUT/{}", req.param("id").unwrap_or_default()))
//!         }))
//!         .method(Method::Put)
//!         .filter("id", r"[\d]+"),
//!     )
//!     .unwrap();
//!
//! let app = Stack::new().with(Router::new(routes));
//! let res = app.dispatch(Request::parse("PUT", "http://domain.com/put/23").unwrap()).unwrap();
//! assert_eq!(res.body().text(), "This is PUT/23");
//! ```

pub mod config;
mod route;
mod table;
mod target;

use std::sync::Arc;

use tracing::debug;

pub use config::{Constraint, RouteConfig};
pub use route::Route;
pub use table::RouteTable;
pub use target::{Controller, Namespace, Target, TargetRef};

use crate::error::{Error, HttpError, Result};
use crate::handler::Middleware;
use crate::request::{Request, keys};
use crate::response::{Reply, Response};
use crate::stack::Next;
use crate::url::Url;

/// Reverse routing for route targets.
///
/// While a [`Router`] dispatches, the request's `URLS` attribute holds one of
/// these, bound to the router's table and the base URL of the dispatch.
///
/// ```rust,ignore
/// let urls = req.attributes().get::<Urls>(keys::URLS).unwrap();
/// let link = urls.url_for("put", &[("id", "34")])?;
/// ```
#[derive(Clone, Debug)]
pub struct Urls {
    table: Arc<RouteTable>,
    base: Url,
}

impl Urls {
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
        self.table.get_url(name, &self.base, params)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

/// Dispatches requests to the routes of a [`RouteTable`].
///
/// The router is one unit in a stack. It reads the mount point from the
/// `BASE_URL` attribute (the root when unset), runs the first matching route,
/// and continues with the rest of the stack. A target that continued the
/// stack itself, such as a nested [`Stack`](crate::Stack), is not continued
/// a second time.
///
/// When no route matches, or the target fails with an [`HttpError`], the
/// table's error route renders the response: the body is cleared, the status
/// is taken from the error and the error is stored in the `ERROR` attribute.
/// Without an error route the error is returned to the caller. Any other
/// error is never handled here.
#[derive(Clone, Debug)]
pub struct Router {
    table: Arc<RouteTable>,
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        Self::shared(Arc::new(table))
    }

    /// A router over a table that is also used elsewhere.
    pub fn shared(table: Arc<RouteTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    fn route(&self, req: &mut Request, res: &mut Response, next: &mut Next, base: &Url) -> Result<()> {
        let outcome = match self.table.lookup(req, base) {
            Some(route) => {
                debug!(route = route.name(), method = %req.method(), path = req.path(), "route matched");
                let target = route.target().clone();
                req.attributes_mut().set(keys::ROUTE, route);
                execute(&target, req, res, next)
            }
            None => {
                debug!(method = %req.method(), path = req.path(), "no route matched");
                Err(HttpError::not_found().into())
            }
        };

        match outcome {
            Err(Error::Http(error)) => match self.table.error_target() {
                Some(target) => {
                    debug!(status = error.status(), message = error.message(), "rendering error route");
                    res.body_mut().clear();
                    if res.set_status(error.status()).is_err() {
                        res.set_status(500)?;
                    }
                    req.attributes_mut().set(keys::ERROR, error);
                    execute(target, req, res, next)
                }
                None => Err(Error::Http(error)),
            },
            other => other,
        }
    }
}

impl Middleware for Router {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        let base = req.attributes().get::<Url>(keys::BASE_URL).cloned().unwrap_or_default();

        let outer = req.attributes().get::<Urls>(keys::URLS).cloned();
        req.attributes_mut()
            .set(keys::URLS, Urls { table: Arc::clone(&self.table), base: base.clone() });

        let mark = next.mark();
        let outcome = self.route(req, res, next, &base);

        match outer {
            Some(urls) => req.attributes_mut().set(keys::URLS, urls),
            None => {
                req.attributes_mut().remove(keys::URLS);
            }
        }

        outcome?;
        if next.moved_since(mark) {
            return Ok(());
        }
        next.run(req, res)
    }
}

/// Runs `target` and folds its reply into `res`.
fn execute(target: &Target, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
    match target.call(req, res, next)? {
        Reply::Empty => Ok(()),
        Reply::Bytes(bytes) => res.write(bytes),
        Reply::Response(replacement) => {
            *res = replacement;
            Ok(())
        }
    }
}
