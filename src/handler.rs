//! The [`Middleware`] trait and closure adaptation.
//!
//! # How processing units are stored
//!
//! A [`Stack`](crate::Stack) holds units of *different* types (closures,
//! detectors, routers, nested stacks) in a single `Vec`. Rust collections
//! can only hold one concrete type, so every unit is stored as a trait object
//! (`Arc<dyn Middleware>`) and called through one vtable dispatch.
//!
//! ```text
//! |req, res, next| { … }                ← user writes this
//!        ↓ from_fn(closure)
//! FromFn(closure)                       ← newtype implementing Middleware
//!        ↓ stack.push(…)
//! Arc<dyn Middleware>                   ← stored in the stack
//!        ↓ next.run(req, res)
//! unit.handle(req, res, next)           ← one virtual call per unit
//! ```

use std::sync::Arc;

use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use crate::stack::Next;

/// A processing unit in a [`Stack`](crate::Stack).
///
/// A unit receives the shared request/response pair and the [`Next`] cursor.
/// Calling `next.run(req, res)` continues with the rest of the stack; code
/// after that call runs on the way back out. Returning without calling it
/// ends the dispatch early; that is how authentication rejects a request.
///
/// ```rust
/// use layover::{Middleware, Next, Request, Response, Result};
///
/// struct PoweredBy;
///
/// impl Middleware for PoweredBy {
///     fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
///         next.run(req, res)?;
///         res.headers_mut().set("X-Powered-By", "layover");
///         Ok(())
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()>;
}

/// A type-erased unit shared between the stacks it is pushed onto.
pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        (**self).handle(req, res, next)
    }
}

impl<M: Middleware + ?Sized> Middleware for Box<M> {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        (**self).handle(req, res, next)
    }
}

/// Turns a closure into a [`Middleware`].
///
/// The explicit bound here is what lets the compiler infer the closure's
/// argument types, so no annotations are needed at the call site:
///
/// ```rust
/// use layover::{from_fn, Stack};
///
/// let mut stack = Stack::new();
/// stack.push(from_fn(|req, res, next| {
///     res.headers_mut().set("X-Path", req.path());
///     next.run(req, res)
/// }));
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Request, &mut Response, &mut Next) -> Result<()> + Send + Sync + 'static,
{
    FromFn(f)
}

/// Newtype produced by [`from_fn`].
pub struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
    F: Fn(&mut Request, &mut Response, &mut Next) -> Result<()> + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        (self.0)(req, res, next)
    }
}
