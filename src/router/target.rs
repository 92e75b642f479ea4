//! What a route runs once it matches.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::handler::Middleware;
use crate::request::Request;
use crate::response::{IntoReply, Reply, Response};
use crate::stack::Next;

type TargetFn = dyn Fn(&mut Request, &mut Response, &mut Next) -> Result<Reply> + Send + Sync;

/// A type whose methods serve as route targets.
///
/// The router builds a fresh value for every request it dispatches to one of
/// the type's methods, so per-request state can live in the controller.
///
/// ```rust
/// use layover::router::{Controller, Target};
/// use layover::{Next, Request, Response, Result};
///
/// struct Blog {
///     slug: String,
/// }
///
/// impl Controller for Blog {
///     fn new(req: &mut Request, _: &mut Response, _: &mut Next) -> Result<Self> {
///         Ok(Self { slug: req.param("slug").unwrap_or_default().to_owned() })
///     }
/// }
///
/// impl Blog {
///     fn show(&self, _: &mut Request, _: &mut Response) -> Result<String> {
///         Ok(format!("post {}", self.slug))
///     }
/// }
///
/// let target = Target::method(Blog::show);
/// ```
pub trait Controller: Sized + 'static {
    fn new(req: &mut Request, res: &mut Response, next: &mut Next) -> Result<Self>;
}

/// A route target.
///
/// Whatever the target returns is folded into the response by the router:
/// text and bytes are appended to the body (after anything the target wrote
/// itself), a [`Response`] replaces the working one.
#[derive(Clone)]
pub enum Target {
    /// A closure or function.
    Function(Arc<TargetFn>),
    /// A controller method; the controller is constructed before each call.
    Method { controller: &'static str, call: Arc<TargetFn> },
    /// A middleware unit such as a nested [`Stack`](crate::Stack). When its
    /// units run out, dispatch continues with the stack the router is in.
    Middleware(Arc<dyn Middleware>),
}

impl Target {
    pub fn function<F, R>(f: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &mut Next) -> Result<R> + Send + Sync + 'static,
        R: IntoReply,
    {
        Self::Function(Arc::new(move |req: &mut Request, res: &mut Response, next: &mut Next| {
            f(req, res, next).map(IntoReply::into_reply)
        }))
    }

    pub fn method<C, F, R>(method: F) -> Self
    where
        C: Controller,
        F: Fn(&C, &mut Request, &mut Response) -> Result<R> + Send + Sync + 'static,
        R: IntoReply,
    {
        Self::Method {
            controller: std::any::type_name::<C>(),
            call: Arc::new(move |req: &mut Request, res: &mut Response, next: &mut Next| {
                let controller = C::new(req, res, next)?;
                method(&controller, req, res).map(IntoReply::into_reply)
            }),
        }
    }

    pub fn middleware(unit: impl Middleware) -> Self {
        Self::Middleware(Arc::new(unit))
    }

    pub(crate) fn call(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<Reply> {
        match self {
            Self::Function(f) | Self::Method { call: f, .. } => f(req, res, next),
            Self::Middleware(unit) => {
                unit.handle(req, res, next)?;
                Ok(Reply::Empty)
            }
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Target::Function"),
            Self::Method { controller, .. } => write!(f, "Target::Method({controller})"),
            Self::Middleware(_) => f.write_str("Target::Middleware"),
        }
    }
}

/// A target as written in a route configuration: either the target itself or
/// a `"Class::method"` name to look up in a [`Namespace`].
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "String")]
pub enum TargetRef {
    Named(String),
    Direct(Target),
}

impl From<String> for TargetRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<&str> for TargetRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<Target> for TargetRef {
    fn from(target: Target) -> Self {
        Self::Direct(target)
    }
}

/// Named targets, so routes can be declared in configuration files.
///
/// Names take the form `"Class::method"`. A bare `"Class"` refers to
/// `"Class::invoke"`.
#[derive(Clone, Debug, Default)]
pub struct Namespace {
    targets: HashMap<String, Target>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `target` under `name`. Returns `self` for chaining.
    pub fn with(mut self, name: impl Into<String>, target: Target) -> Self {
        self.register(name, target);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, target: Target) {
        self.targets.insert(name.into(), target);
    }

    pub fn resolve(&self, name: &str) -> Result<Target> {
        let key = if name.contains("::") { name.to_owned() } else { format!("{name}::invoke") };
        self.targets
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::UnknownTarget(name.to_owned()))
    }

    pub(crate) fn resolve_ref(&self, target: TargetRef) -> Result<Target> {
        match target {
            TargetRef::Named(name) => self.resolve(&name),
            TargetRef::Direct(target) => Ok(target),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
