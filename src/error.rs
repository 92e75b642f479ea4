//! Unified error type.
//!
//! Two kinds of failure flow through a dispatch:
//!
//! - [`HttpError`]: a *declared* failure carrying an HTTP status. Route
//!   targets raise it on purpose (`404`, `403`, `422`, …) and the
//!   [`Router`](crate::router::Router) renders it through the error route.
//! - everything else: configuration mistakes and unclassified failures from
//!   user code. The router never catches these; they surface from
//!   [`Stack::run`](crate::Stack::run) unchanged.

use std::fmt;

/// Shorthand used by every fallible operation in the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by layover's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A declared application error. The only variant the router recovers from.
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("a route named `{0}` is already registered")]
    DuplicateRoute(String),

    #[error("no route with the name `{0}` has been found")]
    UnknownRoute(String),

    #[error("no target `{0}` is registered in the namespace")]
    UnknownTarget(String),

    #[error("route `{route}` needs a value for `{{{name}}}`")]
    MissingParameter { route: String, name: String },

    #[error("route `{route}` has an invalid pattern: {source}")]
    InvalidPattern {
        route: String,
        #[source]
        source: regex::Error,
    },

    #[error("`{0}` is not a supported HTTP method")]
    InvalidMethod(String),

    #[error("{0} is not a valid HTTP status code")]
    InvalidStatus(u16),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid route configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else a middleware or route target fails with.
    #[error(transparent)]
    Handler(BoxError),
}

impl Error {
    /// Wraps an arbitrary error raised by user code.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// Returns the application error, if this is one.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// A failure with HTTP semantics: a status code and a human-readable message.
///
/// ```rust
/// use layover::HttpError;
///
/// let e = HttpError::with_status(403, "Forbidden area");
/// assert_eq!(e.status(), 403);
/// assert_eq!(HttpError::new("boom").status(), 500);
/// ```
#[derive(Debug, Clone)]
pub struct HttpError {
    status: u16,
    message: String,
    source: Option<std::sync::Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HttpError {
    /// An application error with the default status, `500`.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_status(500, message)
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), source: None }
    }

    /// The error raised when no route matches a request.
    pub fn not_found() -> Self {
        Self::with_status(404, "Not found")
    }

    /// Attaches the underlying cause.
    pub fn caused_by(mut self, source: impl Into<BoxError>) -> Self {
        let source: BoxError = source.into();
        self.source = Some(std::sync::Arc::from(source));
        self
    }

    /// The status code; `0` is treated as "unspecified" and reported as `500`.
    pub fn status(&self) -> u16 {
        if self.status == 0 { 500 } else { self.status }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status(), self.message)
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
