//! Incoming HTTP request type.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use crate::body::Body;
use crate::headers::Headers;
use crate::method::Method;
use crate::url::Url;

/// Well-known attribute keys written by the built-in middleware and the router.
pub mod keys {
    /// [`Url`](crate::Url) the application is mounted at.
    pub const BASE_URL: &str = "BASE_URL";
    /// Client [`IpAddr`](std::net::IpAddr) found by the IP detector.
    pub const IP: &str = "IP";
    /// Two-letter language code (`String`).
    pub const LANGUAGE: &str = "LANGUAGE";
    /// Response format name such as `json` (`String`).
    pub const FORMAT: &str = "FORMAT";
    /// The matched `Arc<Route>`.
    pub const ROUTE: &str = "ROUTE";
    /// The [`HttpError`](crate::HttpError) handed to the error route.
    pub const ERROR: &str = "ERROR";
    /// Reverse-routing helper bound to the active table, [`Urls`](crate::router::Urls).
    pub const URLS: &str = "URLS";
}

/// Headers consulted for the client address, in priority order.
const FORWARDING_HEADERS: [&str; 6] = [
    "Client-Ip",
    "X-Forwarded-For",
    "X-Forwarded",
    "X-Cluster-Client-Ip",
    "Forwarded-For",
    "Forwarded",
];

/// Values shared between middleware units and route targets, keyed by name.
///
/// Path parameters captured by a route are stored here as `String`s under
/// the placeholder name.
#[derive(Clone, Default)]
pub struct Attributes {
    items: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Attributes {
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.items.insert(key.into(), Arc::new(value));
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.items.get(key)?.downcast_ref()
    }

    /// Shorthand for string attributes such as path parameters.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get::<String>(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.items.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.keys()).finish()
    }
}

/// An incoming HTTP request.
///
/// ```rust
/// use layover::{Method, Request};
///
/// let mut req = Request::new(Method::Put, "http://domain.com/put/23".parse().unwrap());
/// req.headers_mut().set("x-forwarded-for", "unknown, 10.0.0.7");
/// assert_eq!(req.client_ip(), Some("10.0.0.7".parse().unwrap()));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Headers,
    attributes: Attributes,
    body: Body,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, ..Self::default() }
    }

    /// Builds a `GET` request for `url`.
    pub fn get(url: &str) -> crate::Result<Self> {
        Ok(Self::new(Method::Get, url.parse()?))
    }

    /// Builds a request from a method name in any case and a URL string.
    pub fn parse(method: &str, url: &str) -> crate::Result<Self> {
        Ok(Self::new(method.parse()?, url.parse()?))
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn url(&self) -> &Url { &self.url }
    pub fn path(&self) -> &str { self.url.path() }
    pub fn headers(&self) -> &Headers { &self.headers }
    pub fn attributes(&self) -> &Attributes { &self.attributes }
    pub fn body(&self) -> &Body { &self.body }

    pub fn set_method(&mut self, method: Method) { self.method = method; }
    pub fn url_mut(&mut self) -> &mut Url { &mut self.url }
    pub fn headers_mut(&mut self) -> &mut Headers { &mut self.headers }
    pub fn attributes_mut(&mut self) -> &mut Attributes { &mut self.attributes }
    pub fn body_mut(&mut self) -> &mut Body { &mut self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Returns a named path parameter captured by the matched route.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.attributes.get_str(key)
    }

    /// Every syntactically valid IP found in the forwarding headers.
    ///
    /// Headers are scanned in a fixed priority order and each value is split
    /// on commas. These headers are client-controlled; do not treat the
    /// result as trusted unless a proxy you control overwrites them.
    pub fn client_ips(&self) -> Vec<IpAddr> {
        FORWARDING_HEADERS
            .iter()
            .flat_map(|name| self.headers.get_all(name))
            .flat_map(|value| value.split(','))
            .filter_map(|candidate| candidate.trim().parse().ok())
            .collect()
    }

    /// The detected client IP: the `IP` attribute if a detector ran, otherwise
    /// the first address from [`client_ips`](Self::client_ips).
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.attributes
            .get::<IpAddr>(keys::IP)
            .copied()
            .or_else(|| self.client_ips().into_iter().next())
    }

    /// The language chosen by upstream middleware, if any.
    pub fn language(&self) -> Option<&str> {
        self.attributes.get_str(keys::LANGUAGE)
    }

    /// The response format: the `FORMAT` attribute, else the URL extension,
    /// else `html`.
    pub fn format(&self) -> String {
        self.attributes
            .get_str(keys::FORMAT)
            .map(str::to_owned)
            .or_else(|| self.url.extension())
            .unwrap_or_else(|| "html".to_owned())
    }

    pub fn is_ajax(&self) -> bool {
        self.header("X-Requested-With")
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
    }
}
