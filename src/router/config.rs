//! Route configuration records.
//!
//! A [`RouteConfig`] is what a route is built from. It can be assembled in
//! code with the builder methods or deserialized from a configuration file:
//!
//! ```toml
//! error = "Errors::show"
//!
//! [[routes]]
//! name = "put"
//! path = "/put/{id}"
//! method = ["PUT", "PATCH"]
//! filters = { id = "[0-9]+" }
//! target = "Items::update"
//! ```
//!
//! Routes are tried in the order they are declared.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Deserialize;

use crate::method::Method;

use super::target::TargetRef;

/// A match constraint: one accepted value or a list of them.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Constraint<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Constraint<T> {
    pub fn allows<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self {
            Self::One(v) => Borrow::<Q>::borrow(v) == value,
            Self::Many(list) => list.iter().any(|v| Borrow::<Q>::borrow(v) == value),
        }
    }

    /// The value used when generating URLs: the only value, or the first listed.
    pub fn first(&self) -> Option<&T> {
        match self {
            Self::One(v) => Some(v),
            Self::Many(list) => list.first(),
        }
    }

    pub(crate) fn map<U>(self, f: impl Fn(T) -> U) -> Constraint<U> {
        match self {
            Self::One(v) => Constraint::One(f(v)),
            Self::Many(list) => Constraint::Many(list.into_iter().map(f).collect()),
        }
    }
}

impl<T> From<T> for Constraint<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl From<&str> for Constraint<String> {
    fn from(value: &str) -> Self {
        Self::One(value.to_owned())
    }
}

impl<const N: usize> From<[&str; N]> for Constraint<String> {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.iter().map(|v| (*v).to_owned()).collect())
    }
}

/// Everything a route is built from.
#[derive(Clone, Debug, Deserialize)]
pub struct RouteConfig {
    pub path: String,
    #[serde(default)]
    pub method: Option<Constraint<Method>>,
    #[serde(default)]
    pub scheme: Option<Constraint<String>>,
    #[serde(default)]
    pub host: Option<Constraint<String>>,
    #[serde(default)]
    pub port: Option<Constraint<u16>>,
    #[serde(default)]
    pub language: Option<Constraint<String>>,
    #[serde(default)]
    pub ip: Option<Constraint<IpAddr>>,
    /// Regex fragment per placeholder; placeholders without one match `[^/]+`.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    /// Replaces the pattern compiled from `path`. Matching only; URLs are
    /// still generated from `path`.
    #[serde(default)]
    pub regex: Option<String>,
    pub target: TargetRef,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>, target: impl Into<TargetRef>) -> Self {
        Self {
            path: path.into(),
            method: None,
            scheme: None,
            host: None,
            port: None,
            language: None,
            ip: None,
            filters: BTreeMap::new(),
            regex: None,
            target: target.into(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(Constraint::One(method));
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.method = Some(Constraint::Many(methods.into_iter().collect()));
        self
    }

    pub fn scheme(mut self, scheme: impl Into<Constraint<String>>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn host(mut self, host: impl Into<Constraint<String>>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: impl Into<Constraint<u16>>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn language(mut self, language: impl Into<Constraint<String>>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn ip(mut self, ip: impl Into<Constraint<IpAddr>>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Restricts what placeholder `{name}` matches.
    pub fn filter(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.insert(name.into(), pattern.into());
        self
    }

    pub fn regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }
}

/// A `[[routes]]` entry: a route name next to its configuration.
#[derive(Debug, Deserialize)]
pub(crate) struct RouteEntry {
    pub name: String,
    #[serde(flatten)]
    pub config: RouteConfig,
}

/// The top level of a route configuration file.
#[derive(Debug, Deserialize)]
pub(crate) struct RouteFile {
    #[serde(default)]
    pub error: Option<TargetRef>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_and_lists_deserialize() {
        let file: RouteFile = toml::from_str(
            r#"
            [[routes]]
            name = "get-post"
            path = "/get/post"
            method = ["post", "GET"]
            port = 8080
            ip = "127.0.0.1"
            target = "Posts::show"
            "#,
        )
        .unwrap();

        let entry = &file.routes[0];
        assert_eq!(entry.name, "get-post");
        assert_eq!(entry.config.method, Some(Constraint::Many(vec![Method::Post, Method::Get])));
        assert_eq!(entry.config.port, Some(Constraint::One(8080)));
        let localhost: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(entry.config.ip.as_ref().unwrap().allows(&localhost));
        assert!(matches!(&entry.config.target, TargetRef::Named(n) if n == "Posts::show"));
        assert!(file.error.is_none());
    }

    #[test]
    fn list_constraints_test_membership() {
        let c = Constraint::Many(vec!["http".to_owned(), "https".to_owned()]);
        assert!(c.allows("https"));
        assert!(!c.allows("ftp"));
        assert_eq!(c.first().map(String::as_str), Some("http"));
    }
}
