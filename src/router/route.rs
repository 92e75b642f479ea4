//! A single route: match constraints bound to a target.

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::method::Method;
use crate::request::Request;
use crate::url::Url;

use super::config::{Constraint, RouteConfig};
use super::target::Target;

const DEFAULT_FILTER: &str = "[^/]+";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^}]*)\}").unwrap_or_else(|e| unreachable!("placeholder pattern is valid: {e}"))
});

/// A named route.
///
/// Paths without placeholders are compared as plain strings. Paths with
/// `{name}` placeholders (or a route with an explicit `regex`) are compiled
/// into an anchored pattern when the route is built; each placeholder becomes
/// a named group matching its filter, `[^/]+` by default.
///
/// Every constraint the route leaves unset falls back to the base URL the
/// route is matched under, and a value the request does not carry never
/// fails a constraint.
pub struct Route {
    name: String,
    target: Target,
    path: String,
    pattern: Option<Regex>,
    method: Option<Constraint<Method>>,
    scheme: Option<Constraint<String>>,
    host: Option<Constraint<String>>,
    port: Option<Constraint<u16>>,
    language: Option<Constraint<String>>,
    ip: Option<Constraint<IpAddr>>,
}

impl Route {
    pub(crate) fn new(name: impl Into<String>, config: RouteConfig, target: Target) -> Result<Self> {
        let name = name.into();
        let path = normalize_path(&config.path).into_owned();

        let pattern = match (&config.regex, PLACEHOLDER.is_match(&path)) {
            (Some(body), _) => Some(compile(&name, body)?),
            (None, true) => Some(compile(&name, &template_pattern(&path, &config))?),
            (None, false) => None,
        };

        let lowercase = |s: String| s.to_ascii_lowercase();

        Ok(Self {
            name,
            target,
            path,
            pattern,
            method: config.method,
            scheme: config.scheme.map(|c| c.map(lowercase)),
            host: config.host.map(|c| c.map(lowercase)),
            port: config.port,
            language: config.language.map(|c| c.map(lowercase)),
            ip: config.ip,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path template, e.g. `/put/{id}`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn is_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    /// Checks `req` against this route under the mount point `base`.
    ///
    /// On success the placeholder values are stored in the request
    /// attributes as `String`s, replacing earlier values of the same name.
    /// On failure the request is left untouched.
    pub fn matches(&self, req: &mut Request, base: &Url) -> bool {
        if !self.constraints_hold(req, base) {
            return false;
        }

        let Some(params) = self.match_path(req.path(), base) else {
            return false;
        };

        let attributes = req.attributes_mut();
        for (name, value) in params {
            attributes.set(name, value);
        }
        true
    }

    fn constraints_hold(&self, req: &Request, base: &Url) -> bool {
        let url = req.url();
        let language = req.language().map(str::to_ascii_lowercase);

        check(self.ip.as_ref(), None, req.client_ip().as_ref())
            && check(self.method.as_ref(), None, Some(&req.method()))
            && check(self.language.as_ref(), None, language.as_deref())
            && check(self.scheme.as_ref(), base.scheme(), url.scheme())
            && check(self.host.as_ref(), base.host(), url.host())
            && check(self.port.as_ref(), base.port().as_ref(), url.port().as_ref())
    }

    /// The captured placeholders when `path` (relative to `base`) matches.
    fn match_path(&self, path: &str, base: &Url) -> Option<Vec<(String, String)>> {
        let rest = path.strip_prefix(base.base_path())?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        let relative = normalize_path(rest);

        let Some(pattern) = &self.pattern else {
            return (relative == self.path).then(Vec::new);
        };

        let captures = pattern.captures(&relative)?;
        Some(
            pattern
                .capture_names()
                .flatten()
                .filter_map(|name| Some((name.to_owned(), captures.name(name)?.as_str().to_owned())))
                .collect(),
        )
    }

    /// Builds the URL of this route under the mount point `base`.
    ///
    /// Parameters named after a placeholder are URL-encoded into the path; the
    /// rest become the query string. Scheme, host and port come from the
    /// route's own constraints when set, from `base` otherwise.
    pub fn generate(&self, base: &Url, params: &[(&str, &str)]) -> Result<String> {
        let mut query: Vec<(String, String)> =
            params.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();

        let mut path = String::from(base.base_path());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&self.path) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            let index = query.iter().position(|(k, _)| k == name).ok_or_else(|| {
                Error::MissingParameter { route: self.name.clone(), name: name.to_owned() }
            })?;
            let (_, value) = query.remove(index);

            path.push_str(&self.path[last..whole.start()]);
            path.push_str(&urlencoding::encode(&value));
            last = whole.end();
        }
        path.push_str(&self.path[last..]);

        let scheme = self.scheme.as_ref().and_then(Constraint::first).map(String::as_str).or(base.scheme());
        let host = self.host.as_ref().and_then(Constraint::first).map(String::as_str).or(base.host());
        let port = self.port.as_ref().and_then(Constraint::first).copied().or(base.port());

        Ok(Url::build(scheme, host, port, &path, &query))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// The route's constraint, else the base URL's value, must accept what the
/// request carries. A request without the value always passes.
fn check<T, Q>(route: Option<&Constraint<T>>, base: Option<&Q>, observed: Option<&Q>) -> bool
where
    T: Borrow<Q>,
    Q: PartialEq + ?Sized,
{
    let Some(observed) = observed else {
        return true;
    };
    match (route, base) {
        (Some(constraint), _) => constraint.allows(observed),
        (None, Some(base)) => base == observed,
        (None, None) => true,
    }
}

/// Strips the trailing slash; an empty path is the root.
fn normalize_path(path: &str) -> Cow<'_, str> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else if trimmed.starts_with('/') {
        trimmed.into()
    } else {
        format!("/{trimmed}").into()
    }
}

/// Turns `/put/{id}` into `/put/(?P<id>[^/]+)`, escaping the literal parts.
fn template_pattern(path: &str, config: &RouteConfig) -> String {
    let mut pattern = String::new();
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(path) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let filter = config.filters.get(name.as_str()).map_or(DEFAULT_FILTER, String::as_str);
        pattern.push_str(&regex::escape(&path[last..whole.start()]));
        pattern.push_str(&format!("(?P<{}>{filter})", name.as_str()));
        last = whole.end();
    }
    pattern.push_str(&regex::escape(&path[last..]));
    pattern
}

fn compile(route: &str, body: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{body})$"))
        .map_err(|source| Error::InvalidPattern { route: route.to_owned(), source })
}
