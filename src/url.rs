//! URL value object.
//!
//! Routing needs a URL split into the pieces it matches on (scheme, host,
//! port, path) and a way to put those pieces back together when generating
//! links. Parsing is delegated to the [`url`] crate; this type keeps the
//! decomposed, decoded view and accepts relative references (`/post?id=1`),
//! which is what most requests built in tests and sub-requests look like.

use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

use crate::error::Result;

/// Base used to resolve relative references. Its scheme is discarded.
const RELATIVE_BASE: &str = "relative:///";

/// Returns the port implied by `scheme` when none is written.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}

/// A parsed URL.
///
/// ```rust
/// use layover::Url;
///
/// let url: Url = "https://Example.com/blog/post.json?page=2".parse().unwrap();
/// assert_eq!(url.host(), Some("example.com"));
/// assert_eq!(url.port(), Some(443));
/// assert_eq!(url.path(), "/blog/post.json");
/// assert_eq!(url.extension(), Some("json".to_owned()));
/// assert_eq!(url.query_param("page"), Some("2"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Url {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    path: String,
    query: Vec<(String, String)>,
    fragment: Option<String>,
}

impl Default for Url {
    fn default() -> Self {
        Self {
            scheme: None,
            host: None,
            port: None,
            user: None,
            password: None,
            path: "/".to_owned(),
            query: Vec::new(),
            fragment: None,
        }
    }
}

impl Url {
    /// Parses an absolute URL or a relative reference.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Ok(Self::default());
        }

        match url::Url::parse(input) {
            Ok(parsed) => Ok(Self::from_parsed(&parsed, true)),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let parsed = url::Url::parse(RELATIVE_BASE)?.join(input)?;
                Ok(Self::from_parsed(&parsed, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn from_parsed(parsed: &url::Url, absolute: bool) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_owned());

        let path = urlencoding::decode(parsed.path())
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| parsed.path().to_owned());

        Self {
            scheme: absolute.then(|| parsed.scheme().to_ascii_lowercase()),
            host: parsed.host_str().and_then(non_empty).map(|h| h.to_ascii_lowercase()),
            port: parsed.port(),
            user: non_empty(parsed.username()),
            password: parsed.password().and_then(non_empty),
            path: if path.is_empty() { "/".to_owned() } else { path },
            query: parsed.query_pairs().into_owned().collect(),
            fragment: parsed.fragment().and_then(non_empty),
        }
    }

    /// Reassembles a URL string from its parts.
    ///
    /// The port is omitted when it is the scheme's default, and `query` is
    /// form-urlencoded. The scheme is only written when there is a host.
    pub fn build(
        scheme: Option<&str>,
        host: Option<&str>,
        port: Option<u16>,
        path: &str,
        query: &[(String, String)],
    ) -> String {
        let mut out = String::new();

        if let Some(host) = host.filter(|h| !h.is_empty()) {
            if let Some(scheme) = scheme.filter(|s| !s.is_empty()) {
                out.push_str(scheme);
                out.push(':');
            }
            out.push_str("//");
            out.push_str(host);

            let implied = scheme.and_then(default_port);
            if let Some(port) = port.filter(|p| Some(*p) != implied) {
                out.push(':');
                out.push_str(&port.to_string());
            }
        }

        out.push_str(path);

        if !query.is_empty() {
            out.push('?');
            out.push_str(
                &form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(query)
                    .finish(),
            );
        }

        out
    }

    pub fn scheme(&self) -> Option<&str> { self.scheme.as_deref() }
    pub fn host(&self) -> Option<&str> { self.host.as_deref() }
    pub fn user(&self) -> Option<&str> { self.user.as_deref() }
    pub fn password(&self) -> Option<&str> { self.password.as_deref() }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> &[(String, String)] { &self.query }
    pub fn fragment(&self) -> Option<&str> { self.fragment.as_deref() }

    /// The port written in the URL, or the scheme's default.
    pub fn port(&self) -> Option<u16> {
        self.port.or_else(|| self.scheme().and_then(default_port))
    }

    /// The port exactly as written, without the scheme default.
    pub fn explicit_port(&self) -> Option<u16> {
        self.port
    }

    /// The path as a mount prefix: no trailing slash, and `""` for the root.
    pub fn base_path(&self) -> &str {
        self.path.trim_end_matches('/')
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Lowercased extension of the last path segment (`/post.JSON` → `json`).
    pub fn extension(&self) -> Option<String> {
        let file = self.path.rsplit('/').next()?;
        let (stem, ext) = file.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    pub fn set_scheme(&mut self, scheme: Option<&str>) {
        self.scheme = scheme.map(str::to_ascii_lowercase);
    }

    pub fn set_host(&mut self, host: Option<&str>) {
        self.host = host.map(str::to_ascii_lowercase);
    }

    pub fn set_port(&mut self, port: Option<u16>) {
        self.port = port;
    }

    pub fn set_path(&mut self, path: &str) {
        self.path = if path.starts_with('/') { path.to_owned() } else { format!("/{path}") };
    }

    /// Replaces (or adds) a query parameter, keeping the position of the first one.
    pub fn set_query_param(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.query.iter().position(|(k, _)| k == name) {
            Some(i) => {
                self.query[i].1 = value;
                let mut seen = false;
                self.query.retain(|(k, _)| k != name || !std::mem::replace(&mut seen, true));
            }
            None => self.query.push((name.to_owned(), value)),
        }
    }
}

impl FromStr for Url {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut host = self.host.clone();

        if let (Some(h), Some(user)) = (host.as_mut(), self.user.as_deref()) {
            *h = match self.password.as_deref() {
                Some(pass) => format!("{user}:{pass}@{h}"),
                None => format!("{user}@{h}"),
            };
        }

        f.write_str(&Self::build(
            self.scheme(),
            host.as_deref(),
            self.port,
            &self.path,
            &self.query,
        ))?;

        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}
