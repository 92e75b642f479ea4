//! Response cookies.
//!
//! Cookies are collected on the [`Response`](crate::Response) while the stack
//! runs and rendered into `Set-Cookie` headers by
//! [`Response::prepare`](crate::Response::prepare). Attributes left unset on
//! a cookie can be filled in afterwards from [`CookieDefaults`], which is how
//! the [`BaseUrl`](crate::middleware::BaseUrl) middleware scopes every cookie
//! to the application's domain and path.

use chrono::{DateTime, TimeZone, Utc};

/// One cookie to send to the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cookie {
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub httponly: Option<bool>,
}

impl Cookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), ..Self::default() }
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn httponly(mut self, httponly: bool) -> Self {
        self.httponly = Some(httponly);
        self
    }

    /// Renders the value of a `Set-Cookie` header for this cookie.
    pub fn to_header_value(&self, name: &str) -> String {
        let mut out = format!("{}={}", urlencoding::encode(name), urlencoding::encode(&self.value));

        if let Some(expires) = self.expires {
            out.push_str("; Expires=");
            out.push_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        }
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.is_empty()) {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if self.secure == Some(true) {
            out.push_str("; Secure");
        }
        if self.httponly == Some(true) {
            out.push_str("; HttpOnly");
        }
        out
    }
}

/// Attribute values applied to every cookie that leaves them unset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieDefaults {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub httponly: Option<bool>,
}

/// Ordered collection of response cookies, keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cookies {
    items: Vec<(String, Cookie)>,
}

impl Cookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the cookie called `name`.
    pub fn set(&mut self, name: impl Into<String>, cookie: Cookie) {
        let name = name.into();
        match self.items.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = cookie,
            None => self.items.push((name, cookie)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.items.iter().find(|(k, _)| k == name).map(|(_, c)| c)
    }

    pub fn remove(&mut self, name: &str) -> Option<Cookie> {
        let index = self.items.iter().position(|(k, _)| k == name)?;
        Some(self.items.remove(index).1)
    }

    /// Asks the client to drop `name` by sending it already expired.
    pub fn delete(&mut self, name: impl Into<String>) {
        let expired = Utc.timestamp_opt(1, 0).single().unwrap_or_default();
        self.set(name, Cookie::new("").expires(expired));
    }

    pub fn apply_defaults(&mut self, defaults: &CookieDefaults) {
        for (_, cookie) in &mut self.items {
            if cookie.path.is_none() {
                cookie.path.clone_from(&defaults.path);
            }
            if cookie.domain.is_none() {
                cookie.domain.clone_from(&defaults.domain);
            }
            cookie.secure = cookie.secure.or(defaults.secure);
            cookie.httponly = cookie.httponly.or(defaults.httponly);
        }
    }

    /// One `Set-Cookie` value per cookie.
    pub fn header_values(&self) -> Vec<String> {
        self.items.iter().map(|(name, c)| c.to_header_value(name)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cookie)> {
        self.items.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
