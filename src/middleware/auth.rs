use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::Result;
use crate::handler::Middleware;
use crate::request::Request;
use crate::response::Response;
use crate::stack::Next;

const DEFAULT_REALM: &str = "Login";
const REJECTION_BODY: &str = "You must login before enter";

/// Credential check shared by the authentication middleware.
///
/// Implementors decide whether a request is logged in and what challenge to
/// send when it is not. [`authenticate`](Authentication::authenticate) does
/// the rest: continue on success, or answer `401` and stop the stack.
pub trait Authentication {
    fn login(&self, req: &Request) -> bool;

    /// The `WWW-Authenticate` header value sent with the `401`.
    fn challenge(&self) -> String;

    fn authenticate(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        if self.login(req) {
            return next.run(req, res);
        }

        warn!(method = %req.method(), path = req.path(), "authentication failed");
        res.set_status(401)?;
        res.headers_mut().set("WWW-Authenticate", self.challenge());
        res.write(REJECTION_BODY)
    }
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", Md5::digest(input.as_bytes()))
}

// ── Basic ────────────────────────────────────────────────────────────────────

/// HTTP basic authentication against a fixed user → password map.
#[derive(Clone, Debug)]
pub struct BasicAuthentication {
    users: HashMap<String, String>,
    realm: String,
}

impl BasicAuthentication {
    pub fn new<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            users: users.into_iter().map(|(u, p)| (u.into(), p.into())).collect(),
            realm: DEFAULT_REALM.to_owned(),
        }
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    fn credentials(header: &str) -> Option<(String, String)> {
        let encoded = header.strip_prefix("Basic ")?;
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':').unwrap_or((&decoded, ""));
        Some((user.to_owned(), password.to_owned()))
    }
}

impl Authentication for BasicAuthentication {
    fn login(&self, req: &Request) -> bool {
        req.header("Authorization")
            .and_then(Self::credentials)
            .is_some_and(|(user, password)| self.users.get(&user) == Some(&password))
    }

    fn challenge(&self) -> String {
        format!("Basic realm=\"{}\"", self.realm)
    }
}

impl Middleware for BasicAuthentication {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        self.authenticate(req, res, next)
    }
}

// ── Digest ───────────────────────────────────────────────────────────────────

static DIGEST_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(nonce|nc|cnonce|qop|username|uri|response)=(?:"([^"]*)"|'([^']*)'|([^\s,]+))"#)
        .unwrap_or_else(|e| unreachable!("digest pattern is valid: {e}"))
});

const DIGEST_PARTS: [&str; 7] = ["nonce", "nc", "cnonce", "qop", "username", "uri", "response"];

/// HTTP digest authentication (`qop="auth"`) against a fixed user → password map.
#[derive(Clone, Debug)]
pub struct DigestAuthentication {
    users: HashMap<String, String>,
    realm: String,
    nonce: String,
}

impl DigestAuthentication {
    /// Uses a nonce derived from the current time; see [`nonce`](Self::nonce).
    pub fn new<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        let seed = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self {
            users: users.into_iter().map(|(u, p)| (u.into(), p.into())).collect(),
            realm: DEFAULT_REALM.to_owned(),
            nonce: format!("{seed:x}"),
        }
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self
    }

    /// The parts of a `Digest` authorization header, when all of them are present.
    fn parts(header: &str) -> Option<HashMap<&str, &str>> {
        let params = header.strip_prefix("Digest ")?;
        let parts: HashMap<&str, &str> = DIGEST_PART
            .captures_iter(params)
            .filter_map(|c| {
                let name = c.get(1)?.as_str();
                let value = c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4))?.as_str();
                Some((name, value))
            })
            .collect();

        DIGEST_PARTS.iter().all(|p| parts.contains_key(p)).then_some(parts)
    }

    fn expected_response(&self, parts: &HashMap<&str, &str>, method: &str, password: &str) -> String {
        let a1 = md5_hex(&format!("{}:{}:{password}", parts["username"], self.realm));
        let a2 = md5_hex(&format!("{method}:{}", parts["uri"]));
        md5_hex(&format!(
            "{a1}:{}:{}:{}:{}:{a2}",
            parts["nonce"], parts["nc"], parts["cnonce"], parts["qop"]
        ))
    }
}

impl Authentication for DigestAuthentication {
    fn login(&self, req: &Request) -> bool {
        let Some(parts) = req.header("Authorization").and_then(Self::parts) else {
            return false;
        };
        let Some(password) = self.users.get(parts["username"]) else {
            return false;
        };
        parts["response"] == self.expected_response(&parts, req.method().as_str(), password)
    }

    fn challenge(&self) -> String {
        format!(
            "Digest realm=\"{}\",qop=\"auth\",nonce=\"{}\",opaque=\"{}\"",
            self.realm,
            self.nonce,
            md5_hex(&self.realm)
        )
    }
}

impl Middleware for DigestAuthentication {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        self.authenticate(req, res, next)
    }
}
