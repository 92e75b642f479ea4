//! Outgoing HTTP response type and the [`IntoReply`] conversion trait.
//!
//! A single [`Response`] travels through the whole stack by mutable
//! reference: middleware can set headers before calling `next`, the route
//! target writes the body, and middleware can inspect or amend the result on
//! the way back out.

use chrono::Utc;
use http::StatusCode;

use crate::body::Body;
use crate::cookies::Cookies;
use crate::error::{Error, Result};
use crate::headers::Headers;
use crate::method::Method;
use crate::middleware::formats;
use crate::request::Request;

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use layover::Response;
///
/// let mut res = Response::new();
/// assert_eq!(res.status(), 200);
/// assert_eq!(res.reason(), "OK");
///
/// res.set_status(404).unwrap();
/// res.write("Not here").unwrap();
/// assert_eq!(res.reason(), "Not Found");
/// assert_eq!(res.body().text(), "Not here");
///
/// assert!(res.set_status(1000).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    reason: String,
    headers: Headers,
    body: Body,
    cookies: Cookies,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            reason: reason_phrase(StatusCode::OK).to_owned(),
            headers: Headers::new(),
            body: Body::new(),
            cookies: Cookies::new(),
        }
    }
}

impl Response {
    /// `200 OK` with an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        let mut res = Self { body: Body::from(body.into()), ..Self::default() };
        res.headers.set("Content-Type", "text/plain; charset=utf-8");
        res
    }

    /// `200 OK` with `application/json`. Pass the bytes from your serialiser.
    pub fn json(body: Vec<u8>) -> Self {
        let mut res = Self { body: Body::from(body), ..Self::default() };
        res.headers.set("Content-Type", "application/json");
        res
    }

    /// An empty response with the given status.
    pub fn with_status(code: u16) -> Result<Self> {
        let mut res = Self::default();
        res.set_status(code)?;
        Ok(res)
    }

    pub fn status(&self) -> u16 { self.status.as_u16() }
    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn reason(&self) -> &str { &self.reason }
    pub fn headers(&self) -> &Headers { &self.headers }
    pub fn body(&self) -> &Body { &self.body }
    pub fn cookies(&self) -> &Cookies { &self.cookies }

    pub fn headers_mut(&mut self) -> &mut Headers { &mut self.headers }
    pub fn body_mut(&mut self) -> &mut Body { &mut self.body }
    pub fn cookies_mut(&mut self) -> &mut Cookies { &mut self.cookies }

    /// Sets the status and its standard reason phrase (empty when the code
    /// has none).
    pub fn set_status(&mut self, code: u16) -> Result<()> {
        let status = StatusCode::from_u16(code).map_err(|_| Error::InvalidStatus(code))?;
        self.status = status;
        self.reason = reason_phrase(status).to_owned();
        Ok(())
    }

    /// Sets the status with a custom reason phrase.
    pub fn set_status_with_reason(&mut self, code: u16, reason: impl Into<String>) -> Result<()> {
        self.set_status(code)?;
        self.reason = reason.into();
        Ok(())
    }

    /// Points the client at `url` (`302` unless another status is given).
    pub fn redirect(&mut self, url: impl Into<String>, status: Option<u16>) -> Result<()> {
        self.set_status(status.unwrap_or(302))?;
        self.headers.set("Location", url);
        Ok(())
    }

    /// Writes to the body at its cursor.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        self.body.write(data)?;
        Ok(())
    }

    /// Finalises the response for `request` before it is handed to the transport.
    ///
    /// - `Content-Type` from the request format, when not already set
    /// - `Content-Language` from the detected language, when not already set
    /// - `Content-Length` dropped when `Transfer-Encoding` is present
    /// - `Date` set to now, when not already set
    /// - cookies rendered into `Set-Cookie` headers
    /// - body emptied for `HEAD` requests
    pub fn prepare(&mut self, request: &Request) {
        if !self.headers.has("Content-Type") {
            if let Some(mime) = formats::mime_type(&request.format()) {
                self.headers.set("Content-Type", format!("{mime}; charset=UTF-8"));
            }
        }

        if !self.headers.has("Content-Language") {
            if let Some(language) = request.language() {
                self.headers.set("Content-Language", language);
            }
        }

        if self.headers.has("Transfer-Encoding") {
            self.headers.remove("Content-Length");
        }

        if !self.headers.has("Date") {
            self.headers.set("Date", Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        }

        if !self.cookies.is_empty() {
            self.headers.remove("Set-Cookie");
            for value in self.cookies.header_values() {
                self.headers.append("Set-Cookie", value);
            }
        }

        if request.method() == Method::Head {
            self.body.clear();
        }
    }
}

fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

// ── IntoReply ────────────────────────────────────────────────────────────────

/// What a route target hands back to the router.
///
/// Text and bytes are appended to the response body after anything the
/// target already wrote. A whole [`Response`] replaces the working one.
#[derive(Debug, Default)]
pub enum Reply {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Response(Response),
}

/// Conversion into a [`Reply`].
///
/// Implement on your own types to return them directly from route targets:
///
/// ```rust,ignore
/// struct Json<T: Serialize>(T);
///
/// impl<T: Serialize> IntoReply for Json<T> {
///     fn into_reply(self) -> Reply {
///         match serde_json::to_vec(&self.0) {
///             Ok(bytes) => Reply::Response(Response::json(bytes)),
///             Err(_)    => Reply::Empty,
///         }
///     }
/// }
/// ```
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply { self }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply { Reply::Empty }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply { Reply::Bytes(self.as_bytes().to_vec()) }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply { Reply::Bytes(self.into_bytes()) }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Reply { Reply::Bytes(self) }
}

impl IntoReply for Response {
    fn into_reply(self) -> Reply { Reply::Response(self) }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Reply {
        self.map_or(Reply::Empty, IntoReply::into_reply)
    }
}
