//! Format name ⇄ MIME type table.
//!
//! The first MIME type listed for a format is the one sent in `Content-Type`.

const FORMATS: &[(&str, &[&str])] = &[
    ("atom", &["application/atom+xml"]),
    ("css", &["text/css"]),
    ("html", &["text/html", "application/xhtml+xml"]),
    ("gif", &["image/gif"]),
    ("jpg", &["image/jpeg", "image/jpg"]),
    ("js", &["text/javascript", "application/javascript", "application/x-javascript"]),
    ("jsonp", &["text/javascript", "application/javascript", "application/x-javascript"]),
    ("json", &["application/json", "text/json", "application/x-json"]),
    ("png", &["image/png", "image/x-png"]),
    ("pdf", &["application/pdf", "application/x-download"]),
    ("rdf", &["application/rdf+xml"]),
    ("rss", &["application/rss+xml"]),
    ("txt", &["text/plain"]),
    ("xml", &["text/xml", "application/xml", "application/x-xml"]),
    ("zip", &["application/zip", "application/x-zip", "application/x-zip-compressed"]),
];

/// Every known format name.
pub fn all() -> impl Iterator<Item = &'static str> {
    FORMATS.iter().map(|(name, _)| *name)
}

/// The canonical MIME type of `format`.
pub fn mime_type(format: &str) -> Option<&'static str> {
    FORMATS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(format))
        .and_then(|(_, mimes)| mimes.first().copied())
}

/// The first format that lists `mime`. Parameters such as `charset` are ignored.
pub fn format_for_mime(mime: &str) -> Option<&'static str> {
    let mime = mime.split(';').next().unwrap_or_default().trim();
    FORMATS
        .iter()
        .find(|(_, mimes)| mimes.iter().any(|m| m.eq_ignore_ascii_case(mime)))
        .map(|(name, _)| *name)
}
