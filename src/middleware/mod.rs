//! Built-in middleware.
//!
//! Each unit here does one negotiation or gatekeeping job and records what it
//! found in the request attributes under one of the [`keys`](crate::request::keys),
//! where the router and route targets pick it up:
//!
//! | unit                   | attribute  | after `next`                      |
//! |------------------------|------------|-----------------------------------|
//! | [`BaseUrl`]            | `BASE_URL` | cookie defaults (domain, path, …) |
//! | [`IpDetector`]         | `IP`       |                                   |
//! | [`LanguageDetector`]   | `LANGUAGE` | `Content-Language` when missing   |
//! | [`FormatDetection`]    | `FORMAT`   | `Content-Type` when missing       |
//!
//! [`BasicAuthentication`] and [`DigestAuthentication`] stop the stack with a
//! `401` challenge unless the request carries valid credentials.

mod auth;
mod base_url;
mod format;
pub mod formats;
mod ip;
mod language;

pub use auth::{Authentication, BasicAuthentication, DigestAuthentication};
pub use base_url::BaseUrl;
pub use format::FormatDetection;
pub use ip::IpDetector;
pub use language::LanguageDetector;

/// One entry of a comma-separated header such as `Accept` or `Accept-Language`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderItem {
    pub value: String,
    pub params: Vec<(String, String)>,
    /// The `q` parameter, `1.0` when absent or malformed.
    pub quality: f32,
}

/// Splits an `Accept`-style header into its items, best quality first.
///
/// Items of equal quality keep the order they were sent in.
///
/// ```rust
/// use layover::middleware::parse_header_list;
///
/// let items = parse_header_list("es;q=0.8, gl-es, en;q=0.7");
/// let values: Vec<_> = items.iter().map(|i| i.value.as_str()).collect();
/// assert_eq!(values, ["gl-es", "es", "en"]);
/// ```
pub fn parse_header_list(header: &str) -> Vec<HeaderItem> {
    let mut items: Vec<HeaderItem> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';').map(str::trim);
            let value = pieces.next().filter(|v| !v.is_empty())?.to_owned();
            let params: Vec<(String, String)> = pieces
                .filter_map(|p| p.split_once('='))
                .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_owned()))
                .collect();
            let quality = params
                .iter()
                .find(|(k, _)| k == "q")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(1.0);
            Some(HeaderItem { value, params, quality })
        })
        .collect();

    items.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_are_kept_per_item() {
        let items = parse_header_list("text/html;level=1;q=0.5, */*");
        assert_eq!(items[0].value, "*/*");
        assert_eq!(items[1].value, "text/html");
        assert_eq!(items[1].params[0], ("level".to_owned(), "1".to_owned()));
        assert_eq!(items[1].quality, 0.5);
    }

    #[test]
    fn empty_entries_are_skipped() {
        assert!(parse_header_list("").is_empty());
        assert_eq!(parse_header_list(" , en").len(), 1);
    }
}
