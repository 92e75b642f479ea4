use crate::error::Result;
use crate::handler::Middleware;
use crate::request::{Request, keys};
use crate::response::Response;
use crate::stack::Next;

use super::parse_header_list;

/// Picks the client's preferred language from `Accept-Language`.
///
/// Languages are reduced to their two-letter primary code (`gl-ES` → `gl`).
/// With a list of available languages, the first requested one that is
/// available wins, falling back to the first available language.
#[derive(Clone, Debug, Default)]
pub struct LanguageDetector {
    available: Vec<String>,
}

impl LanguageDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_available<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { available: languages.into_iter().filter_map(|l| primary_code(l.as_ref())).collect() }
    }

    /// The language to use for `req`, if any can be decided.
    pub fn detect(&self, req: &Request) -> Option<String> {
        let requested: Vec<String> = req
            .header("Accept-Language")
            .map(parse_header_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|item| primary_code(&item.value))
            .collect();

        if self.available.is_empty() {
            return requested.into_iter().next();
        }

        requested
            .into_iter()
            .find(|lang| self.available.contains(lang))
            .or_else(|| self.available.first().cloned())
    }
}

fn primary_code(tag: &str) -> Option<String> {
    let code = tag.trim().get(..2)?;
    code.chars()
        .all(|c| c.is_ascii_alphabetic())
        .then(|| code.to_ascii_lowercase())
}

impl Middleware for LanguageDetector {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        let language = self.detect(req);

        if let Some(language) = &language {
            req.attributes_mut().set(keys::LANGUAGE, language.clone());
        }

        next.run(req, res)?;

        if let Some(language) = language {
            if !res.headers().has("Content-Language") {
                res.headers_mut().set("Content-Language", language);
            }
        }
        Ok(())
    }
}
