use crate::error::Result;
use crate::handler::Middleware;
use crate::request::{Request, keys};
use crate::response::Response;
use crate::stack::Next;

use super::{formats, parse_header_list};

const DEFAULT_FORMAT: &str = "html";

/// Decides the response format from the URL extension or the `Accept` header.
///
/// The extension wins when it names an available format; otherwise the
/// `Accept` entries are tried best quality first. Falls back to `html`.
#[derive(Clone, Debug)]
pub struct FormatDetection {
    available: Vec<String>,
}

impl Default for FormatDetection {
    fn default() -> Self {
        Self { available: formats::all().map(str::to_owned).collect() }
    }
}

impl FormatDetection {
    /// Accepts every format in [`formats`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_available<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { available: formats.into_iter().map(|f| f.as_ref().to_ascii_lowercase()).collect() }
    }

    fn is_available(&self, format: &str) -> bool {
        self.available.iter().any(|f| f == format)
    }

    pub fn detect(&self, req: &Request) -> String {
        if let Some(ext) = req.url().extension().filter(|e| self.is_available(e)) {
            return ext;
        }

        req.header("Accept")
            .map(parse_header_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|item| formats::format_for_mime(&item.value))
            .find(|format| self.is_available(format))
            .unwrap_or(DEFAULT_FORMAT)
            .to_owned()
    }
}

impl Middleware for FormatDetection {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        let format = self.detect(req);
        req.attributes_mut().set(keys::FORMAT, format.clone());

        next.run(req, res)?;

        if !res.headers().has("Content-Type") {
            if let Some(mime) = formats::mime_type(&format) {
                res.headers_mut().set("Content-Type", format!("{mime}; charset=UTF-8"));
            }
        }
        Ok(())
    }
}
