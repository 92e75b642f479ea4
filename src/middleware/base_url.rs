use crate::cookies::CookieDefaults;
use crate::error::Result;
use crate::handler::Middleware;
use crate::request::{Request, keys};
use crate::response::Response;
use crate::stack::Next;
use crate::url::Url;

/// Declares the URL the application is mounted at.
///
/// Routers further down the stack match and generate paths relative to it,
/// and cookies set on the way are scoped to its host and path.
#[derive(Clone, Debug)]
pub struct BaseUrl {
    url: Url,
}

impl BaseUrl {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(url: &str) -> Result<Self> {
        Ok(Self::new(url.parse()?))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn cookie_defaults(&self) -> CookieDefaults {
        CookieDefaults {
            path: Some(self.url.path().to_owned()),
            domain: self.url.host().map(str::to_owned),
            secure: Some(self.url.scheme() == Some("https")),
            httponly: Some(true),
        }
    }
}

impl Middleware for BaseUrl {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        req.attributes_mut().set(keys::BASE_URL, self.url.clone());
        next.run(req, res)?;
        res.cookies_mut().apply_defaults(&self.cookie_defaults());
        Ok(())
    }
}
