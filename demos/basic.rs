//! A small site wired from a TOML route file, a controller and the built-in
//! middleware.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic

use layover::middleware::{BaseUrl, FormatDetection, IpDetector, LanguageDetector};
use layover::router::{Controller, Namespace, RouteTable, Router, Target, Urls};
use layover::{HttpError, Next, Request, Response, Result, Stack, keys};

const ROUTES: &str = r#"
error = "Errors::show"

[[routes]]
name = "index"
path = "/"
target = "Pages::index"

[[routes]]
name = "post"
path = "/posts/{id}"
filters = { id = "[0-9]+" }
method = ["GET", "HEAD"]
target = "Posts::show"
"#;

struct Posts {
    id: u64,
}

impl Controller for Posts {
    fn new(req: &mut Request, _: &mut Response, _: &mut Next) -> Result<Self> {
        let id = req
            .param("id")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| HttpError::with_status(400, "Bad post id"))?;
        Ok(Self { id })
    }
}

impl Posts {
    fn show(&self, req: &mut Request, _: &mut Response) -> Result<String> {
        if self.id > 100 {
            return Err(HttpError::not_found().into());
        }
        let urls = req.attributes().get::<Urls>(keys::URLS).cloned();
        let home = match urls {
            Some(urls) => urls.url_for("index", &[])?,
            None => "/".to_owned(),
        };
        Ok(format!("Post #{} (back to {home})", self.id))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let namespace = Namespace::new()
        .with("Pages::index", Target::function(|req, _, _| {
            Ok(format!("Hello from {}", req.language().unwrap_or("nowhere")))
        }))
        .with("Posts::show", Target::method(Posts::show))
        .with("Errors::show", Target::function(|req, _, _| {
            let error = req.attributes().get::<HttpError>(keys::ERROR).cloned();
            Ok(error.map(|e| format!("Error {}: {}", e.status(), e.message())))
        }));

    let routes = RouteTable::from_toml(ROUTES, namespace)?;

    let app = Stack::new()
        .with(BaseUrl::parse("http://localhost:3000/blog")?)
        .with(IpDetector)
        .with(LanguageDetector::with_available(["en", "gl"]))
        .with(FormatDetection::new())
        .with(Router::new(routes));

    for url in [
        "http://localhost:3000/blog/",
        "http://localhost:3000/blog/posts/7",
        "http://localhost:3000/blog/posts/700",
        "http://localhost:3000/elsewhere",
    ] {
        let mut req = Request::get(url)?
            .with_header("Accept-Language", "gl-ES, en;q=0.5")
            .with_header("X-Forwarded-For", "203.0.113.9");
        let mut res = Response::new();

        app.run(&mut req, &mut res)?;
        res.prepare(&req);

        println!("GET {url} -> {} {}", res.status(), res.reason());
        for (name, values) in res.headers().iter() {
            println!("  {name}: {}", values.join(", "));
        }
        println!("  {}\n", res.body().text());
    }

    Ok(())
}
