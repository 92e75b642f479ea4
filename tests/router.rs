mod common;

use std::sync::Arc;
use std::thread;

use layover::middleware::BaseUrl;
use layover::router::{Controller, Route, RouteConfig, RouteTable, Router, Target, Urls};
use layover::{
    Error, HttpError, Method, Next, Request, Response, Result, Stack, from_fn, keys,
};
use once_cell::sync::OnceCell;

use common::{body, init_tracing, request};

fn error_page() -> Target {
    Target::function(|req, _, _| {
        let error = req
            .attributes()
            .get::<HttpError>(keys::ERROR)
            .cloned()
            .ok_or_else(|| Error::handler("error route without an error"))?;
        Ok(format!("Error {}/{}", error.status(), error.message()))
    })
}

fn urls(req: &Request) -> Result<Urls> {
    req.attributes()
        .get::<Urls>(keys::URLS)
        .cloned()
        .ok_or_else(|| Error::handler("no URLS attribute"))
}

/// The site used by most tests, mounted at `http://domain.com`.
fn site() -> Stack {
    let app: Arc<OnceCell<Stack>> = Arc::new(OnceCell::new());
    let mut routes = RouteTable::new();

    routes
        .map("index", RouteConfig::new("/", Target::function(|_, res, _| res.write("This is the index"))))
        .unwrap();
    routes
        .map(
            "post",
            RouteConfig::new("/post", Target::function(|_, res, _| res.write("This is POST")))
                .method(Method::Post),
        )
        .unwrap();
    routes
        .map(
            "get-post",
            RouteConfig::new("/get/post", Target::function(|_, res, _| res.write("This is GET/POST")))
                .methods([Method::Post, Method::Get]),
        )
        .unwrap();
    routes
        .map(
            "put",
            RouteConfig::new(
                "/put/{id}",
                Target::function(|req, res, _| {
                    res.write(format!("This is PUT/{}", req.param("id").unwrap_or_default()))
                }),
            )
            .filter("id", r"[\d]+")
            .methods([Method::Put]),
        )
        .unwrap();

    let sub = Arc::clone(&app);
    routes
        .map(
            "subrequest",
            RouteConfig::new(
                "/subrequest",
                Target::function(move |req, res, _| {
                    res.write("This is a subrequest: ")?;

                    let route = req.attributes().get::<Arc<Route>>(keys::ROUTE);
                    assert_eq!(route.map(|r| r.name()), Some("subrequest"));

                    let app = sub.get().ok_or_else(|| Error::handler("site not wired"))?;
                    let inner = app.dispatch(Request::parse("POST", "http://domain.com/post")?)?;
                    res.write(inner.body().contents())
                }),
            ),
        )
        .unwrap();
    routes
        .map(
            "error",
            RouteConfig::new(
                "/error",
                Target::function(|_, _, _| -> Result<()> { Err(HttpError::new("This is an error!!").into()) }),
            ),
        )
        .unwrap();
    routes
        .map(
            "routes",
            RouteConfig::new(
                "/routes",
                Target::function(|req, _, _| {
                    let urls = urls(req)?;
                    Ok([
                        urls.url_for("index", &[])?,
                        urls.url_for("post", &[])?,
                        urls.url_for("get-post", &[])?,
                        urls.url_for("put", &[("id", "34")])?,
                        urls.url_for("put", &[("id", "34"), ("name", "oscar")])?,
                    ]
                    .join("\n"))
                }),
            ),
        )
        .unwrap();
    routes.set_error(error_page()).unwrap();

    let stack = Stack::new()
        .with(BaseUrl::parse("http://domain.com").unwrap())
        .with(Router::new(routes));
    let _ = app.set(stack.clone());
    stack
}

fn fetch(stack: &Stack, method: &str, url: &str) -> Response {
    stack.dispatch(request(method, url)).unwrap()
}

#[test]
fn routes_are_matched_by_path_and_method() {
    init_tracing();
    let site = site();

    assert_eq!(body(&fetch(&site, "GET", "http://domain.com")), "This is the index");
    assert_eq!(body(&fetch(&site, "GET", "/")), "This is the index");
    assert_eq!(body(&fetch(&site, "POST", "http://domain.com/post")), "This is POST");
    assert_eq!(body(&fetch(&site, "GET", "http://domain.com/get/post")), "This is GET/POST");
    assert_eq!(body(&fetch(&site, "PUT", "http://domain.com/put/23")), "This is PUT/23");
}

#[test]
fn unmatched_requests_render_the_error_route() {
    init_tracing();
    let site = site();

    let res = fetch(&site, "PUT", "http://domain.com/put/2.3");
    assert_eq!(res.status(), 404);
    assert_eq!(body(&res), "Error 404/Not found");

    let res = fetch(&site, "GET", "http://domain.com/post");
    assert_eq!(res.status(), 404);
    assert_eq!(body(&res), "Error 404/Not found");

    let res = fetch(&site, "GET", "http://other.com/");
    assert_eq!(res.status(), 404);
}

#[test]
fn raised_errors_render_the_error_route() {
    init_tracing();
    let res = fetch(&site(), "GET", "http://domain.com/error");
    assert_eq!(res.status(), 500);
    assert_eq!(res.reason(), "Internal Server Error");
    assert_eq!(body(&res), "Error 500/This is an error!!");
}

#[test]
fn targets_can_dispatch_subrequests() {
    init_tracing();
    let res = fetch(&site(), "GET", "http://domain.com/subrequest");
    assert_eq!(body(&res), "This is a subrequest: This is POST");
}

#[test]
fn targets_generate_urls_for_named_routes() {
    init_tracing();
    let res = fetch(&site(), "GET", "http://domain.com/routes");
    let lines: Vec<String> = body(&res).lines().map(str::to_owned).collect();
    assert_eq!(
        lines,
        [
            "http://domain.com/",
            "http://domain.com/post",
            "http://domain.com/get/post",
            "http://domain.com/put/34",
            "http://domain.com/put/34?name=oscar",
        ]
    );
}

#[test]
fn matched_route_and_params_are_left_on_the_request() {
    init_tracing();
    let (req, _) = common::run(&site(), request("PUT", "http://domain.com/put/23"));

    assert_eq!(req.param("id"), Some("23"));
    let route = req.attributes().get::<Arc<Route>>(keys::ROUTE).unwrap();
    assert_eq!(route.name(), "put");
    assert!(!req.attributes().contains(keys::URLS));
}

#[test]
fn without_error_route_http_errors_propagate() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes.map("index", RouteConfig::new("/", Target::function(|_, _, _| Ok("index")))).unwrap();
    let stack = Stack::new().with(Router::new(routes));

    let err = stack.dispatch(request("GET", "/missing")).unwrap_err();
    let http = err.as_http().unwrap();
    assert_eq!(http.status(), 404);
    assert_eq!(http.message(), "Not found");
}

#[test]
fn other_errors_are_never_routed() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes
        .map(
            "db",
            RouteConfig::new("/db", Target::function(|_, _, _| -> Result<()> { Err(Error::handler("database went away")) })),
        )
        .unwrap();
    routes.set_error(error_page()).unwrap();
    let stack = Stack::new().with(Router::new(routes));

    let err = stack.dispatch(request("GET", "/db")).unwrap_err();
    assert!(err.as_http().is_none());
    assert_eq!(err.to_string(), "database went away");
}

#[test]
fn error_route_replaces_the_partial_body() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes
        .map(
            "secret",
            RouteConfig::new(
                "/secret",
                Target::function(|_, res, _| -> Result<()> {
                    res.write("half of a page")?;
                    Err(HttpError::with_status(403, "Forbidden area").into())
                }),
            ),
        )
        .unwrap();
    routes.set_error(error_page()).unwrap();
    let stack = Stack::new().with(Router::new(routes));

    let res = stack.dispatch(request("GET", "/secret")).unwrap();
    assert_eq!(res.status(), 403);
    assert_eq!(body(&res), "Error 403/Forbidden area");
}

#[test]
fn invalid_error_codes_render_as_500() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes
        .map(
            "odd",
            RouteConfig::new(
                "/odd",
                Target::function(|_, _, _| -> Result<()> { Err(HttpError::with_status(1000, "odd").into()) }),
            ),
        )
        .unwrap();
    routes.set_error(error_page()).unwrap();

    let res = Stack::new().with(Router::new(routes)).dispatch(request("GET", "/odd")).unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(body(&res), "Error 1000/odd");
}

#[test]
fn returned_text_is_appended_after_written_output() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes
        .map(
            "mixed",
            RouteConfig::new(
                "/",
                Target::function(|_, res, _| {
                    res.write("written, ")?;
                    Ok("returned")
                }),
            ),
        )
        .unwrap();

    let res = Stack::new().with(Router::new(routes)).dispatch(request("GET", "/")).unwrap();
    assert_eq!(body(&res), "written, returned");
}

#[test]
fn returned_response_replaces_the_working_one() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes
        .map(
            "created",
            RouteConfig::new(
                "/items",
                Target::function(|_, res, _| {
                    res.write("discarded")?;
                    let mut created = Response::with_status(201)?;
                    created.headers_mut().set("Location", "/items/1");
                    created.write("created")?;
                    Ok(created)
                }),
            )
            .method(Method::Post),
        )
        .unwrap();

    let res = Stack::new().with(Router::new(routes)).dispatch(request("POST", "/items")).unwrap();
    assert_eq!(res.status(), 201);
    assert_eq!(res.headers().get("location"), Some("/items/1"));
    assert_eq!(body(&res), "created");
}

#[test]
fn router_continues_with_the_rest_of_the_stack() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes.map("index", RouteConfig::new("/", Target::function(|_, _, _| Ok("index")))).unwrap();

    let stack = Stack::new()
        .with(Router::new(routes))
        .with(from_fn(|req, res, next| {
            res.write("!")?;
            next.run(req, res)
        }));

    assert_eq!(body(&stack.dispatch(request("GET", "/")).unwrap()), "index!");
}

#[test]
fn nested_stack_target_resumes_the_outer_stack() {
    init_tracing();
    let inner = Stack::new()
        .with(from_fn(|req, res, next| {
            res.write("[inner]")?;
            next.run(req, res)
        }));

    let mut routes = RouteTable::new();
    routes.map("admin", RouteConfig::new("/admin", Target::middleware(inner))).unwrap();

    let stack = Stack::new()
        .with(Router::new(routes))
        .with(from_fn(|req, res, next| {
            res.write("[after]")?;
            next.run(req, res)
        }));

    assert_eq!(body(&stack.dispatch(request("GET", "/admin")).unwrap()), "[inner][after]");
}

#[test]
fn units_after_a_nested_stack_target_still_short_circuit() {
    init_tracing();
    let inner = Stack::new().with(from_fn(|req, res, next| {
        res.write("[inner]")?;
        next.run(req, res)
    }));

    let mut routes = RouteTable::new();
    routes.map("admin", RouteConfig::new("/admin", Target::middleware(inner))).unwrap();
    routes
        .map(
            "open",
            RouteConfig::new("/open", Target::function(|_, res, _| res.write("[open]"))),
        )
        .unwrap();

    let stack = Stack::new()
        .with(Router::new(routes))
        .with(from_fn(|_, res, _| res.write("[stop]")))
        .with(from_fn(|req, res, next| {
            res.write("[never]")?;
            next.run(req, res)
        }));

    assert_eq!(body(&stack.dispatch(request("GET", "/admin")).unwrap()), "[inner][stop]");
    assert_eq!(body(&stack.dispatch(request("GET", "/open")).unwrap()), "[open][stop]");
}

#[test]
fn a_target_that_continues_the_stack_is_not_continued_twice() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes
        .map(
            "eager",
            RouteConfig::new(
                "/eager",
                Target::function(|req, res, next| {
                    res.write("[target]")?;
                    next.run(req, res)?;
                    res.write("[back]")
                }),
            ),
        )
        .unwrap();

    let stack = Stack::new()
        .with(Router::new(routes))
        .with(from_fn(|_, res, _| res.write("[stop]")))
        .with(from_fn(|_, res, _| res.write("[never]")));

    assert_eq!(body(&stack.dispatch(request("GET", "/eager")).unwrap()), "[target][stop][back]");
}

struct Greeter {
    name: String,
}

impl Controller for Greeter {
    fn new(req: &mut Request, _: &mut Response, _: &mut Next) -> Result<Self> {
        let name = req
            .param("name")
            .ok_or_else(|| HttpError::with_status(400, "Who?"))?
            .to_owned();
        Ok(Self { name })
    }
}

impl Greeter {
    fn hello(&self, _: &mut Request, _: &mut Response) -> Result<String> {
        Ok(format!("Hello {}", self.name))
    }
}

#[test]
fn controller_methods_get_a_fresh_controller() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes.map("hello", RouteConfig::new("/hello/{name}", Target::method(Greeter::hello))).unwrap();
    let stack = Stack::new().with(Router::new(routes));

    assert_eq!(body(&stack.dispatch(request("GET", "/hello/oscar")).unwrap()), "Hello oscar");
    assert_eq!(body(&stack.dispatch(request("GET", "/hello/ana")).unwrap()), "Hello ana");
}

#[test]
fn each_dispatch_sees_its_own_base_url() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes
        .map(
            "page",
            RouteConfig::new(
                "/{slug}",
                Target::function(|req, _, _| {
                    let slug = req.param("slug").unwrap_or_default().to_owned();
                    urls(req)?.url_for("page", &[("slug", slug.as_str())])
                }),
            ),
        )
        .unwrap();
    let table = Arc::new(routes);

    let blog = Stack::new()
        .with(BaseUrl::parse("http://domain.com/blog").unwrap())
        .with(Router::shared(Arc::clone(&table)));
    let shop = Stack::new()
        .with(BaseUrl::parse("https://shop.domain.com/store").unwrap())
        .with(Router::shared(Arc::clone(&table)));

    assert_eq!(body(&fetch(&blog, "GET", "http://domain.com/blog/hello")), "http://domain.com/blog/hello");
    assert_eq!(body(&fetch(&shop, "GET", "https://shop.domain.com/store/shoes")), "https://shop.domain.com/store/shoes");
    assert_eq!(body(&fetch(&blog, "GET", "http://domain.com/blog/again")), "http://domain.com/blog/again");

    thread::scope(|scope| {
        let blog = scope.spawn(|| body(&fetch(&blog, "GET", "http://domain.com/blog/a")));
        let shop = scope.spawn(|| body(&fetch(&shop, "GET", "https://shop.domain.com/store/b")));
        assert_eq!(blog.join().unwrap(), "http://domain.com/blog/a");
        assert_eq!(shop.join().unwrap(), "https://shop.domain.com/store/b");
    });
}

#[test]
fn base_path_only_matches_whole_segments() {
    init_tracing();
    let mut routes = RouteTable::new();
    routes
        .map("post", RouteConfig::new("/post", Target::function(|_, _, _| Ok("post"))))
        .unwrap();
    routes
        .map(
            "page",
            RouteConfig::new(
                "/{slug}",
                Target::function(|req, _, _| Ok(format!("slug={}", req.param("slug").unwrap_or_default()))),
            ),
        )
        .unwrap();

    let blog = Stack::new()
        .with(BaseUrl::parse("http://domain.com/blog").unwrap())
        .with(Router::new(routes));

    assert_eq!(body(&fetch(&blog, "GET", "http://domain.com/blog/post")), "post");
    assert_eq!(body(&fetch(&blog, "GET", "http://domain.com/blog/hello")), "slug=hello");

    for url in ["http://domain.com/blogpost", "http://domain.com/bloghello"] {
        let err = blog.dispatch(request("GET", url)).unwrap_err();
        assert_eq!(err.as_http().map(HttpError::status), Some(404), "{url}");
    }
}
