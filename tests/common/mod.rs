#![allow(dead_code)]

use layover::{Request, Response, Stack};

/// Installs a subscriber that prints through the test harness. Safe to call
/// from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn request(method: &str, url: &str) -> Request {
    Request::parse(method, url).unwrap()
}

/// Runs `stack` and returns the request (with the attributes the stack left
/// on it) next to the response.
pub fn run(stack: &Stack, mut req: Request) -> (Request, Response) {
    let mut res = Response::new();
    stack.run(&mut req, &mut res).unwrap();
    (req, res)
}

pub fn body(res: &Response) -> String {
    res.body().text().into_owned()
}
