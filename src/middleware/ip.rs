use tracing::trace;

use crate::error::Result;
use crate::handler::Middleware;
use crate::request::{Request, keys};
use crate::response::Response;
use crate::stack::Next;

/// Stores the client address from the forwarding headers in the `IP` attribute.
///
/// See [`Request::client_ips`] for the scan order. Nothing is stored when no
/// header carries a valid address.
#[derive(Clone, Copy, Debug, Default)]
pub struct IpDetector;

impl Middleware for IpDetector {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        match req.client_ips().first().copied() {
            Some(ip) => {
                trace!(%ip, "client ip detected");
                req.attributes_mut().set(keys::IP, ip);
            }
            None => {
                req.attributes_mut().remove(keys::IP);
            }
        }
        next.run(req, res)
    }
}
