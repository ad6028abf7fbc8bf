//! Client address from proxy headers.
//!
//! Behind nginx or a Kubernetes ingress the socket peer is the proxy, not the
//! client. The first of these headers that is present supplies the address,
//! provided it parses as an IP:
//!
//! 1. `True-Client-IP`
//! 2. `X-Real-IP`
//! 3. `X-Forwarded-For` (left-most entry)
//!
//! Only enable this when every request really does come through a proxy you
//! control; otherwise clients can spoof their address.

use std::net::IpAddr;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

#[derive(Clone, Copy, Debug, Default)]
pub struct RealIp;

impl Middleware for RealIp {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture {
        if let Some(ip) = client_ip(&req) {
            req.set_remote_addr(ip.to_string());
        }
        Box::pin(next.run(req))
    }
}

fn client_ip(req: &Request) -> Option<IpAddr> {
    let forwarded_for = || {
        req.header("x-forwarded-for")
            .and_then(|list| list.split(',').next())
    };

    req.header("true-client-ip")
        .or_else(|| req.header("x-real-ip"))
        .or_else(forwarded_for)
        .and_then(|raw| raw.trim().parse().ok())
}
