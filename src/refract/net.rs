use std::{borrow::Cow, net::SocketAddr};

use anyhow::Context;

/// Normalize a bind/listen address.
///
/// The `":PORT"` shorthand means "bind on all interfaces". `SocketAddr`
/// parsing and the Tokio bind APIs reject it, so expand it to `"0.0.0.0:PORT"`.
pub fn normalize_bind_addr(addr: &str) -> Cow<'_, str> {
    let addr = addr.trim();
    if addr.starts_with(':') {
        Cow::Owned(format!("0.0.0.0{addr}"))
    } else {
        Cow::Borrowed(addr)
    }
}

/// Resolve a `host:port` string to one socket address.
///
/// Literal addresses parse without touching the resolver; names go through
/// `lookup_host` and the first result wins. Callers get a typed address or
/// an error, never a raw string to slice up.
pub async fn resolve_addr(addr: &str) -> anyhow::Result<SocketAddr> {
    let addr = addr.trim();
    if let Ok(sa) = addr.parse::<SocketAddr>() {
        return Ok(sa);
    }
    let mut it = tokio::net::lookup_host(addr)
        .await
        .with_context(|| format!("net: resolve {addr:?}"))?;
    it.next()
        .with_context(|| format!("net: no addresses for {addr:?}"))
}
