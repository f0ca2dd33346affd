//! The forwarding engine: TCP splice loop and UDP session relay.
//!
//! Both forwarders sit between a local listen address and one fixed remote
//! ("tunnel") address. TCP is a plain accept-dial-splice pipeline. UDP is a
//! single-socket relay that classifies every datagram by sender: traffic from
//! the tunnel is re-emitted verbatim, traffic from anyone else is treated as
//! a Session Frame and redirected to the address embedded in it.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream, UdpSocket};

use crate::refract::{frame, net};

/// Run the forwarder for `transport`, relaying between `listen_addr` and the
/// fixed `upstream_addr` tunnel endpoint.
///
/// Blocks until the selected forwarder hits a fatal error (bind failure,
/// accept failure, socket read failure, or a UDP send failure); the error is
/// the return value. Per-connection and per-datagram failures are logged and
/// survived.
pub async fn forward(
    transport: &str,
    listen_addr: &str,
    upstream_addr: &str,
) -> anyhow::Result<()> {
    match transport {
        "tcp" => serve_tcp(listen_addr, upstream_addr).await,
        "udp" => serve_udp(listen_addr, upstream_addr).await,
        other => anyhow::bail!("unsupported transport {other:?} (expected \"tcp\" or \"udp\")"),
    }
}

async fn serve_tcp(listen_addr: &str, upstream_addr: &str) -> anyhow::Result<()> {
    let bind_addr = net::normalize_bind_addr(listen_addr);
    let ln = TcpListener::bind(bind_addr.as_ref())
        .await
        .with_context(|| format!("bind tcp {listen_addr}"))?;

    tracing::info!(listen_addr = %listen_addr, upstream = %upstream_addr, "tcp: listening");

    accept_loop(ln, upstream_addr.to_string()).await
}

async fn accept_loop(ln: TcpListener, upstream: String) -> anyhow::Result<()> {
    loop {
        let (conn, peer) = ln.accept().await.context("tcp: accept")?;
        let upstream = upstream.clone();

        // One task per connection, unbounded fan-out. No state crosses
        // connection boundaries, so nothing here needs synchronization.
        tokio::spawn(async move {
            if tracing::enabled!(tracing::Level::DEBUG) {
                tracing::debug!(client = %peer, "tcp: accepted");
            }
            handle_conn(conn, peer, &upstream).await;
        });
    }
}

async fn handle_conn(conn: TcpStream, peer: SocketAddr, upstream: &str) {
    // Fresh dial per connection, no reuse. A failed dial drops this client
    // and nothing else; no retry.
    let up = match TcpStream::connect(upstream).await {
        Ok(up) => up,
        Err(err) => {
            tracing::warn!(client = %peer, upstream = %upstream, err = %err, "tcp: upstream dial failed");
            return;
        }
    };

    if let Err(err) = splice(conn, up).await {
        tracing::debug!(client = %peer, err = %err, "tcp: session ended with error");
    }
}

/// Copy bytes both ways until either direction finishes.
///
/// Returns as soon as one side reaches EOF or errors; dropping the halves
/// closes both sockets, which unwinds the opposite direction shortly after.
async fn splice(client: TcpStream, upstream: TcpStream) -> std::io::Result<()> {
    let (mut client_rd, mut client_wr) = client.into_split();
    let (mut upstream_rd, mut upstream_wr) = upstream.into_split();

    tokio::select! {
        res = tokio::io::copy(&mut client_rd, &mut upstream_wr) => res.map(|_| ()),
        res = tokio::io::copy(&mut upstream_rd, &mut client_wr) => res.map(|_| ()),
    }
}

async fn serve_udp(listen_addr: &str, upstream_addr: &str) -> anyhow::Result<()> {
    let tunnel = net::resolve_addr(upstream_addr).await?;

    let bind_addr = net::normalize_bind_addr(listen_addr);
    let sock = UdpSocket::bind(bind_addr.as_ref())
        .await
        .with_context(|| format!("bind udp {listen_addr}"))?;

    tracing::info!(listen_addr = %listen_addr, tunnel = %tunnel, "udp: listening");

    relay_loop(sock, tunnel).await
}

/// Sequential per-datagram relay over one shared socket.
///
/// The "session" is reconstructed per packet from the sender address alone;
/// the relay keeps no state between iterations.
async fn relay_loop(sock: UdpSocket, tunnel: SocketAddr) -> anyhow::Result<()> {
    let mut buf = vec![0u8; frame::MAX_DATAGRAM_LEN];
    loop {
        let (n, src) = sock.recv_from(&mut buf).await.context("udp: recv")?;

        if src == tunnel {
            // Tunnel-originated traffic is already fully addressed; re-emit
            // it on the tunnel channel untouched.
            sock.send_to(&buf[..n], tunnel)
                .await
                .context("udp: send to tunnel")?;
            continue;
        }

        // Client-originated: the return address rides inside the datagram.
        let (addr, payload) = match frame::decode(&buf[..n]) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(src = %src, err = %err, "udp: dropped malformed frame");
                continue;
            }
        };
        let dest = match net::resolve_addr(addr).await {
            Ok(d) => d,
            Err(err) => {
                tracing::warn!(src = %src, addr = %addr, err = %err, "udp: dropped frame with unresolvable address");
                continue;
            }
        };

        // A send failure here takes the whole relay down, matching the
        // resolution-failure/send-failure split in the error contract.
        sock.send_to(payload, dest)
            .await
            .with_context(|| format!("udp: send to client {dest}"))?;
    }
}
