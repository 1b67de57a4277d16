//! Passive-listener port allocation from a configured [`PortRange`].

use std::io;
use std::net::{IpAddr, SocketAddr};

use core::settings::PortRange;
use rand::Rng;
use tokio::net::TcpListener;

/// Binds a passive-mode listener on `local_ip`.
///
/// With no `range`, binds an OS-assigned ephemeral port. With a `range`,
/// tries up to `range.bind_attempts()` uniformly random ports within it
/// before giving up; this matches real-world passive allocators, which must
/// tolerate other processes (or other sessions of this same server) already
/// holding nearby ports in a shared range.
pub async fn bind_passive_listener(
    local_ip: IpAddr,
    range: Option<PortRange>,
) -> io::Result<TcpListener> {
    let Some(range) = range else {
        return TcpListener::bind(SocketAddr::new(local_ip, 0)).await;
    };

    let attempts = range.bind_attempts();
    let mut last_err = None;
    for _ in 0..attempts {
        let port = {
            let mut rng = rand::thread_rng();
            rng.gen_range(range.start..=range.end)
        };
        match TcpListener::bind(SocketAddr::new(local_ip, port)).await {
            Ok(listener) => return Ok(listener),
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrInUse, "could not find any free port")
    }))
}
