#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! This crate does not appear anywhere in the public API the daemon calls
//! through to log: every `daemon`/`transport` event is emitted directly via
//! the `tracing` macros, against whatever subscriber the embedding host has
//! installed. What lives here is convenience for the host: [`init`] sets up
//! a reasonable default subscriber for examples, tests, and simple
//! standalone deployments, and [`connection_span`] names the per-connection
//! span consistently so a host's own subscriber can correlate one session's
//! events.

use tracing::Span;
use tracing_subscriber::EnvFilter;

/// Installs a default [`tracing_subscriber`] formatter honoring `RUST_LOG`
/// (falling back to `info` when unset).
///
/// Intended for examples, tests, and simple standalone binaries; a host
/// embedding this server in a larger application should install its own
/// subscriber instead and skip this entirely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Opens the per-connection span every `daemon` event for this client runs
/// inside, so a subscriber can correlate a whole session by `client_id`.
#[must_use]
pub fn connection_span(client_id: u32, remote_addr: std::net::SocketAddr) -> Span {
    tracing::info_span!("ftp_connection", client_id, %remote_addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_span_carries_client_id() {
        let span = connection_span(7, "127.0.0.1:21".parse().unwrap());
        assert_eq!(span.metadata().unwrap().name(), "ftp_connection");
    }
}
