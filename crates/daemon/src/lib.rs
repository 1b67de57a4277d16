#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `daemon` is the embeddable FTP server itself: [`Server`] binds a listener
//! and spawns one [`Connection`] per accepted client; `Connection` reads
//! command lines, dispatches them through [`handlers`], and drives transfers
//! over the data connections `transport` establishes. Everything here talks
//! to the outside world only through `core`'s [`core::driver::Driver`] and
//! [`core::driver::FileSystem`] traits — a host supplies both, plus an
//! optional [`transport::TlsProvider`], and gets a running server back.

pub mod connection;
pub mod handlers;
pub mod path;
pub mod server;
pub mod state;
pub mod timefmt;
pub mod writer;

pub use connection::Connection;
pub use server::{Server, ShutdownHandle};
