#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `transport` owns the FTP *data* connection: passive-mode listeners,
//! active-mode dialing, and the TLS wrapping both can be put through. It
//! knows nothing about FTP commands or the filesystem; `daemon` drives this
//! crate from its `PASV`/`PORT`/`EPSV`/`EPRT` handlers and hands the
//! resulting stream to its transfer-related command handlers.

pub mod active;
pub mod handler;
pub mod passive;
pub mod portrange;
pub mod tls;

pub use active::ActiveTransferHandler;
pub use handler::{DataStream, TransferHandler};
pub use passive::PassiveTransferHandler;
pub use tls::{TlsAcceptor, TlsProvider};
