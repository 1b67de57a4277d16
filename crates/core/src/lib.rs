#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `core` defines the boundary between the FTP control/data-channel
//! machinery (in `protocol`/`transport`/`daemon`) and the host application:
//! the [`Driver`] trait surface a host implements, [`Settings`] describing a
//! server instance, the FTP status-code vocabulary in [`status`], and the
//! typed [`error::FtpError`] that every fallible operation in this workspace
//! eventually collapses into.
//!
//! This crate has no knowledge of sockets. Everything here is synchronous
//! data and trait definitions; `daemon` is where connections actually run.

pub mod context;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod settings;
pub mod status;

pub use context::{ClientContext, Extra};
pub use driver::{Driver, FileSystem, TransferHandle};
pub use error::{DriverErrorKind, FtpError};
pub use metadata::{Fileinfo, Metadata, Permissions};
pub use settings::{ConnectionCheck, PortRange, Settings, TlsRequirement, TransferType};
