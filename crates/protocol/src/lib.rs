#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `protocol` is the part of this workspace that understands FTP control-channel
//! *text*: the line-based [`wire`] codec, the [`ascii`] line-ending converter used
//! by `TYPE A` transfers, and the static [`commands`] registry the connection
//! state machine dispatches against.
//!
//! This crate knows nothing about sockets beyond `AsyncRead`/`AsyncWrite`, and
//! nothing about the filesystem; `daemon` wires this together with `core`'s
//! driver traits and `transport`'s data channels.

pub mod ascii;
pub mod commands;
pub mod wire;

pub use ascii::{AsciiConverter, AsciiMode};
pub use commands::{CommandDescriptor, lookup};
pub use wire::{
    MAX_COMMAND_LINE, ParsedCommand, read_command_line, write_multiline_reply, write_reply,
};
