#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the streaming digest primitives behind the server's
//! `HASH`, `XCRC`, `XMD5`, `XSHA1`, `XSHA256` and `XSHA512` commands. Every
//! algorithm exposes the same `new`/`update`/`finalize` shape through
//! [`strong::StrongDigest`] so the daemon crate can select an algorithm at
//! runtime (via `OPTS HASH`) without matching on a concrete hasher type.
//!
//! # Design
//!
//! [`strong`] holds one module per supported algorithm: CRC-32, MD5, SHA-1,
//! SHA-256 and SHA-512. CRC-32 lives alongside the cryptographic digests
//! because `XCRC` is part of the same legacy command family even though it
//! predates the others and is not cryptographically strong.
//!
//! # Invariants
//!
//! - Every hasher streams data incrementally and never panics; callers only
//!   ever observe a finished digest through `finalize`.
//! - `finalize` consumes the hasher, preventing a caller from accidentally
//!   reusing stale digest state for a second file.
//!
//! # Examples
//!
//! ```
//! use checksums::strong::Sha256;
//!
//! let mut hasher = Sha256::new();
//! hasher.update(b"hello");
//! let digest = hasher.finalize();
//! assert_eq!(digest.len(), 32);
//! ```

pub mod strong;
