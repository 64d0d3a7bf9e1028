// SPDX-License-Identifier: GPL-3.0-only

//! bookscan - camera-driven ISBN barcode capture
//!
//! Continuously scans physical book barcodes and accumulates a validated,
//! deduplicated, ordered set of ISBNs for later batch processing (e.g.
//! bulk library import).
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: The controller state machine, item store, and notice hub
//! - [`backends`]: Camera and audio backend abstraction
//! - [`decode`]: The decoder seam, the built-in EAN-13 decoder, and the
//!   polling scheduler
//! - [`isbn`]: Raw text to normalized ISBN mapping
//! - [`config`]: User configuration handling
//!
//! The host drives everything through
//! [`ScanSessionController`](session::ScanSessionController); the finished
//! ISBN list leaves the subsystem through its completion callback.

pub mod backends;
pub mod config;
pub mod decode;
pub mod errors;
pub mod isbn;
pub mod session;

// Re-export commonly used types
pub use backends::camera::{CameraBackend, CameraConstraints, CameraFrame, CameraLifecycle};
pub use config::Config;
pub use decode::{Decoder, Ean13Decoder, RawDecodeResult};
pub use errors::{CameraError, ScanError, ScanResult, SessionError};
pub use isbn::RejectReason;
pub use session::{
    NoticeHub, ScanSessionController, ScannedItem, SessionNotice, SessionStatus, SubmitOutcome,
};
