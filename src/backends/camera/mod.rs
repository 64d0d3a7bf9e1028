// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! A [`CameraBackend`] owns the actual capture device; [`CameraLifecycle`]
//! wraps one behind scoped acquire/release discipline so that every
//! acquisition on any path is matched by exactly one release.
//!
//! ```text
//! ┌──────────────────────┐
//! │ ScanSessionController│
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │   CameraLifecycle    │  ← acquire/release pairing, shared with the
//! └──────────┬───────────┘    decode loop thread
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │  CameraBackend trait │  ← common interface
//! └──────────┬───────────┘
//!            │
//!            ▼
//!        ┌───────┐
//!        │ V4L2  │  ← concrete implementation
//!        └───────┘
//! ```

pub mod lifecycle;
pub mod types;
pub mod v4l2;

pub use lifecycle::{CameraLifecycle, LifecycleStats};
pub use types::*;

use crate::errors::CameraError;

/// Camera backend trait
///
/// All camera backends provide device enumeration, open/close lifecycle,
/// and frame grabbing. `close` must be idempotent and safe to call even
/// when `open` never succeeded.
pub trait CameraBackend: Send {
    /// Enumerate capture devices available on this backend
    fn enumerate(&self) -> Vec<CameraDevice>;

    /// Open the device described by the constraints and start streaming
    ///
    /// On failure the backend must be left closed; the caller does not
    /// retry automatically.
    fn open(&mut self, constraints: &CameraConstraints) -> Result<(), CameraError>;

    /// Stop streaming and release the device. Idempotent.
    fn close(&mut self);

    /// Whether the device is currently open
    fn is_open(&self) -> bool;

    /// Grab the next frame from the live stream
    fn grab_frame(&mut self) -> Result<CameraFrame, CameraError>;
}

/// Create the default backend for this platform
pub fn default_backend() -> Box<dyn CameraBackend> {
    Box::new(v4l2::V4l2Backend::new())
}
