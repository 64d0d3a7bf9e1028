// SPDX-License-Identifier: GPL-3.0-only

//! Barcode decoding seam
//!
//! [`Decoder`] is the single-method capability the scan loop polls once per
//! tick. Any concrete decoding library can sit behind it; the crate ships a
//! dependency-free EAN-13 scanline decoder as the default.

pub mod ean13;
pub mod scheduler;

pub use ean13::Ean13Decoder;
pub use scheduler::{DecodeScheduler, SchedulerEvent};

use crate::backends::camera::CameraFrame;
use std::time::Instant;

/// Text read from one frame, consumed immediately and never stored
#[derive(Debug, Clone)]
pub struct RawDecodeResult {
    /// The decoded symbol text
    pub text: String,
    /// When the source frame was grabbed
    pub captured_at: Instant,
}

/// One-shot barcode read attempt against a single frame.
///
/// `None` is the expected outcome on most ticks (no barcode in view), not
/// an error. Implementations are called at the polling cadence and should
/// stay well under one tick interval per attempt.
pub trait Decoder: Send {
    fn attempt(&mut self, frame: &CameraFrame) -> Option<RawDecodeResult>;
}

/// Factory for decoders, invoked once per session start
pub type DecoderFactory = Box<dyn FnMut() -> Box<dyn Decoder> + Send>;
