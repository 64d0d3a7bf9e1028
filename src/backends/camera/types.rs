// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// A single grayscale frame grabbed from a camera.
///
/// Pixel data is 8-bit luma, row-major, `width * height` bytes. Frames are
/// ephemeral: they are handed to the decoder once per tick and dropped.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Luma bytes, row-major, no stride padding
    pub data: Arc<[u8]>,
    /// When the frame was grabbed
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Create a frame from raw luma bytes.
    ///
    /// Returns `None` if `data.len() != width * height`.
    pub fn from_luma(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            captured_at: Instant::now(),
        })
    }

    /// One row of luma bytes
    pub fn row(&self, y: u32) -> &[u8] {
        let start = (y as usize) * (self.width as usize);
        &self.data[start..start + self.width as usize]
    }
}

/// Requested capture parameters for acquiring a camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConstraints {
    /// Device path (e.g. `/dev/video0`); `None` picks the first device
    pub device_path: Option<String>,
    /// Requested frame width (the driver may adjust)
    pub width: u32,
    /// Requested frame height (the driver may adjust)
    pub height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            device_path: None,
            width: 640,
            height: 480,
        }
    }
}

/// A capture device discovered by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human-readable device name
    pub name: String,
    /// Device path (e.g. `/dev/video0`)
    pub path: String,
}
