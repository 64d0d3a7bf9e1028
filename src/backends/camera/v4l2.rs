// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Grabs frames through a memory-mapped capture stream and reduces them to
//! 8-bit luma for the barcode decoder. YUYV is requested first since nearly
//! every UVC webcam offers it and its Y plane is free to extract; GREY is
//! accepted as a fallback.

use super::types::{CameraConstraints, CameraDevice, CameraFrame};
use super::CameraBackend;
use crate::errors::CameraError;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

const FOURCC_YUYV: &[u8; 4] = b"YUYV";
const FOURCC_GREY: &[u8; 4] = b"GREY";

/// State held while the device is streaming
struct OpenStream {
    // The mapped buffers reference the device's fd; keep the device alive
    // for as long as the stream.
    _device: Device,
    stream: MmapStream<'static>,
    width: u32,
    height: u32,
    stride: u32,
    fourcc: FourCC,
}

/// V4L2 implementation of [`CameraBackend`]
pub struct V4l2Backend {
    open: Option<OpenStream>,
}

impl V4l2Backend {
    pub fn new() -> Self {
        Self { open: None }
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for V4l2Backend {
    fn enumerate(&self) -> Vec<CameraDevice> {
        let mut devices: Vec<CameraDevice> = v4l::context::enum_devices()
            .iter()
            .map(|node| CameraDevice {
                name: node.name().unwrap_or_else(|| "Unknown Camera".to_string()),
                path: node.path().to_string_lossy().to_string(),
            })
            .collect();
        devices.sort_by(|a, b| a.path.cmp(&b.path));
        devices
    }

    fn open(&mut self, constraints: &CameraConstraints) -> Result<(), CameraError> {
        if self.open.is_some() {
            return Err(CameraError::DeviceBusy);
        }

        let path = match &constraints.device_path {
            Some(path) => path.clone(),
            None => self
                .enumerate()
                .first()
                .map(|d| d.path.clone())
                .ok_or(CameraError::NoDevice)?,
        };

        info!(
            device = %path,
            width = constraints.width,
            height = constraints.height,
            "Opening camera"
        );

        let device = Device::with_path(&path).map_err(|e| CameraError::from_io(&e))?;

        // Request YUYV, fall back to GREY if the driver refuses.
        let format = Format::new(constraints.width, constraints.height, FourCC::new(FOURCC_YUYV));
        let actual = match device.set_format(&format) {
            Ok(f) => f,
            Err(_) => {
                let format =
                    Format::new(constraints.width, constraints.height, FourCC::new(FOURCC_GREY));
                device.set_format(&format).map_err(|e| CameraError::from_io(&e))?
            }
        };

        if actual.fourcc != FourCC::new(FOURCC_YUYV) && actual.fourcc != FourCC::new(FOURCC_GREY) {
            return Err(CameraError::Unknown(format!(
                "unsupported pixel format {}",
                actual.fourcc
            )));
        }

        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, 4)
            .map_err(|e| CameraError::from_io(&e))?;

        info!(
            device = %path,
            width = actual.width,
            height = actual.height,
            fourcc = %actual.fourcc,
            "Camera streaming"
        );

        self.open = Some(OpenStream {
            _device: device,
            stream,
            width: actual.width,
            height: actual.height,
            stride: actual.stride,
            fourcc: actual.fourcc,
        });
        Ok(())
    }

    fn close(&mut self) {
        if self.open.take().is_some() {
            debug!("Camera closed");
        }
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn grab_frame(&mut self) -> Result<CameraFrame, CameraError> {
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| CameraError::Unknown("camera not open".to_string()))?;

        let (buf, _meta) = open.stream.next().map_err(|e| CameraError::from_io(&e))?;
        let captured_at = Instant::now();

        let luma = if open.fourcc == FourCC::new(FOURCC_YUYV) {
            luma_from_yuyv(buf, open.width, open.height, open.stride)
        } else {
            luma_from_grey(buf, open.width, open.height, open.stride)
        };

        let luma = luma.ok_or_else(|| {
            warn!(len = buf.len(), "Truncated frame buffer");
            CameraError::Unknown("truncated frame buffer".to_string())
        })?;

        let mut frame = CameraFrame::from_luma(open.width, open.height, luma)
            .ok_or_else(|| CameraError::Unknown("frame size mismatch".to_string()))?;
        frame.captured_at = captured_at;
        Ok(frame)
    }
}

/// Extract the Y plane from a packed YUYV buffer.
///
/// Returns `None` if the buffer is shorter than `height` rows of `stride`
/// bytes. A zero stride falls back to the packed row length.
fn luma_from_yuyv(buf: &[u8], width: u32, height: u32, stride: u32) -> Option<Vec<u8>> {
    let width = width as usize;
    let height = height as usize;
    let stride = if stride == 0 { width * 2 } else { stride as usize };

    if buf.len() < height * stride || stride < width * 2 {
        return None;
    }

    let mut luma = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = &buf[y * stride..y * stride + width * 2];
        luma.extend(row.iter().step_by(2));
    }
    Some(luma)
}

/// Copy a GREY buffer, dropping stride padding.
fn luma_from_grey(buf: &[u8], width: u32, height: u32, stride: u32) -> Option<Vec<u8>> {
    let width = width as usize;
    let height = height as usize;
    let stride = if stride == 0 { width } else { stride as usize };

    if buf.len() < height * stride || stride < width {
        return None;
    }

    let mut luma = Vec::with_capacity(width * height);
    for y in 0..height {
        luma.extend_from_slice(&buf[y * stride..y * stride + width]);
    }
    Some(luma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_from_yuyv_strips_chroma() {
        // 2x2 YUYV: Y0 U Y1 V per pixel pair
        let buf = vec![
            10, 128, 20, 128, // row 0
            30, 128, 40, 128, // row 1
        ];
        let luma = luma_from_yuyv(&buf, 2, 2, 4).unwrap();
        assert_eq!(luma, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_luma_from_yuyv_honors_stride_padding() {
        let buf = vec![
            10, 128, 20, 128, 0, 0, // row 0 + 2 padding bytes
            30, 128, 40, 128, 0, 0, // row 1 + 2 padding bytes
        ];
        let luma = luma_from_yuyv(&buf, 2, 2, 6).unwrap();
        assert_eq!(luma, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_luma_from_yuyv_rejects_short_buffer() {
        assert!(luma_from_yuyv(&[0u8; 7], 2, 2, 4).is_none());
    }

    #[test]
    fn test_luma_from_grey_passthrough() {
        let buf = vec![1, 2, 3, 4];
        assert_eq!(luma_from_grey(&buf, 2, 2, 2).unwrap(), vec![1, 2, 3, 4]);
    }
}
