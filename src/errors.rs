// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scan pipeline

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Top-level error type for the crate
#[derive(Debug, Clone)]
pub enum ScanError {
    /// Camera-related errors
    Camera(CameraError),
    /// Session state machine errors
    Session(SessionError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
///
/// Every variant is fatal to the current session: the controller moves to
/// the error state and the user must explicitly retry. There is no
/// automatic reacquisition.
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Access to the device was denied
    PermissionDenied,
    /// No capture device is present at the requested path
    NoDevice,
    /// The device exists but is held by another process
    DeviceBusy,
    /// Anything the backend could not classify
    Unknown(String),
}

impl CameraError {
    /// Classify an OS-level I/O error from opening or streaming a device.
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EACCES) | Some(libc::EPERM) => CameraError::PermissionDenied,
            Some(libc::ENOENT) | Some(libc::ENODEV) | Some(libc::ENXIO) => CameraError::NoDevice,
            Some(libc::EBUSY) => CameraError::DeviceBusy,
            _ => CameraError::Unknown(err.to_string()),
        }
    }
}

/// Session state machine errors
#[derive(Debug, Clone)]
pub enum SessionError {
    /// Camera acquisition failed while entering the session
    Camera(CameraError),
    /// The requested operation is not valid in the current state
    InvalidTransition {
        /// The operation that was attempted
        action: &'static str,
        /// The state the session was in
        from: &'static str,
    },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Camera(e) => write!(f, "Camera error: {}", e),
            ScanError::Session(e) => write!(f, "Session error: {}", e),
            ScanError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ScanError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "Camera access denied"),
            CameraError::NoDevice => write!(f, "No camera device found"),
            CameraError::DeviceBusy => write!(f, "Camera is busy"),
            CameraError::Unknown(msg) => write!(f, "Camera error: {}", msg),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Camera(e) => write!(f, "{}", e),
            SessionError::InvalidTransition { action, from } => {
                write!(f, "Cannot {} while session is {}", action, from)
            }
        }
    }
}

impl std::error::Error for ScanError {}
impl std::error::Error for CameraError {}
impl std::error::Error for SessionError {}

// Conversions from sub-errors to ScanError
impl From<CameraError> for ScanError {
    fn from(err: CameraError) -> Self {
        ScanError::Camera(err)
    }
}

impl From<SessionError> for ScanError {
    fn from(err: SessionError) -> Self {
        ScanError::Session(err)
    }
}

impl From<CameraError> for SessionError {
    fn from(err: CameraError) -> Self {
        SessionError::Camera(err)
    }
}

impl From<String> for ScanError {
    fn from(msg: String) -> Self {
        ScanError::Other(msg)
    }
}

impl From<&str> for ScanError {
    fn from(msg: &str) -> Self {
        ScanError::Other(msg.to_string())
    }
}
