// SPDX-License-Identifier: GPL-3.0-only

//! Scoped camera acquisition
//!
//! [`CameraLifecycle`] wraps a backend so that every acquire attempt on any
//! path — success, failure, early return, or drop — is matched by exactly
//! one release. It is cheaply cloneable and thread-safe so the decode loop
//! thread can grab frames while the controller retains ownership of the
//! session, mirroring how the backend manager is shared with capture
//! threads elsewhere.

use super::types::{CameraConstraints, CameraDevice, CameraFrame};
use super::CameraBackend;
use crate::errors::CameraError;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Acquire/release pairing counters, exposed for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleStats {
    /// Number of acquire attempts, successful or not
    pub acquires: u64,
    /// Number of releases (failed acquires release immediately)
    pub releases: u64,
}

struct Inner {
    backend: Box<dyn CameraBackend>,
    acquired: bool,
    stats: LifecycleStats,
}

/// Thread-safe owner of the camera resource
#[derive(Clone)]
pub struct CameraLifecycle {
    inner: Arc<Mutex<Inner>>,
}

impl CameraLifecycle {
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                backend,
                acquired: false,
                stats: LifecycleStats::default(),
            })),
        }
    }

    /// Enumerate capture devices on the underlying backend
    pub fn enumerate(&self) -> Vec<CameraDevice> {
        self.inner.lock().unwrap().backend.enumerate()
    }

    /// Acquire the device.
    ///
    /// On failure the backend is closed before the error is returned, so
    /// the failed attempt still counts as a matched acquire/release pair.
    pub fn acquire(&self, constraints: &CameraConstraints) -> Result<(), CameraError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.acquired {
            return Err(CameraError::DeviceBusy);
        }

        inner.stats.acquires += 1;
        match inner.backend.open(constraints) {
            Ok(()) => {
                inner.acquired = true;
                info!("Camera acquired");
                Ok(())
            }
            Err(e) => {
                inner.backend.close();
                inner.stats.releases += 1;
                Err(e)
            }
        }
    }

    /// Release the device. Idempotent; safe when acquire never succeeded.
    pub fn release(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.acquired {
            inner.backend.close();
            inner.acquired = false;
            inner.stats.releases += 1;
            info!("Camera released");
        } else {
            // Still safe: the backend's close is idempotent too.
            inner.backend.close();
            debug!("Release on unacquired camera ignored");
        }
    }

    /// Grab the next frame from the live stream
    pub fn grab_frame(&self) -> Result<CameraFrame, CameraError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.acquired {
            return Err(CameraError::Unknown("camera not acquired".to_string()));
        }
        inner.backend.grab_frame()
    }

    /// Whether the device is currently held
    pub fn is_acquired(&self) -> bool {
        self.inner.lock().unwrap().acquired
    }

    /// Current acquire/release counters
    pub fn stats(&self) -> LifecycleStats {
        self.inner.lock().unwrap().stats
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.acquired {
            self.backend.close();
            self.acquired = false;
            self.stats.releases += 1;
            debug!("Camera released on drop");
        }
    }
}

impl std::fmt::Debug for CameraLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("CameraLifecycle")
            .field("acquired", &inner.acquired)
            .field("stats", &inner.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend whose next open can be forced to fail
    struct FlakyBackend {
        open: bool,
        fail_next: bool,
    }

    impl CameraBackend for FlakyBackend {
        fn enumerate(&self) -> Vec<CameraDevice> {
            Vec::new()
        }

        fn open(&mut self, _c: &CameraConstraints) -> Result<(), CameraError> {
            if self.fail_next {
                self.fail_next = false;
                return Err(CameraError::PermissionDenied);
            }
            self.open = true;
            Ok(())
        }

        fn close(&mut self) {
            self.open = false;
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn grab_frame(&mut self) -> Result<CameraFrame, CameraError> {
            CameraFrame::from_luma(2, 2, vec![0; 4])
                .ok_or_else(|| CameraError::Unknown("frame".to_string()))
        }
    }

    fn lifecycle(fail_next: bool) -> CameraLifecycle {
        CameraLifecycle::new(Box::new(FlakyBackend {
            open: false,
            fail_next,
        }))
    }

    #[test]
    fn test_acquire_release_pairing() {
        let camera = lifecycle(false);
        camera.acquire(&CameraConstraints::default()).unwrap();
        assert!(camera.is_acquired());
        camera.release();
        camera.acquire(&CameraConstraints::default()).unwrap();
        camera.release();

        let stats = camera.stats();
        assert_eq!(stats.acquires, 2);
        assert_eq!(stats.releases, 2);
    }

    #[test]
    fn test_failed_acquire_is_still_paired() {
        let camera = lifecycle(true);
        assert!(camera.acquire(&CameraConstraints::default()).is_err());
        assert!(!camera.is_acquired());

        // Retry succeeds; counters stay balanced across the whole sequence.
        camera.acquire(&CameraConstraints::default()).unwrap();
        camera.release();

        let stats = camera.stats();
        assert_eq!(stats.acquires, 2);
        assert_eq!(stats.releases, 2);
    }

    #[test]
    fn test_release_is_idempotent() {
        let camera = lifecycle(false);
        camera.release();
        camera.release();
        camera.acquire(&CameraConstraints::default()).unwrap();
        camera.release();
        camera.release();

        let stats = camera.stats();
        assert_eq!(stats.acquires, 1);
        assert_eq!(stats.releases, 1);
    }

    #[test]
    fn test_double_acquire_rejected() {
        let camera = lifecycle(false);
        camera.acquire(&CameraConstraints::default()).unwrap();
        assert!(matches!(
            camera.acquire(&CameraConstraints::default()),
            Err(CameraError::DeviceBusy)
        ));
        camera.release();
    }

    #[test]
    fn test_grab_requires_acquisition() {
        let camera = lifecycle(false);
        assert!(camera.grab_frame().is_err());
        camera.acquire(&CameraConstraints::default()).unwrap();
        assert!(camera.grab_frame().is_ok());
        camera.release();
    }
}
