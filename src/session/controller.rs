// SPDX-License-Identifier: GPL-3.0-only

//! Scan session controller
//!
//! The only component a host UI touches. Owns the camera lifecycle, the
//! decode loop, audio feedback, and the item store, and exposes the
//! start/stop/complete state machine:
//!
//! ```text
//! Idle ──start──▶ Requesting ──camera ready──▶ Scanning ──stop──▶ Idle
//!   ▲                  │                          │
//!   │             camera error                complete
//!   │                  ▼                          ▼
//!   └──start──── Error ◀── camera failure    Completed
//! ```
//!
//! Only camera failures change the state machine from the outside; decode
//! misses, duplicates, and validation rejections are presentation-layer
//! notices. No operation panics across this boundary; everything returns a
//! discriminated result.

use crate::backends::audio::AudioFeedback;
use crate::backends::camera::{CameraBackend, CameraConstraints, CameraLifecycle, LifecycleStats};
use crate::config::Config;
use crate::decode::{DecodeScheduler, DecoderFactory, SchedulerEvent};
use crate::errors::SessionError;
use crate::isbn::{self, RejectReason};
use crate::session::notices::{NoticeHub, SessionNotice};
use crate::session::store::{ScannedItem, SessionStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    /// Camera acquisition in progress (may wait on an OS permission prompt)
    Requesting,
    Scanning,
    /// Camera failed; manual entry stays available, user must retry start
    Error,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "Idle",
            SessionStatus::Requesting => "Requesting",
            SessionStatus::Scanning => "Scanning",
            SessionStatus::Error => "Error",
            SessionStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of routing one code through normalization and the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// New ISBN, confirmed and stored
    Added(String),
    /// Valid ISBN already in the store; nothing changed
    Duplicate(String),
    /// Not an ISBN; nothing changed
    Rejected(RejectReason),
}

/// State shared with the decode loop thread
struct SharedState {
    status: SessionStatus,
    store: SessionStore,
}

/// Orchestrates one scan session at a time.
///
/// At most one session (and therefore one camera hold) exists per
/// controller; the crate assumes one controller per process.
pub struct ScanSessionController {
    id: Uuid,
    shared: Arc<Mutex<SharedState>>,
    camera: CameraLifecycle,
    notices: NoticeHub,
    audio: Arc<AudioFeedback>,
    make_decoder: DecoderFactory,
    constraints: CameraConstraints,
    interval: Duration,
    scheduler: Option<DecodeScheduler>,
    on_complete: Option<Box<dyn FnOnce(Vec<String>) + Send>>,
}

impl ScanSessionController {
    pub fn new(
        backend: Box<dyn CameraBackend>,
        make_decoder: DecoderFactory,
        notices: NoticeHub,
        config: &Config,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            shared: Arc::new(Mutex::new(SharedState {
                status: SessionStatus::Idle,
                store: SessionStore::new(),
            })),
            camera: CameraLifecycle::new(backend),
            notices,
            audio: Arc::new(AudioFeedback::new(config.tone_enabled)),
            make_decoder,
            constraints: config.camera.clone(),
            interval: config.decode_interval(),
            scheduler: None,
            on_complete: None,
        }
    }

    /// Register the callback that receives the finished ISBN list. Called
    /// at most once, on the first successful `complete()`.
    pub fn set_on_complete<F>(&mut self, callback: F)
    where
        F: FnOnce(Vec<String>) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    /// Begin a session: acquire the camera and start the decode loop.
    ///
    /// Valid from `Idle` and `Error` (user-initiated retry). A camera
    /// failure moves the session to `Error` and is never retried
    /// automatically.
    pub fn start(&mut self) -> Result<(), SessionError> {
        {
            let mut state = self.shared.lock().unwrap();
            match state.status {
                SessionStatus::Idle | SessionStatus::Error => {}
                status => {
                    return Err(SessionError::InvalidTransition {
                        action: "start",
                        from: status.as_str(),
                    });
                }
            }
            state.status = SessionStatus::Requesting;
        }

        // Join any decode loop left over from a failed session
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.stop();
        }

        info!(session = %self.id, "Acquiring camera");
        if let Err(e) = self.camera.acquire(&self.constraints) {
            warn!(session = %self.id, error = %e, "Camera acquisition failed");
            self.shared.lock().unwrap().status = SessionStatus::Error;
            self.notices.publish(SessionNotice::CameraFailed(e.clone()));
            return Err(SessionError::Camera(e));
        }

        // Mark the session live before the first tick can deliver a result;
        // the sink drops events seen outside Scanning.
        self.shared.lock().unwrap().status = SessionStatus::Scanning;

        let decoder = (self.make_decoder)();
        let shared = Arc::clone(&self.shared);
        let notices = self.notices.clone();
        let audio = Arc::clone(&self.audio);
        let camera = self.camera.clone();

        let scheduler = DecodeScheduler::start(
            self.interval,
            self.camera.clone(),
            decoder,
            move |event| match event {
                SchedulerEvent::Decoded(raw) => {
                    if shared.lock().unwrap().status != SessionStatus::Scanning {
                        return;
                    }
                    let outcome = ingest(&shared, &raw.text);
                    announce(&notices, &audio, &raw.text, &outcome);
                }
                SchedulerEvent::CameraFailed(e) => {
                    shared.lock().unwrap().status = SessionStatus::Error;
                    camera.release();
                    notices.publish(SessionNotice::CameraFailed(e));
                }
            },
        );

        self.scheduler = Some(scheduler);
        info!(session = %self.id, "Scanning");
        Ok(())
    }

    /// Abort the session: cancel the decode loop, release the camera, and
    /// discard accumulated items.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        if self.status() == SessionStatus::Completed {
            return Err(SessionError::InvalidTransition {
                action: "stop",
                from: "Completed",
            });
        }

        self.teardown();
        let mut state = self.shared.lock().unwrap();
        state.store.clear();
        state.status = SessionStatus::Idle;
        info!(session = %self.id, "Session stopped, items discarded");
        Ok(())
    }

    /// End the session and hand the ordered ISBN list to the completion
    /// callback (exactly once). An empty list is allowed.
    pub fn complete(&mut self) -> Result<Vec<String>, SessionError> {
        match self.status() {
            SessionStatus::Scanning | SessionStatus::Error => {}
            status => {
                return Err(SessionError::InvalidTransition {
                    action: "complete",
                    from: status.as_str(),
                });
            }
        }

        self.teardown();
        let isbns = {
            let mut state = self.shared.lock().unwrap();
            state.status = SessionStatus::Completed;
            state.store.isbns()
        };

        if let Some(callback) = self.on_complete.take() {
            callback(isbns.clone());
        }
        info!(session = %self.id, count = isbns.len(), "Session completed");
        Ok(isbns)
    }

    /// Remove one accumulated item before completion
    pub fn remove_item(&mut self, isbn: &str) -> Result<bool, SessionError> {
        let mut state = self.shared.lock().unwrap();
        match state.status {
            SessionStatus::Scanning | SessionStatus::Error => Ok(state.store.remove(isbn)),
            status => Err(SessionError::InvalidTransition {
                action: "remove item",
                from: status.as_str(),
            }),
        }
    }

    /// Submit one typed code through the same normalization and dedup path
    /// as the camera. Available while scanning and, as the fallback, after
    /// a camera error.
    pub fn submit_manual(&mut self, text: &str) -> Result<SubmitOutcome, SessionError> {
        {
            let state = self.shared.lock().unwrap();
            match state.status {
                SessionStatus::Scanning | SessionStatus::Error => {}
                status => {
                    return Err(SessionError::InvalidTransition {
                        action: "submit manual entry",
                        from: status.as_str(),
                    });
                }
            }
        }

        let outcome = ingest(&self.shared, text);
        announce(&self.notices, &self.audio, text, &outcome);
        Ok(outcome)
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.lock().unwrap().status
    }

    /// Snapshot of accumulated items, in scan order
    pub fn items(&self) -> Vec<ScannedItem> {
        self.shared.lock().unwrap().store.list().to_vec()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Camera acquire/release pairing counters
    pub fn camera_stats(&self) -> LifecycleStats {
        self.camera.stats()
    }

    /// Cancel the decode loop, then release the camera, in that order.
    /// Idempotent; each cleanup action runs at most once per transition.
    fn teardown(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.stop();
        }
        self.camera.release();
    }
}

impl Drop for ScanSessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for ScanSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSessionController")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}

/// Route one raw code through normalization into the store
fn ingest(shared: &Arc<Mutex<SharedState>>, text: &str) -> SubmitOutcome {
    match isbn::normalize(text) {
        Ok(code) => {
            let mut state = shared.lock().unwrap();
            if state.store.add(code.clone()) {
                SubmitOutcome::Added(code)
            } else {
                SubmitOutcome::Duplicate(code)
            }
        }
        Err(reason) => SubmitOutcome::Rejected(reason),
    }
}

/// Publish the notice (and tone, for new items) matching an outcome
fn announce(notices: &NoticeHub, audio: &AudioFeedback, input: &str, outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Added(isbn) => {
            audio.play();
            notices.publish(SessionNotice::ItemScanned { isbn: isbn.clone() });
        }
        SubmitOutcome::Duplicate(isbn) => {
            notices.publish(SessionNotice::Duplicate { isbn: isbn.clone() });
        }
        SubmitOutcome::Rejected(reason) => {
            notices.publish(SessionNotice::Rejected {
                input: input.to_string(),
                reason: *reason,
            });
        }
    }
}
