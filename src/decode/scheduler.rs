// SPDX-License-Identifier: GPL-3.0-only

//! Cooperative decode polling loop
//!
//! One dedicated thread grabs a frame and attempts a decode at a fixed
//! cadence. Because the loop is sequential, ticks can never overlap; when a
//! decode overruns the interval the missed ticks are skipped, never queued,
//! so in-flight work is bounded to one attempt.
//!
//! Cancellation is synchronous: `stop()` sets the stop signal and joins the
//! thread before returning, and a decode result that lands after the signal
//! is discarded before the sink sees it. No event is observable once
//! `stop()` has returned.

use super::Decoder;
use super::RawDecodeResult;
use crate::backends::camera::CameraLifecycle;
use crate::errors::CameraError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Granularity of the stop-signal check while waiting for the next tick
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Events delivered to the scheduler's sink
#[derive(Debug)]
pub enum SchedulerEvent {
    /// A tick produced a successful read
    Decoded(RawDecodeResult),
    /// Frame grabbing failed; the loop has terminated
    CameraFailed(CameraError),
}

/// Controller for the decode polling thread
pub struct DecodeScheduler {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
}

impl DecodeScheduler {
    /// Start polling at the given cadence.
    ///
    /// The sink is invoked on the scheduler thread for every successful
    /// decode and for the terminal camera failure, never after `stop()`
    /// returns. A tick with no barcode in frame produces no event.
    pub fn start<F>(
        interval: Duration,
        camera: CameraLifecycle,
        mut decoder: Box<dyn Decoder>,
        mut sink: F,
    ) -> Self
    where
        F: FnMut(SchedulerEvent) + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&stop_signal);
        let interval = interval.max(Duration::from_millis(1));

        info!(interval_ms = interval.as_millis() as u64, "Starting decode loop");

        let thread_handle = thread::spawn(move || {
            let mut next_tick = Instant::now();

            loop {
                if !sleep_until(next_tick, &stop) {
                    break;
                }

                // Schedule the following tick; if this one overruns, skip
                // the missed slots instead of bursting to catch up.
                next_tick += interval;
                let now = Instant::now();
                while next_tick < now {
                    next_tick += interval;
                }

                let frame = match camera.grab_frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        if stop.load(Ordering::SeqCst) {
                            break;
                        }
                        warn!(error = %e, "Frame grab failed, decode loop stopping");
                        sink(SchedulerEvent::CameraFailed(e));
                        break;
                    }
                };

                if let Some(result) = decoder.attempt(&frame) {
                    // The session may have been torn down while this
                    // attempt was outstanding; its result must not be
                    // observable after cancellation.
                    if stop.load(Ordering::SeqCst) {
                        debug!("Discarding decode result from cancelled tick");
                        break;
                    }
                    sink(SchedulerEvent::Decoded(result));
                }
            }

            debug!("Decode loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
        }
    }

    /// Whether the loop thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Stop the loop and wait for the thread to finish.
    ///
    /// After this returns, no sink invocation can occur.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("Decode loop thread panicked");
            } else {
                debug!("Decode loop stopped");
            }
        }
    }
}

impl Drop for DecodeScheduler {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!("DecodeScheduler dropped, stopping loop");
            self.stop();
        }
    }
}

/// Sleep until the deadline in short slices, returning false as soon as the
/// stop signal is observed.
fn sleep_until(deadline: Instant, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{CameraBackend, CameraConstraints, CameraDevice, CameraFrame};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;

    struct StaticBackend {
        open: bool,
    }

    impl CameraBackend for StaticBackend {
        fn enumerate(&self) -> Vec<CameraDevice> {
            Vec::new()
        }
        fn open(&mut self, _c: &CameraConstraints) -> Result<(), CameraError> {
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
            CameraFrame::from_luma(8, 1, vec![255u8; 8])
                .ok_or_else(|| CameraError::Unknown("frame".to_string()))
        }
    }

    fn acquired_camera() -> CameraLifecycle {
        let camera = CameraLifecycle::new(Box::new(StaticBackend { open: false }));
        camera.acquire(&CameraConstraints::default()).unwrap();
        camera
    }

    /// Decoder that reports a hit on every attempt, counting them
    struct CountingDecoder {
        attempts: Arc<AtomicU32>,
    }

    impl Decoder for CountingDecoder {
        fn attempt(&mut self, frame: &CameraFrame) -> Option<RawDecodeResult> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Some(RawDecodeResult {
                text: "9780306406157".to_string(),
                captured_at: frame.captured_at,
            })
        }
    }

    /// Decoder that blocks for a while before reporting a hit
    struct SlowDecoder {
        delay: Duration,
    }

    impl Decoder for SlowDecoder {
        fn attempt(&mut self, frame: &CameraFrame) -> Option<RawDecodeResult> {
            thread::sleep(self.delay);
            Some(RawDecodeResult {
                text: "9780306406157".to_string(),
                captured_at: frame.captured_at,
            })
        }
    }

    #[test]
    fn test_ticks_reach_the_sink() {
        let camera = acquired_camera();
        let attempts = Arc::new(AtomicU32::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let mut scheduler = DecodeScheduler::start(
            Duration::from_millis(5),
            camera,
            Box::new(CountingDecoder {
                attempts: Arc::clone(&attempts),
            }),
            move |event| {
                if let SchedulerEvent::Decoded(result) = event {
                    seen_clone.lock().unwrap().push(result.text);
                }
            },
        );

        let deadline = Instant::now() + Duration::from_secs(2);
        while attempts.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        scheduler.stop();

        assert!(attempts.load(Ordering::SeqCst) >= 3);
        assert!(!seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stop_discards_outstanding_result() {
        let camera = acquired_camera();
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen_clone = Arc::clone(&seen);

        let mut scheduler = DecodeScheduler::start(
            Duration::from_millis(1),
            camera,
            Box::new(SlowDecoder {
                delay: Duration::from_millis(200),
            }),
            move |event| {
                if let SchedulerEvent::Decoded(result) = event {
                    seen_clone.lock().unwrap().push(result.text);
                }
            },
        );

        // Let the first tick start its slow decode, then cancel under it.
        thread::sleep(Duration::from_millis(30));
        scheduler.stop();

        // The outstanding decode finished during stop() but its result must
        // not have reached the sink.
        assert!(seen.lock().unwrap().is_empty());
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_stop_is_synchronous() {
        let camera = acquired_camera();
        let mut scheduler = DecodeScheduler::start(
            Duration::from_millis(5),
            camera,
            Box::new(SlowDecoder {
                delay: Duration::from_millis(50),
            }),
            |_| {},
        );

        thread::sleep(Duration::from_millis(10));
        scheduler.stop();
        assert!(!scheduler.is_running());
        // A second stop is a no-op
        scheduler.stop();
    }

    #[test]
    fn test_camera_failure_terminates_loop() {
        // Never acquired, so every grab fails
        let camera = CameraLifecycle::new(Box::new(StaticBackend { open: false }));
        let failures = Arc::new(AtomicU32::new(0));
        let failures_clone = Arc::clone(&failures);

        let scheduler = DecodeScheduler::start(
            Duration::from_millis(1),
            camera,
            Box::new(SlowDecoder {
                delay: Duration::ZERO,
            }),
            move |event| {
                if matches!(event, SchedulerEvent::CameraFailed(_)) {
                    failures_clone.fetch_add(1, Ordering::SeqCst);
                }
            },
        );

        let deadline = Instant::now() + Duration::from_secs(2);
        while scheduler.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert!(!scheduler.is_running());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }
}
