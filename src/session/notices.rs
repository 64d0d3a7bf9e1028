// SPDX-License-Identifier: GPL-3.0-only

//! Transient session notices
//!
//! An explicitly-owned observer hub with a subscribe/unsubscribe lifecycle.
//! It is injected into the controller rather than living as a process-wide
//! singleton, so hosts (and tests) own exactly the subscriptions they
//! create. Notices are presentation-layer only; none of them, except the
//! camera failure the controller also acts on, changes session state.

use crate::errors::CameraError;
use crate::isbn::RejectReason;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Something the host UI may want to surface for a moment
#[derive(Debug, Clone)]
pub enum SessionNotice {
    /// A new ISBN was confirmed and stored
    ItemScanned { isbn: String },
    /// A valid ISBN was read again; nothing changed
    Duplicate { isbn: String },
    /// The decoded text was not an ISBN; nothing changed
    Rejected { input: String, reason: RejectReason },
    /// The camera failed; the session has moved to the error state
    CameraFailed(CameraError),
}

/// Handle for removing a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&SessionNotice) + Send>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    subscribers: Vec<(u64, Subscriber)>,
}

/// Observer hub for session notices. Cheaply cloneable; clones share the
/// same subscriber list.
#[derive(Clone, Default)]
pub struct NoticeHub {
    inner: Arc<Mutex<HubInner>>,
}

impl NoticeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every future notice
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SessionNotice) + Send + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Box::new(callback)));
        SubscriptionId(id)
    }

    /// Remove a subscription; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.lock().unwrap();
        inner.subscribers.retain(|(sub_id, _)| *sub_id != id.0);
    }

    /// Deliver a notice to all current subscribers
    pub fn publish(&self, notice: SessionNotice) {
        debug!(notice = ?notice, "Publishing session notice");
        let inner = self.inner.lock().unwrap();
        for (_, subscriber) in &inner.subscribers {
            subscriber(&notice);
        }
    }
}

impl std::fmt::Debug for NoticeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("NoticeHub")
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_subscribers_receive_notices() {
        let hub = NoticeHub::new();
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);

        hub.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        hub.publish(SessionNotice::Duplicate {
            isbn: "9780306406157".to_string(),
        });
        hub.publish(SessionNotice::ItemScanned {
            isbn: "9780306406157".to_string(),
        });

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let hub = NoticeHub::new();
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);

        let id = hub.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        hub.unsubscribe(id);

        hub.publish(SessionNotice::Duplicate {
            isbn: "9780306406157".to_string(),
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let hub = NoticeHub::new();
        let clone = hub.clone();
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);

        hub.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        clone.publish(SessionNotice::CameraFailed(CameraError::NoDevice));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
