// SPDX-License-Identifier: GPL-3.0-only

//! Scan session state: the ordered ISBN store, the observer hub for
//! transient notices, and the controller state machine that owns the
//! camera, the decode loop, and audio feedback.

pub mod controller;
pub mod notices;
pub mod store;

pub use controller::{ScanSessionController, SessionStatus, SubmitOutcome};
pub use notices::{NoticeHub, SessionNotice, SubscriptionId};
pub use store::{ScannedItem, SessionStore};
