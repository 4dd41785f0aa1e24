//! Request coalescing and poll throttling.
//!
//! Status requests arrive in bursts (the integration layer fans one user
//! action out across many accessories). The coordinator keeps one ordered
//! queue of pending completions per status kind and a debounce deadline that
//! re-arms on every new request; only deadline expiry triggers a wire query.
//! The queue itself is strictly additive — re-arming the timer never drops a
//! waiter, and draining a response completes every waiter exactly once.
//!
//! All state is per-connection: each controller session owns its own
//! coordinator.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use airtouch_protocol::{AcStatusRecord, GroupStatusRecord};

pub(crate) struct RequestCoordinator {
    ac_queue: Vec<oneshot::Sender<Vec<AcStatusRecord>>>,
    group_queue: Vec<oneshot::Sender<Vec<GroupStatusRecord>>>,
    ac_deadline: Option<Instant>,
    group_deadline: Option<Instant>,
    debounce: Duration,
    poll_throttle: Duration,
    last_poll: Option<Instant>,
}

impl RequestCoordinator {
    pub(crate) fn new(debounce: Duration, poll_throttle: Duration) -> Self {
        RequestCoordinator {
            ac_queue: Vec::new(),
            group_queue: Vec::new(),
            ac_deadline: None,
            group_deadline: None,
            debounce,
            poll_throttle,
            last_poll: None,
        }
    }

    /// Queue an AC status waiter and (re)start the AC debounce timer.
    pub(crate) fn enqueue_ac(&mut self, waiter: oneshot::Sender<Vec<AcStatusRecord>>) {
        self.ac_queue.push(waiter);
        self.ac_deadline = Some(Instant::now() + self.debounce);
        debug!(pending = self.ac_queue.len(), "AC status request queued");
    }

    /// Queue a group status waiter and (re)start the group debounce timer.
    pub(crate) fn enqueue_group(&mut self, waiter: oneshot::Sender<Vec<GroupStatusRecord>>) {
        self.group_queue.push(waiter);
        self.group_deadline = Some(Instant::now() + self.debounce);
        debug!(pending = self.group_queue.len(), "group status request queued");
    }

    pub(crate) fn ac_deadline(&self) -> Option<Instant> {
        self.ac_deadline
    }

    pub(crate) fn group_deadline(&self) -> Option<Instant> {
        self.group_deadline
    }

    /// Disarm the AC debounce timer once its query is on the wire.
    pub(crate) fn clear_ac_deadline(&mut self) {
        self.ac_deadline = None;
    }

    /// Disarm the group debounce timer once its query is on the wire.
    pub(crate) fn clear_group_deadline(&mut self) {
        self.group_deadline = None;
    }

    /// Complete every queued AC waiter with the decoded records.
    ///
    /// Waiters queued after this drain wait for the next round trip.
    pub(crate) fn drain_ac(&mut self, records: &[AcStatusRecord]) {
        for waiter in self.ac_queue.drain(..) {
            // A dropped receiver just means the caller stopped waiting.
            let _ = waiter.send(records.to_vec());
        }
    }

    /// Complete every queued group waiter with the decoded records.
    pub(crate) fn drain_group(&mut self, records: &[GroupStatusRecord]) {
        for waiter in self.group_queue.drain(..) {
            let _ = waiter.send(records.to_vec());
        }
    }

    /// Throttle for the combined AC+Group poll: returns true (and stamps the
    /// attempt) at most once per throttle window.
    pub(crate) fn should_poll(&mut self, now: Instant) -> bool {
        let due = self
            .last_poll
            .is_none_or(|last| now.duration_since(last) > self.poll_throttle);
        if due {
            self.last_poll = Some(now);
        }
        due
    }
}
