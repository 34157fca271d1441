//! Frame scheduling and resize coalescing.

use std::time::{Duration, Instant};

/// Handle for a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

impl FrameRequest {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Source of "run before next repaint" callbacks.
pub trait FrameClock {
    /// Schedule a frame and return its handle.
    fn request_frame(&mut self) -> FrameRequest;

    /// Cancel a previously scheduled frame. Unknown handles are ignored.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Fixed-rate frame clock polled by the event loop.
///
/// Holds at most one pending request; a new request replaces the old one.
#[derive(Debug)]
pub struct IntervalClock {
    interval: Duration,
    next_id: u64,
    pending: Option<FrameRequest>,
    last_fired: Option<Instant>,
}

impl IntervalClock {
    /// Create a clock firing at most `fps` times per second.
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            next_id: 0,
            pending: None,
            last_fired: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending frame is due, `None` if nothing is scheduled.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending?;
        Some(match self.last_fired {
            Some(t) => (t + self.interval).saturating_duration_since(now),
            None => Duration::ZERO,
        })
    }

    /// Take the pending request if it is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<FrameRequest> {
        if self.time_until_due(now)? > Duration::ZERO {
            return None;
        }
        self.last_fired = Some(now);
        self.pending.take()
    }
}

impl FrameClock for IntervalClock {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.pending = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }
}

/// Coalesces bursts of events: only the last value of a burst is delivered,
/// once `delay` has passed without a newer one.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace any pending value and restart the quiet window.
    pub fn schedule(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    /// Time left until the pending value is delivered.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(deadline, _)| deadline.saturating_duration_since(now))
    }

    /// Deliver the pending value if its quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = matches!(&self.pending, Some((deadline, _)) if now >= *deadline);
        if due {
            self.pending.take().map(|(_, v)| v)
        } else {
            None
        }
    }
}
