//! # Interactive Render Loop
//!
//! While the face is visible and interactive the seconds hand has to move, so a
//! tick is scheduled once per second. Ticks are aligned to wall-clock second
//! boundaries: after each firing the next delay is whatever is left of the
//! current second, so the loop never drifts.
//!
//! The loop never runs in ambient mode or while hidden. In ambient mode the host
//! delivers its own once-per-minute time tick instead.
//!
//! The loop does not own a timer. It hands the adapter a [`ScheduledTick`] to
//! arm and expects [`RenderLoop::fire`] with the same token when it goes off.
//! A firing whose token is no longer pending (cancelled, or superseded) is
//! stale and does nothing.

use log::debug;

/// Default tick interval in interactive mode.
pub const INTERACTIVE_UPDATE_RATE_MS: u64 = 1000;

/// The single outstanding timer request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledTick {
    /// Token to pass back to [`RenderLoop::fire`]
    pub id: u64,
    /// Wall-clock time the tick should fire, in epoch milliseconds
    pub due_ms: u64,
    /// Delay from scheduling to `due_ms`
    pub delay_ms: u64,
}

/// What a tick firing produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Redraw now; `next` is the follow-up tick if the loop keeps running
    Redraw { next: Option<ScheduledTick> },
    /// Token was not pending; nothing happens
    Stale,
}

/// Delay until the next multiple of `interval_ms` after `now_ms`.
///
/// Always in `1..=interval_ms`: a firing exactly on a boundary waits a full
/// interval rather than re-firing in the same millisecond.
pub fn delay_to_next_tick(now_ms: u64, interval_ms: u64) -> u64 {
    interval_ms - (now_ms % interval_ms)
}

/// Schedules and reschedules the once-per-second tick.
#[derive(Debug)]
pub struct RenderLoop {
    interval_ms: u64,
    next_id: u64,
    pending: Option<ScheduledTick>,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new(INTERACTIVE_UPDATE_RATE_MS)
    }
}

impl RenderLoop {
    /// Create a loop with the given interval; zero is treated as one millisecond.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_id: 0,
            pending: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// The tick the adapter should have armed, if any.
    pub fn pending(&self) -> Option<ScheduledTick> {
        self.pending
    }

    /// Start or stop the loop.
    ///
    /// Starting while a tick is already pending keeps that tick. Starting from
    /// idle schedules an immediate tick. Stopping cancels whatever is pending.
    pub fn set_should_run(&mut self, run: bool, now_ms: u64) -> Option<ScheduledTick> {
        if run {
            if self.pending.is_none() {
                let tick = self.schedule(now_ms, 0);
                debug!("render loop started, tick {}", tick.id);
            }
        } else {
            self.cancel();
        }
        self.pending
    }

    /// Drop the pending tick. Safe with nothing pending.
    pub fn cancel(&mut self) {
        if let Some(tick) = self.pending.take() {
            debug!("render loop cancelled tick {}", tick.id);
        }
    }

    /// Handle a timer firing for token `id`.
    ///
    /// `should_run` is re-evaluated by the caller at firing time; if it no
    /// longer holds, the redraw still happens but nothing is rescheduled.
    pub fn fire(&mut self, id: u64, should_run: bool, now_ms: u64) -> TickOutcome {
        match self.pending {
            Some(tick) if tick.id == id => {
                self.pending = None;
            }
            _ => {
                debug!("ignoring stale tick {}", id);
                return TickOutcome::Stale;
            }
        }

        let next = if should_run {
            let delay = delay_to_next_tick(now_ms, self.interval_ms);
            Some(self.schedule(now_ms, delay))
        } else {
            None
        };

        TickOutcome::Redraw { next }
    }

    fn schedule(&mut self, now_ms: u64, delay_ms: u64) -> ScheduledTick {
        self.next_id += 1;
        let tick = ScheduledTick {
            id: self.next_id,
            due_ms: now_ms + delay_ms,
            delay_ms,
        };
        self.pending = Some(tick);
        tick
    }
}
