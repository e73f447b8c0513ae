use std::io;
use std::time::{Duration, Instant};

use log::debug;

use crate::buffer::ChangeBuffer;
use crate::render::CellSink;

pub const DEFAULT_WARM_UP_FRAMES: u32 = 3;

/// Time source for the flush budget.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Per-frame output budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBudget {
    /// Wall-clock ceiling for one flush. `None` never truncates.
    pub frame_time_limit: Option<Duration>,
    /// Number of leading frames drawn in full regardless of the limit.
    pub warm_up_frames: u32,
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self {
            frame_time_limit: Some(Duration::from_secs(1) / 30),
            warm_up_frames: DEFAULT_WARM_UP_FRAMES,
        }
    }
}

/// What one flush did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub emitted: usize,
    pub abandoned: usize,
    pub elapsed: Duration,
    pub truncated: bool,
}

/// Writes a frame's pending changes in priority order until the queue is
/// empty or the budget runs out. Whatever is left is discarded.
pub struct FlushScheduler<C: Clock = MonotonicClock> {
    budget: FrameBudget,
    frames_rendered: u64,
    clock: C,
}

impl FlushScheduler<MonotonicClock> {
    pub fn new(budget: FrameBudget) -> Self {
        Self::with_clock(budget, MonotonicClock)
    }
}

impl<C: Clock> FlushScheduler<C> {
    pub fn with_clock(budget: FrameBudget, clock: C) -> Self {
        Self {
            budget,
            frames_rendered: 0,
            clock,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Make the following frames warm-up frames again.
    pub fn restart_warm_up(&mut self) {
        self.frames_rendered = 0;
    }

    fn active_limit(&self) -> Option<Duration> {
        if self.frames_rendered > self.budget.warm_up_frames as u64 {
            self.budget.frame_time_limit
        } else {
            None
        }
    }

    pub fn flush<S>(&mut self, buffer: &mut ChangeBuffer, sink: &mut S) -> io::Result<FlushReport>
    where
        S: CellSink + ?Sized,
    {
        let start = self.clock.now();
        let limit = self.active_limit();
        let total = buffer.pending_len();
        let mut emitted = 0;

        for record in buffer.drain_by_priority() {
            let pair = record.pair;
            sink.draw_cell(pair.x, pair.y, pair.foreground(), pair.background())?;
            emitted += 1;

            if let Some(limit) = limit {
                if self.clock.now().duration_since(start) > limit {
                    break;
                }
            }
        }
        buffer.clear_pending();
        sink.end_frame()?;
        self.frames_rendered += 1;

        let report = FlushReport {
            emitted,
            abandoned: total - emitted,
            elapsed: self.clock.now().duration_since(start),
            truncated: emitted < total,
        };
        if report.truncated {
            debug!(
                "frame {} truncated: drew {} of {} cells in {:?}",
                self.frames_rendered, report.emitted, total, report.elapsed
            );
        }
        Ok(report)
    }
}
