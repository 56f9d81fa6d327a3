//! # Window Aggregation
//!
//! Elapsed-time arithmetic over an ordered event slice.
//!
//! ## Clock
//! Raw timestamps restart at every period. Absolute match time is
//! `period offset + in-period time`. Elapsed time between two events of
//! different periods is only defined when `half_time_continuation` is set;
//! otherwise any window query that would cross a period boundary stops there.
//!
//! ## Queries
//! A [`Timeline`] wraps either a whole stream or one possession's events:
//! - elapsed since the slice start (possession start)
//! - elapsed since the previous event matching a predicate
//! - first event matching a predicate within `window` seconds after an anchor
//! - reaction time: first qualifying event after an anchor, undefined if none

use crate::config::ClockConfig;
use crate::models::Event;

#[derive(Debug, Clone)]
pub struct MatchClock {
    config: ClockConfig,
}

impl MatchClock {
    pub fn new(config: ClockConfig) -> Self {
        Self { config }
    }

    pub fn continuation(&self) -> bool {
        self.config.half_time_continuation
    }

    /// Period offset plus in-period time, in seconds.
    pub fn absolute_time(&self, event: &Event) -> f64 {
        self.config.offset_for(event.period) + event.timestamp_s
    }

    pub fn match_minute(&self, event: &Event) -> f64 {
        self.absolute_time(event) / 60.0
    }

    /// Seconds from `from` to `to`; `None` across periods without continuation.
    pub fn elapsed(&self, from: &Event, to: &Event) -> Option<f64> {
        if from.period == to.period {
            Some(to.timestamp_s - from.timestamp_s)
        } else if self.config.half_time_continuation {
            Some(self.absolute_time(to) - self.absolute_time(from))
        } else {
            None
        }
    }
}

/// Ordered events plus the clock used to measure them.
#[derive(Debug, Clone, Copy)]
pub struct Timeline<'a> {
    events: &'a [Event],
    clock: &'a MatchClock,
}

impl<'a> Timeline<'a> {
    pub fn new(events: &'a [Event], clock: &'a MatchClock) -> Self {
        Self { events, clock }
    }

    pub fn events(&self) -> &'a [Event] {
        self.events
    }

    pub fn clock(&self) -> &'a MatchClock {
        self.clock
    }

    /// Position of a sequence index (indices are strictly increasing).
    pub fn position_of(&self, index: u64) -> Option<usize> {
        self.events.binary_search_by_key(&index, |e| e.index).ok()
    }

    pub fn elapsed_since_start(&self, pos: usize) -> Option<f64> {
        let first = self.events.first()?;
        self.clock.elapsed(first, self.events.get(pos)?)
    }

    /// Elapsed time since the closest earlier event matching `pred`.
    pub fn elapsed_since_previous<P>(&self, pos: usize, pred: P) -> Option<f64>
    where
        P: Fn(&Event) -> bool,
    {
        let anchor = self.events.get(pos)?;
        let previous = self.events[..pos].iter().rev().find(|e| pred(e))?;
        self.clock.elapsed(previous, anchor)
    }

    /// First later event matching `pred` within `window_s` of the anchor.
    pub fn first_within<P>(&self, pos: usize, window_s: f64, pred: P) -> Option<(&'a Event, f64)>
    where
        P: Fn(&Event) -> bool,
    {
        let anchor = self.events.get(pos)?;
        for candidate in &self.events[pos + 1..] {
            let dt = self.clock.elapsed(anchor, candidate)?;
            if dt > window_s {
                return None;
            }
            if pred(candidate) {
                return Some((candidate, dt));
            }
        }
        None
    }

    pub fn occurred_within<P>(&self, pos: usize, window_s: f64, pred: P) -> bool
    where
        P: Fn(&Event) -> bool,
    {
        self.first_within(pos, window_s, pred).is_some()
    }

    /// Whether an earlier event matching `pred` happened within `window_s`.
    pub fn occurred_before_within<P>(&self, pos: usize, window_s: f64, pred: P) -> bool
    where
        P: Fn(&Event) -> bool,
    {
        let Some(anchor) = self.events.get(pos) else {
            return false;
        };
        for candidate in self.events[..pos].iter().rev() {
            match self.clock.elapsed(candidate, anchor) {
                Some(dt) if dt <= window_s => {
                    if pred(candidate) {
                        return true;
                    }
                }
                _ => return false,
            }
        }
        false
    }

    /// Events matching `pred` in the `window_s` seconds up to the anchor.
    pub fn count_trailing<P>(&self, pos: usize, window_s: f64, pred: P) -> usize
    where
        P: Fn(&Event) -> bool,
    {
        let Some(anchor) = self.events.get(pos) else {
            return 0;
        };
        self.events[..=pos]
            .iter()
            .rev()
            .take_while(|e| {
                self.clock
                    .elapsed(e, anchor)
                    .is_some_and(|dt| dt <= window_s)
            })
            .filter(|e| pred(e))
            .count()
    }

    /// Later events matching `pred` within `window_s` after the anchor.
    pub fn count_within<P>(&self, pos: usize, window_s: f64, pred: P) -> usize
    where
        P: Fn(&Event) -> bool,
    {
        let Some(anchor) = self.events.get(pos) else {
            return 0;
        };
        self.events[pos + 1..]
            .iter()
            .take_while(|e| {
                self.clock
                    .elapsed(anchor, e)
                    .is_some_and(|dt| dt <= window_s)
            })
            .filter(|e| pred(e))
            .count()
    }

    /// Time from the anchor to the first later event matching `pred`.
    ///
    /// Undefined when nothing qualifies before the slice ends.
    pub fn reaction_time<P>(&self, pos: usize, pred: P) -> Option<f64>
    where
        P: Fn(&Event) -> bool,
    {
        self.first_within(pos, f64::INFINITY, pred).map(|(_, dt)| dt)
    }
}
