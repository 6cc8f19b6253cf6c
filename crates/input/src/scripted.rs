use std::collections::BTreeMap;
use std::ops::Range;

use crate::key::KeyCode;
use crate::source::InputSource;

/// Deterministic input timeline for headless runs and tests.
///
/// Frames are numbered from 0 by the order of `poll_events` calls. Each poll
/// advances the clock by the frame time plus any stall scheduled for that
/// frame.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    frame_time: f64,
    clock: f64,
    polled: u64,
    holds: Vec<(KeyCode, Range<u64>)>,
    focus: Vec<Range<u64>>,
    stalls: BTreeMap<u64, f64>,
    close_after: Option<u64>,
}

impl ScriptedInput {
    pub fn new(frame_time: f64) -> Self {
        Self {
            frame_time,
            clock: 0.0,
            polled: 0,
            holds: Vec::new(),
            focus: Vec::new(),
            stalls: BTreeMap::new(),
            close_after: None,
        }
    }

    /// Hold `key` down during `frames`.
    pub fn hold(mut self, key: KeyCode, frames: Range<u64>) -> Self {
        self.holds.push((key, frames));
        self
    }

    /// Press and release `key` on a single frame.
    pub fn tap(self, key: KeyCode, frame: u64) -> Self {
        self.hold(key, frame..frame + 1)
    }

    /// Give a UI surface focus during `frames`.
    pub fn focus_ui(mut self, frames: Range<u64>) -> Self {
        self.focus.push(frames);
        self
    }

    /// Add `seconds` of extra delay before `frame`.
    pub fn stall(mut self, frame: u64, seconds: f64) -> Self {
        *self.stalls.entry(frame).or_default() += seconds;
        self
    }

    /// Request close once `frames` frames have been polled.
    pub fn close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Index of the frame set up by the last poll.
    pub fn frame(&self) -> Option<u64> {
        self.polled.checked_sub(1)
    }

    fn active(&self, frames: &Range<u64>) -> bool {
        self.frame().is_some_and(|f| frames.contains(&f))
    }
}

impl InputSource for ScriptedInput {
    fn poll_events(&mut self) {
        let stall = self.stalls.get(&self.polled).copied().unwrap_or(0.0);
        self.clock += self.frame_time + stall;
        self.polled += 1;
    }

    fn now(&self) -> f64 {
        self.clock
    }

    fn is_ui_focused(&self) -> bool {
        self.focus.iter().any(|r| self.active(r))
    }

    fn is_key_down(&self, key: KeyCode) -> bool {
        self.holds.iter().any(|(k, r)| *k == key && self.active(r))
    }

    fn close_requested(&self) -> bool {
        self.close_after.is_some_and(|n| self.polled >= n)
    }
}
