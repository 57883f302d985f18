/*
    FloppyBay
    https://github.com/dbalsom/floppybay

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/drive/transition.rs

    The drive transition timer.
    
    Guest software notices a disk change by watching the write-protect line:
    with the media out of the drive the line reads protected, and while a disk
    slides in it briefly reads unprotected. A swap done by the host happens
    instantly, so each insert or eject is replayed here as a phase lasting a
    fixed number of vertical blanks.
*/
use crate::{
    types::{TransitionKind, WriteProtectOverride},
    DEFAULT_TRANSITION_DELAY,
};

/// A scheduled transition phase and the tick at which it begins.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PendingTransition {
    pub kind:  TransitionKind,
    pub start: u64,
}

impl PendingTransition {
    fn is_active(&self, now: u64) -> bool {
        now >= self.start
    }

    fn override_value(&self) -> WriteProtectOverride {
        match self.kind {
            TransitionKind::Insert => WriteProtectOverride::ForceUnprotected,
            TransitionKind::Eject => WriteProtectOverride::ForceProtected,
        }
    }
}

/// Two-slot transition state for one drive. The first slot holds the first event of a swap;
/// the second holds the latest event after it, which runs as soon as the first has finished.
/// Events in between are never seen by the guest and are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriveTransition {
    pub(crate) state1: Option<PendingTransition>,
    pub(crate) state2: Option<PendingTransition>,
    pub(crate) delay:  u32,
}

impl Default for DriveTransition {
    fn default() -> Self {
        DriveTransition::new(DEFAULT_TRANSITION_DELAY)
    }
}

impl DriveTransition {
    pub fn new(delay: u32) -> DriveTransition {
        DriveTransition {
            state1: None,
            state2: None,
            delay,
        }
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub(crate) fn set_delay(&mut self, delay: u32) {
        self.delay = delay;
    }

    pub fn state1(&self) -> Option<PendingTransition> {
        self.state1
    }

    pub fn state2(&self) -> Option<PendingTransition> {
        self.state2
    }

    pub fn is_idle(&self) -> bool {
        self.state1.is_none() && self.state2.is_none()
    }

    /// Record a physical insert or eject happening at tick `now`.
    pub fn schedule(&mut self, kind: TransitionKind, now: u64) {
        self.update(now);

        match self.state1 {
            None => {
                self.state1 = Some(PendingTransition { kind, start: now });
                // A new transition cancels whatever was left of the previous second phase.
                self.state2 = None;
            }
            Some(first) if first.kind == kind => {
                // Two of the same event in a row collapse into the first.
                self.state2 = None;
            }
            Some(first) => {
                self.state2 = Some(PendingTransition {
                    kind,
                    start: first.start.saturating_add(self.delay as u64),
                });
            }
        }

        log::trace!(
            "DriveTransition::schedule(): {:?} at {}: state1: {:?} state2: {:?}",
            kind,
            now,
            self.state1,
            self.state2
        );
    }

    /// Retire any phase whose window has closed by tick `now`.
    pub fn update(&mut self, now: u64) {
        let delay = self.delay as u64;
        if let Some(first) = self.state1 {
            if now >= first.start.saturating_add(delay) {
                self.state1 = None;
            }
        }
        if let Some(second) = self.state2 {
            if second.is_active(now) && now >= second.start.saturating_add(delay) {
                self.state2 = None;
            }
        }
    }

    /// Return how the write-protect line should be driven at tick `now`. The second phase takes
    /// precedence once its window has opened.
    pub fn current_override(&mut self, now: u64) -> WriteProtectOverride {
        self.update(now);

        if let Some(second) = self.state2.filter(|s| s.is_active(now)) {
            return second.override_value();
        }
        match self.state1 {
            Some(first) => first.override_value(),
            None => WriteProtectOverride::None,
        }
    }

    /// Cancel all pending phases.
    pub fn reset(&mut self) {
        self.state1 = None;
        self.state2 = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: u64 = DEFAULT_TRANSITION_DELAY as u64;

    #[test]
    fn test_single_eject() {
        let t = 1000;
        let mut timer = DriveTransition::default();
        timer.schedule(TransitionKind::Eject, t);

        for now in t..t + DELAY {
            assert_eq!(timer.current_override(now), WriteProtectOverride::ForceProtected);
        }
        assert_eq!(timer.current_override(t + DELAY), WriteProtectOverride::None);
        assert!(timer.is_idle());
    }

    #[test]
    fn test_eject_then_insert() {
        let t = 500;
        let mut timer = DriveTransition::default();
        timer.schedule(TransitionKind::Eject, t);
        timer.schedule(TransitionKind::Insert, t + 1);

        assert_eq!(
            timer.state2(),
            Some(PendingTransition {
                kind:  TransitionKind::Insert,
                start: t + DELAY,
            })
        );

        for now in t + 1..t + DELAY {
            assert_eq!(timer.current_override(now), WriteProtectOverride::ForceProtected);
        }
        for now in t + DELAY..t + 2 * DELAY {
            assert_eq!(timer.current_override(now), WriteProtectOverride::ForceUnprotected);
        }
        assert_eq!(timer.current_override(t + 2 * DELAY), WriteProtectOverride::None);
    }

    #[test]
    fn test_repeated_event_collapses() {
        let mut timer = DriveTransition::default();
        timer.schedule(TransitionKind::Insert, 10);
        timer.schedule(TransitionKind::Eject, 11);
        timer.schedule(TransitionKind::Insert, 12);

        // The second insert cancels the pending eject instead of queueing.
        assert_eq!(timer.state1().map(|s| s.kind), Some(TransitionKind::Insert));
        assert_eq!(timer.state2(), None);
    }

    #[test]
    fn test_new_transition_after_expiry() {
        let mut timer = DriveTransition::new(4);
        timer.schedule(TransitionKind::Eject, 0);
        timer.schedule(TransitionKind::Insert, 10);
        assert_eq!(timer.state1().map(|s| (s.kind, s.start)), Some((TransitionKind::Insert, 10)));
        assert_eq!(timer.current_override(13), WriteProtectOverride::ForceUnprotected);
        assert_eq!(timer.current_override(14), WriteProtectOverride::None);
    }

    #[test]
    fn test_zero_delay() {
        let mut timer = DriveTransition::new(0);
        timer.schedule(TransitionKind::Eject, 7);
        assert_eq!(timer.current_override(7), WriteProtectOverride::None);
    }

    #[test]
    fn test_reset() {
        let mut timer = DriveTransition::default();
        timer.schedule(TransitionKind::Eject, 0);
        timer.reset();
        assert_eq!(timer.current_override(1), WriteProtectOverride::None);
    }

    #[test]
    fn test_ticks_near_limit() {
        let mut timer = DriveTransition::default();
        timer.schedule(TransitionKind::Eject, u64::MAX - 5);
        timer.schedule(TransitionKind::Insert, u64::MAX - 4);

        assert_eq!(timer.state2().map(|s| s.start), Some(u64::MAX));
        assert_eq!(timer.current_override(u64::MAX - 1), WriteProtectOverride::ForceProtected);
        assert_eq!(timer.current_override(u64::MAX), WriteProtectOverride::None);
        assert!(timer.is_idle());
    }
}
