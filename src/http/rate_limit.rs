//! Sliding-window admission control
//!
//! The window is kept as per-second release counters, newest last. Only
//! seconds with at least one release are stored, so memory follows traffic
//! rather than window length. The running sum is the number of requests
//! released in the trailing window, and a request is only released while that
//! sum is below the ceiling.

use crate::config::ThrottleConfig;
use std::collections::VecDeque;

/// Per-second release counters covering the trailing window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindowLog {
    /// `(second, count)` pairs, oldest first, seconds strictly increasing
    entries: VecDeque<(u64, usize)>,
    /// Second the newest slot belongs to
    now: u64,
    /// Sum of all counts in `entries`
    total: usize,
    window_seconds: usize,
}

impl SlidingWindowLog {
    /// Create an empty log covering `window_seconds` seconds
    pub fn new(window_seconds: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            now: 0,
            total: 0,
            window_seconds: window_seconds.max(1),
        }
    }

    /// Number of requests released within the window
    pub fn total(&self) -> usize {
        self.total
    }

    /// Count one release in the newest slot
    pub fn record(&mut self) {
        let now = self.now;
        match self.entries.back_mut() {
            Some((second, count)) if *second == now => *count += 1,
            _ => self.entries.push_back((now, 1)),
        }
        self.total += 1;
    }

    /// Age the window by one second
    ///
    /// Counters that fall out of the trailing window are evicted and their
    /// releases no longer count against the ceiling.
    pub fn advance(&mut self) {
        self.now += 1;
        while let Some(&(second, count)) = self.entries.front() {
            if self.now - second < self.window_seconds as u64 {
                break;
            }
            self.entries.pop_front();
            self.total -= count;
        }
    }

    /// Window length in seconds
    pub fn window_seconds(&self) -> usize {
        self.window_seconds
    }

    /// Counters for every second of the window, oldest first
    ///
    /// Yields `window_seconds` values, so only walk it for short windows.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        let window = self.window_seconds as u64;
        (0..window).map(move |offset| {
            let age = window - 1 - offset;
            self.now
                .checked_sub(age)
                .and_then(|second| {
                    self.entries
                        .iter()
                        .find(|(s, _)| *s == second)
                        .map(|(_, count)| *count)
                })
                .unwrap_or(0)
        })
    }
}

/// Window log, pending FIFO and ceiling for one throttle queue
#[derive(Debug)]
pub struct ThrottleState<T> {
    log: SlidingWindowLog,
    pending: VecDeque<T>,
    max_requests: usize,
}

impl<T> ThrottleState<T> {
    /// Create an empty state from the given limits
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            log: SlidingWindowLog::new(config.window_seconds()),
            pending: VecDeque::new(),
            max_requests: config.max_requests(),
        }
    }

    /// Append an item to the back of the pending queue
    pub fn push(&mut self, item: T) {
        self.pending.push_back(item);
    }

    /// Whether the window has room for another release
    pub fn has_capacity(&self) -> bool {
        self.log.total() < self.max_requests
    }

    /// Release pending items in FIFO order while capacity remains
    ///
    /// Capacity is checked before each release and the release is recorded
    /// before `release` runs. Returns the number of items released.
    pub fn drain_with(&mut self, mut release: impl FnMut(T)) -> usize {
        let mut released = 0;
        while self.has_capacity() {
            let Some(item) = self.pending.pop_front() else {
                break;
            };
            self.log.record();
            release(item);
            released += 1;
        }
        released
    }

    /// Age the window by one second
    pub fn advance(&mut self) {
        self.log.advance();
    }

    /// Install a fresh window and ceiling, keeping pending items in order
    pub fn reset(&mut self, config: &ThrottleConfig) {
        self.log = SlidingWindowLog::new(config.window_seconds());
        self.max_requests = config.max_requests();
    }

    /// Number of items awaiting release
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Requests released within the current window
    pub fn window_usage(&self) -> usize {
        self.log.total()
    }

    /// Request ceiling per window
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// The window log
    pub fn log(&self) -> &SlidingWindowLog {
        &self.log
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain_all(state: &mut ThrottleState<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        state.drain_with(|item| out.push(item));
        out
    }

    #[test]
    fn test_window_log_new() {
        let log = SlidingWindowLog::new(4);
        assert_eq!(log.slots().collect::<Vec<_>>(), vec![0, 0, 0, 0]);
        assert_eq!(log.total(), 0);
        assert_eq!(log.window_seconds(), 4);
    }

    #[test]
    fn test_window_log_record_and_advance() {
        let mut log = SlidingWindowLog::new(3);
        log.record();
        log.record();
        assert_eq!(log.slots().collect::<Vec<_>>(), vec![0, 0, 2]);

        log.advance();
        log.record();
        assert_eq!(log.slots().collect::<Vec<_>>(), vec![0, 2, 1]);
        assert_eq!(log.total(), 3);

        log.advance();
        log.advance();
        assert_eq!(log.slots().collect::<Vec<_>>(), vec![1, 0, 0]);
        log.advance();
        assert_eq!(log.total(), 0);
        assert_eq!(log.slots().count(), 3);
    }

    #[test]
    fn test_window_log_minimum_length() {
        let mut log = SlidingWindowLog::new(0);
        assert_eq!(log.window_seconds(), 1);
        log.record();
        assert_eq!(log.total(), 1);
        log.advance();
        assert_eq!(log.total(), 0);
    }

    #[test]
    fn test_window_log_total_tracks_slots() {
        let mut log = SlidingWindowLog::new(5);
        for step in 0..40u32 {
            for _ in 0..(step % 3) {
                log.record();
            }
            assert_eq!(log.total(), log.slots().sum::<usize>());
            log.advance();
            assert_eq!(log.total(), log.slots().sum::<usize>());
        }
    }

    #[test]
    fn test_window_log_huge_window() {
        let mut log = SlidingWindowLog::new(i64::MAX as usize);
        assert_eq!(log.window_seconds(), i64::MAX as usize);
        log.record();
        for _ in 0..1_000 {
            log.advance();
        }
        log.record();
        assert_eq!(log.total(), 2);
    }

    #[test]
    fn test_huge_window_holds_until_reset() {
        let mut state = ThrottleState::new(&ThrottleConfig::new(1, i64::MAX));
        for i in 0..3 {
            state.push(i);
        }
        assert_eq!(drain_all(&mut state), vec![0]);
        for _ in 0..100 {
            state.advance();
        }
        assert!(drain_all(&mut state).is_empty());
        assert_eq!(state.pending_len(), 2);

        state.reset(&ThrottleConfig::new(2, 1));
        assert_eq!(drain_all(&mut state), vec![1, 2]);
    }

    #[test]
    fn test_drain_under_capacity_releases_all() {
        let mut state = ThrottleState::new(&ThrottleConfig::new(5, 10));
        for i in 0..5 {
            state.push(i);
        }
        assert_eq!(drain_all(&mut state), vec![0, 1, 2, 3, 4]);
        assert_eq!(state.window_usage(), 5);
        assert_eq!(state.pending_len(), 0);
        assert!(!state.has_capacity());
    }

    #[test]
    fn test_drain_over_capacity_holds_remainder() {
        let mut state = ThrottleState::new(&ThrottleConfig::new(2, 4));
        for i in 0..3 {
            state.push(i);
        }
        assert_eq!(drain_all(&mut state), vec![0, 1]);
        assert_eq!(state.pending_len(), 1);

        // Usage ages out only after the full window has passed
        for _ in 0..3 {
            state.advance();
            assert!(drain_all(&mut state).is_empty());
        }
        state.advance();
        assert_eq!(drain_all(&mut state), vec![2]);
        assert_eq!(state.pending_len(), 0);
    }

    #[test]
    fn test_window_never_exceeds_ceiling() {
        let mut state = ThrottleState::<u32>::new(&ThrottleConfig::new(3, 5));
        let mut released = Vec::new();
        for i in 0..20 {
            state.push(i);
            state.drain_with(|item| released.push(item));
            assert!(state.window_usage() <= 3);
            state.advance();
        }
        // FIFO: released items are a prefix of the submission order
        let expected: Vec<u32> = (0..released.len() as u32).collect();
        assert_eq!(released, expected);
    }

    #[test]
    fn test_reset_clears_usage_and_keeps_pending() {
        let mut state = ThrottleState::new(&ThrottleConfig::new(1, 600));
        for i in 0..4 {
            state.push(i);
        }
        assert_eq!(drain_all(&mut state), vec![0]);

        state.reset(&ThrottleConfig::new(2, 3));
        assert_eq!(state.window_usage(), 0);
        assert_eq!(state.max_requests(), 2);
        assert_eq!(state.log().window_seconds(), 3);
        assert_eq!(drain_all(&mut state), vec![1, 2]);
        assert_eq!(state.pending_len(), 1);
    }
}
