// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-counter settlement tracking for the print gate.

/// Counts settled resources against a total captured when observation starts.
///
/// `check` is evaluated both right after attaching (resources that settled
/// synchronously) and after every settlement event.  It reports readiness at
/// most once, so the print command cannot be issued twice.
#[derive(Debug, Clone)]
pub struct SettlementCounter {
    total: usize,
    settled: usize,
    fired: bool,
}

impl SettlementCounter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            settled: 0,
            fired: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn settled(&self) -> usize {
        self.settled
    }

    pub fn pending(&self) -> usize {
        self.total.saturating_sub(self.settled)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Record one settlement (load or error). Extra settlements beyond the
    /// total are ignored.
    pub fn settle(&mut self) {
        if self.settled < self.total {
            self.settled += 1;
        }
    }

    /// `true` the first time every resource has settled, `false` otherwise.
    pub fn check(&mut self) -> bool {
        if self.fired || self.settled < self.total {
            return false;
        }
        self.fired = true;
        true
    }

    /// Fire regardless of pending resources (external timeout policy).
    /// Returns `false` if already fired.
    pub fn force(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_total_fires_on_first_check() {
        let mut counter = SettlementCounter::new(0);
        assert!(counter.check());
        assert!(!counter.check());
    }

    #[test]
    fn fires_once_after_last_settlement() {
        let mut counter = SettlementCounter::new(3);
        counter.settle();
        assert!(!counter.check());
        counter.settle();
        assert!(!counter.check());
        counter.settle();
        assert!(counter.check());
        counter.settle();
        assert!(!counter.check());
        assert_eq!(counter.settled(), 3);
    }

    #[test]
    fn synchronous_settlement_is_seen_at_attach() {
        let mut counter = SettlementCounter::new(2);
        counter.settle();
        counter.settle();
        // No further event will arrive; the attach-time check must fire.
        assert!(counter.check());
    }

    #[test]
    fn force_fires_only_if_not_fired() {
        let mut counter = SettlementCounter::new(2);
        counter.settle();
        assert!(counter.force());
        assert_eq!(counter.pending(), 1);
        counter.settle();
        assert!(!counter.check());
        assert!(!counter.force());
    }
}
