/// Consecutive "can't reach" signals tolerated before a run is halted
pub const MAX_FAILURES: u32 = 10;

/// Counts consecutive adverse signals. Owned by `ControllerState`, so all
/// access is already serialized by the state lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureTracker {
    count: u32,
    threshold: u32,
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self::new(MAX_FAILURES)
    }
}

impl FailureTracker {
    pub fn new(threshold: u32) -> Self {
        Self { count: 0, threshold: threshold.max(1) }
    }

    /// Record one adverse signal. Returns true once the threshold is reached.
    pub fn on_adverse_signal(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.count >= self.threshold
    }

    pub fn on_success_signal(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trips_exactly_at_threshold() {
        let mut t = FailureTracker::default();
        for i in 1..MAX_FAILURES {
            assert!(!t.on_adverse_signal(), "tripped early at {}", i);
        }
        assert!(t.on_adverse_signal());
        assert_eq!(t.count(), MAX_FAILURES);
    }

    #[test]
    fn test_success_requires_full_count_again() {
        let mut t = FailureTracker::new(3);
        t.on_adverse_signal();
        t.on_adverse_signal();
        t.on_success_signal();
        assert_eq!(t.count(), 0);
        assert!(!t.on_adverse_signal());
        assert!(!t.on_adverse_signal());
        assert!(t.on_adverse_signal());
    }

    #[test]
    fn test_zero_threshold_is_one() {
        let mut t = FailureTracker::new(0);
        assert_eq!(t.threshold(), 1);
        assert!(t.on_adverse_signal());
    }
}
