use crate::consts::RESET_BURST;
use std::fmt;
use std::time::Duration;

/// Match key of an idle binding.
///
/// `Reset` sorts before every timeout and only matches a wake-up, never a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum IdleThreshold {
    Reset,
    After(u64),
}

impl fmt::Display for IdleThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdleThreshold::Reset => f.write_str("idle reset"),
            IdleThreshold::After(secs) => {
                write!(f, "{}h {}m {}s", secs / 3600, secs % 3600 / 60, secs % 60)
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct IdleTracker {
    tick: u64,
    accumulated: u64,
}

impl IdleTracker {
    pub(crate) fn new(tick: u64) -> Self {
        Self {
            tick,
            accumulated: 0,
        }
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.tick)
    }

    #[cfg(test)]
    pub(crate) fn accumulated(&self) -> u64 {
        self.accumulated
    }

    pub(crate) fn tick(&mut self) -> IdleThreshold {
        self.accumulated = self.accumulated.saturating_add(self.tick);
        IdleThreshold::After(self.accumulated)
    }

    pub(crate) fn reset(&mut self) -> IdleThreshold {
        self.accumulated = 0;
        IdleThreshold::Reset
    }

    pub(crate) fn is_wake(elapsed: Duration) -> bool {
        elapsed > RESET_BURST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_accumulates() {
        let mut idle = IdleTracker::new(60);
        assert_eq!(idle.tick(), IdleThreshold::After(60));
        assert_eq!(idle.tick(), IdleThreshold::After(120));
        assert_eq!(idle.accumulated(), 120);
        assert_eq!(idle.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_reset_zeroes() {
        let mut idle = IdleTracker::new(30);
        idle.tick();
        idle.tick();
        assert_eq!(idle.reset(), IdleThreshold::Reset);
        assert_eq!(idle.accumulated(), 0);
        assert_eq!(idle.tick(), IdleThreshold::After(30));
    }

    #[test]
    fn test_wake_threshold() {
        assert!(!IdleTracker::is_wake(Duration::from_millis(10)));
        assert!(!IdleTracker::is_wake(Duration::from_millis(750)));
        assert!(IdleTracker::is_wake(Duration::from_millis(751)));
        assert!(IdleTracker::is_wake(Duration::from_secs(2)));
    }

    #[test]
    fn test_reset_sorts_first() {
        assert!(IdleThreshold::Reset < IdleThreshold::After(0));
        assert!(IdleThreshold::After(60) < IdleThreshold::After(3600));
    }

    #[test]
    fn test_display() {
        assert_eq!(IdleThreshold::After(5430).to_string(), "1h 30m 30s");
        assert_eq!(IdleThreshold::Reset.to_string(), "idle reset");
    }
}
