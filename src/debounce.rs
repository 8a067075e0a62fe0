use std::time::{Duration, Instant};

/// Coalesces "document possibly changed" signals into a single recheck once
/// editing has paused for `delay`.
///
/// Every new signal pushes the deadline back, so a burst of edits results in
/// one recheck after the last of them.
#[derive(Debug, Clone)]
pub struct ChangeDebouncer {
    /// How long the document must stay quiet before a recheck is due
    pub delay: Duration,
    /// When the last change signal arrived
    pub last_change: Option<Instant>,
    /// Whether a recheck is owed
    pub pending: bool,
}

impl ChangeDebouncer {
    pub fn new(delay: Duration) -> Self {
        ChangeDebouncer {
            delay,
            last_change: None,
            pending: false,
        }
    }

    /// Record a change signal
    pub fn mark_changed(&mut self, now: Instant) {
        self.last_change = Some(now);
        self.pending = true;
    }

    /// Whether a recheck should run at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_change {
            Some(changed) if self.pending => now.saturating_duration_since(changed) >= self.delay,
            _ => false,
        }
    }

    /// Like [`is_due`](Self::is_due), but consumes the pending signal when it
    /// returns true.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.pending = false;
        true
    }

    /// Drop any pending signal, e.g. after the host wrote the document itself
    pub fn reset(&mut self) {
        self.last_change = None;
        self.pending = false;
    }

    /// Time left until the pending recheck is due, if one is pending
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let changed = self.last_change.filter(|_| self.pending)?;
        Some(self.delay.saturating_sub(now.saturating_duration_since(changed)))
    }
}

impl Default for ChangeDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_DEBOUNCE_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn test_new_is_idle() {
        let debouncer = ChangeDebouncer::new(DELAY);
        assert!(debouncer.last_change.is_none());
        assert!(!debouncer.pending);
        assert!(!debouncer.is_due(Instant::now()));
    }

    #[test]
    fn test_due_only_after_delay() {
        let start = Instant::now();
        let mut debouncer = ChangeDebouncer::new(DELAY);
        debouncer.mark_changed(start);

        assert!(!debouncer.is_due(start + Duration::from_millis(100)));
        assert!(debouncer.is_due(start + DELAY));
    }

    #[test]
    fn test_new_signal_pushes_deadline_back() {
        let start = Instant::now();
        let mut debouncer = ChangeDebouncer::new(DELAY);
        debouncer.mark_changed(start);
        debouncer.mark_changed(start + Duration::from_millis(400));

        assert!(!debouncer.is_due(start + Duration::from_millis(600)));
        assert!(debouncer.is_due(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_take_due_fires_once() {
        let start = Instant::now();
        let mut debouncer = ChangeDebouncer::new(DELAY);
        debouncer.mark_changed(start);

        let later = start + DELAY;
        assert!(debouncer.take_due(later));
        assert!(!debouncer.take_due(later));
        assert!(!debouncer.pending);
        assert_eq!(debouncer.remaining(later), None);

        // A later signal arms it again.
        debouncer.mark_changed(later);
        assert!(debouncer.take_due(later + DELAY));
    }

    #[test]
    fn test_remaining() {
        let start = Instant::now();
        let mut debouncer = ChangeDebouncer::new(DELAY);
        assert_eq!(debouncer.remaining(start), None);

        debouncer.mark_changed(start);
        assert_eq!(
            debouncer.remaining(start + Duration::from_millis(200)),
            Some(Duration::from_millis(300))
        );
        assert_eq!(debouncer.remaining(start + DELAY * 2), Some(Duration::ZERO));
    }

    #[test]
    fn test_reset_drops_pending() {
        let start = Instant::now();
        let mut debouncer = ChangeDebouncer::new(DELAY);
        debouncer.mark_changed(start);
        debouncer.reset();
        assert!(!debouncer.is_due(start + DELAY));
    }
}
