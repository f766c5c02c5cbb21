//! Deferred actions keyed on the UI clock (milliseconds).
//!
//! Stands in for `setTimeout`: the shell calls `drain_due(now)` from its
//! frame or tick callback and acts on whatever comes back.

/// A scheduled entry. `seq` breaks ties so equal due times fire in the
/// order they were scheduled.
#[derive(Debug, Clone)]
struct Entry<T> {
    due_ms: f64,
    seq: u64,
    item: T,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        TimerQueue {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Schedule `item` to become due at `due_ms`.
    pub fn schedule(&mut self, due_ms: f64, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let idx = self
            .entries
            .iter()
            .position(|e| e.due_ms > due_ms)
            .unwrap_or(self.entries.len());
        self.entries.insert(idx, Entry { due_ms, seq, item });
    }

    /// Remove and return every item due at or before `now_ms`, earliest first.
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<T> {
        let split = self
            .entries
            .iter()
            .position(|e| e.due_ms > now_ms)
            .unwrap_or(self.entries.len());
        self.entries.drain(..split).map(|e| e.item).collect()
    }

    /// Due time of the next entry, if any.
    pub fn next_due(&self) -> Option<f64> {
        self.entries.first().map(|e| e.due_ms)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = (f64, &T)> {
        self.entries.iter().map(|e| (e.due_ms, &e.item))
    }

    #[cfg(test)]
    fn is_ordered(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| (w[0].due_ms, w[0].seq) <= (w[1].due_ms, w[1].seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_fires_early() {
        let mut q = TimerQueue::new();
        q.schedule(500.0, "stop");
        assert!(q.drain_due(499.9).is_empty());
        assert_eq!(q.len(), 1);
        assert_eq!(q.drain_due(500.0), vec!["stop"]);
        assert!(q.is_empty());
    }

    #[test]
    fn drains_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(300.0, 'c');
        q.schedule(100.0, 'a');
        q.schedule(200.0, 'b');
        q.schedule(100.0, 'a');
        assert!(q.is_ordered());
        assert_eq!(q.next_due(), Some(100.0));
        assert_eq!(q.drain_due(250.0), vec!['a', 'a', 'b']);
        assert_eq!(q.drain_due(1000.0), vec!['c']);
    }

    #[test]
    fn equal_due_times_keep_schedule_order() {
        let mut q = TimerQueue::new();
        for i in 0..5 {
            q.schedule(10.0, i);
        }
        assert_eq!(q.drain_due(10.0), vec![0, 1, 2, 3, 4]);
    }
}
