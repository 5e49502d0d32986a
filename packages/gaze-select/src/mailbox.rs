// Single-slot sample mailbox
//
// The ingestion task overwrites one slot per channel; the engine takes a
// snapshot once per tick. Intermediate samples between two snapshots are
// dropped on purpose: the engine only ever wants the newest one.

use crate::types::{BlinkEvent, Sample};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// One overwrite-on-write slot
#[derive(Debug)]
pub struct Slot<T> {
    value: Mutex<Option<T>>,
    writes: AtomicU64,
    overwritten: AtomicU64,
}

impl<T: Copy> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Slot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            writes: AtomicU64::new(0),
            overwritten: AtomicU64::new(0),
        }
    }

    /// Replace the slot content, last write wins
    pub fn post(&self, value: T) {
        let previous = self.value.lock().replace(value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        if previous.is_some() {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take the value if one arrived since the last take
    pub fn take(&self) -> Option<T> {
        self.value.lock().take()
    }

    /// Look at the pending value without consuming it
    pub fn peek(&self) -> Option<T> {
        *self.value.lock()
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Samples that were replaced before anyone read them
    pub fn overwritten(&self) -> u64 {
        self.overwritten.load(Ordering::Relaxed)
    }
}

/// Fresh samples for one tick. `None` means nothing new arrived on that
/// channel, which the engine treats the same as a stale tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MailboxSnapshot {
    pub gaze: Option<Sample>,
    pub blink: Option<BlinkEvent>,
    pub head: Option<Sample>,
}

impl MailboxSnapshot {
    pub fn is_empty(&self) -> bool {
        self.gaze.is_none() && self.blink.is_none() && self.head.is_none()
    }
}

/// Latest sample per channel, shared between ingestion and the tick loop
#[derive(Debug, Default)]
pub struct SampleMailbox {
    gaze: Slot<Sample>,
    blink: Slot<BlinkEvent>,
    head: Slot<Sample>,
}

impl SampleMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gaze position in normalised surface coordinates
    pub fn post_gaze(&self, sample: Sample) {
        self.gaze.post(sample);
    }

    pub fn post_blink(&self, event: BlinkEvent) {
        self.blink.post(event);
    }

    /// Head/pupil position in normalised eye-camera coordinates
    pub fn post_head(&self, sample: Sample) {
        self.head.post(sample);
    }

    /// Drain every channel once
    pub fn snapshot(&self) -> MailboxSnapshot {
        MailboxSnapshot {
            gaze: self.gaze.take(),
            blink: self.blink.take(),
            head: self.head.take(),
        }
    }

    /// (writes, overwritten) per channel: gaze, blink, head
    pub fn stats(&self) -> [(u64, u64); 3] {
        [
            (self.gaze.writes(), self.gaze.overwritten()),
            (self.blink.writes(), self.blink.overwritten()),
            (self.head.writes(), self.head.overwritten()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_last_write_wins() {
        let mailbox = SampleMailbox::new();
        mailbox.post_gaze(Sample::new(0.1, 0.1, 1.0));
        mailbox.post_gaze(Sample::new(0.2, 0.2, 2.0));

        let snapshot = mailbox.snapshot();
        assert_eq!(snapshot.gaze.map(|s| s.timestamp), Some(2.0));
        assert_eq!(mailbox.stats()[0], (2, 1));
    }

    #[test]
    fn test_snapshot_consumes() {
        let mailbox = SampleMailbox::new();
        mailbox.post_blink(BlinkEvent::onset(1.0));
        assert!(mailbox.snapshot().blink.is_some());
        assert!(mailbox.snapshot().is_empty());
    }

    #[test]
    fn test_channels_are_independent() {
        let mailbox = SampleMailbox::new();
        mailbox.post_head(Sample::new(0.5, 0.5, 1.0));
        let snapshot = mailbox.snapshot();
        assert!(snapshot.gaze.is_none());
        assert!(snapshot.blink.is_none());
        assert!(snapshot.head.is_some());
    }

    #[test]
    fn test_cross_thread_writer() {
        let mailbox = Arc::new(SampleMailbox::new());
        let writer = Arc::clone(&mailbox);
        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                writer.post_gaze(Sample::new(0.0, 0.0, i as f64));
            }
        });
        handle.join().unwrap();

        assert_eq!(mailbox.snapshot().gaze.map(|s| s.timestamp), Some(99.0));
    }
}
