//! Throttled search-instrumentation channel.
//!
//! A single-slot overwrite cell — `parking_lot::Mutex` guarding an
//! `Option<Record>` plus a `parking_lot::Condvar` to wake a waiting
//! consumer — satisfies "never block the search, latest wins" without
//! reaching for a bounded-queue channel crate, which would backpressure
//! the writer instead. Extends an Arc-wrapped-atomic style to a
//! condvar-backed mailbox, since a snapshot carries a full record rather
//! than a single bit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[cfg(feature = "logging")]
use log::trace;

use crate::search::{SearchResult, SearchSnapshot};

/// One record delivered over the channel, `type` made a Rust enum
/// instead of a string tag.
#[derive(Clone, Debug)]
pub enum Record {
    Snapshot(SearchSnapshot),
    Complete(SearchResult),
    Error { message: String, kind: ErrorKind },
}

/// Machine-readable error kind for the `error` record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    InvalidFen,
    IllegalMove,
    Internal,
}

struct Mailbox {
    pending: Mutex<Option<Record>>,
    condvar: Condvar,
    closed: AtomicBool,
}

/// The producer side, held by the search task. Not `Clone`: exactly one
/// writer owns a channel for the lifetime of one search, which keeps
/// `is_cancelled`'s `Arc::strong_count` check meaningful.
pub struct ChannelSender {
    mailbox: Arc<Mailbox>,
}

/// The consumer side. Not `Clone`: two concurrent searches on the same
/// channel are not supported, and symmetrically only one consumer reads
/// a given channel.
pub struct ChannelReceiver {
    mailbox: Arc<Mailbox>,
}

/// Open a fresh channel for one search.
#[must_use]
pub fn channel() -> (ChannelSender, ChannelReceiver) {
    let mailbox = Arc::new(Mailbox {
        pending: Mutex::new(None),
        condvar: Condvar::new(),
        closed: AtomicBool::new(false),
    });
    (ChannelSender { mailbox: mailbox.clone() }, ChannelReceiver { mailbox })
}

impl ChannelSender {
    /// Overwrite the pending slot and wake the consumer. Never blocks: if a
    /// snapshot is already waiting to be read, it is silently replaced.
    /// The terminal record (`Complete`/`Error`) is never passed here after
    /// `close()` — callers publish it via `finish`.
    pub fn publish(&self, record: Record) {
        let mut slot = self.mailbox.pending.lock();
        #[cfg(feature = "logging")]
        if slot.is_some() {
            trace!("coalescing pending snapshot: a newer one arrived before it was read");
        }
        *slot = Some(record);
        self.mailbox.condvar.notify_one();
    }

    /// Publish the one terminal record for this search and mark the
    /// channel closed. Unlike `publish`, this record is never coalesced
    /// away by a later write — callers only call this once, at the very
    /// end of a search.
    pub fn finish(&self, record: Record) {
        self.publish(record);
        self.mailbox.closed.store(true, Ordering::Release);
    }

    /// Whether the consumer has closed its end. The consumer may cancel
    /// at any time by closing the channel.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        Arc::strong_count(&self.mailbox) == 1
    }
}

impl ChannelReceiver {
    /// Block until a record is available or the channel is closed with
    /// nothing pending, returning `None` once fully drained.
    pub fn recv(&self) -> Option<Record> {
        let mut slot = self.mailbox.pending.lock();
        loop {
            if let Some(record) = slot.take() {
                return Some(record);
            }
            if self.mailbox.closed.load(Ordering::Acquire) {
                return None;
            }
            self.mailbox.condvar.wait(&mut slot);
        }
    }

    /// Non-blocking poll, for consumers driven by an external event loop.
    #[must_use]
    pub fn try_recv(&self) -> Option<Record> {
        self.mailbox.pending.lock().take()
    }

    /// Block up to `timeout` for the next record.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Record> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.mailbox.pending.lock();
        loop {
            if let Some(record) = slot.take() {
                return Some(record);
            }
            if self.mailbox.closed.load(Ordering::Acquire) {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let result = self.mailbox.condvar.wait_for(&mut slot, deadline - now);
            if result.timed_out() {
                return slot.take();
            }
        }
    }
}

/// Non-blocking throttle applied by the search loop's publication points:
/// at most one snapshot per `snapshot_interval_ms`. Construction clamps
/// the interval to a 50ms floor.
pub struct Throttle {
    interval: Duration,
    last_emitted: Option<Instant>,
}

impl Throttle {
    #[must_use]
    pub fn new(interval_ms: u64) -> Self {
        let floored = interval_ms.max(crate::config::MIN_SNAPSHOT_INTERVAL_MS);
        Throttle { interval: Duration::from_millis(floored), last_emitted: None }
    }

    /// Whether a snapshot offered right now should be forwarded to the
    /// channel. Updates internal state as a side effect of answering
    /// "yes" — call this exactly once per candidate snapshot.
    pub fn should_emit(&mut self, now: Instant) -> bool {
        match self.last_emitted {
            None => {
                self.last_emitted = Some(now);
                true
            }
            Some(last) if now.duration_since(last) >= self.interval => {
                self.last_emitted = Some(now);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn terminal_record_is_never_dropped() {
        let (tx, rx) = channel();
        tx.finish(Record::Error { message: "boom".into(), kind: ErrorKind::Internal });
        match rx.recv() {
            Some(Record::Error { kind, .. }) => assert_eq!(kind, ErrorKind::Internal),
            other => panic!("expected terminal error record, got {other:?}"),
        }
        assert!(rx.recv().is_none());
    }

    #[test]
    fn coalesces_rapid_writes() {
        let (tx, rx) = channel();
        for kind in [ErrorKind::InvalidFen, ErrorKind::IllegalMove, ErrorKind::Internal] {
            tx.publish(Record::Error { message: "x".into(), kind });
        }
        tx.finish(Record::Error { message: "done".into(), kind: ErrorKind::Internal });
        // Only the last write before a read survives; exactly one record
        // is observed before the channel reports closed.
        let first = rx.recv();
        assert!(first.is_some());
        assert!(rx.recv().is_none());
    }

    #[test]
    fn consumer_blocks_until_producer_publishes() {
        let (tx, rx) = channel();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.finish(Record::Error { message: "late".into(), kind: ErrorKind::Internal });
        });
        assert!(rx.recv().is_some());
        handle.join().unwrap();
    }

    #[test]
    fn throttle_rate_limits_within_window() {
        let mut throttle = Throttle::new(1000);
        let t0 = Instant::now();
        assert!(throttle.should_emit(t0));
        assert!(!throttle.should_emit(t0 + Duration::from_millis(10)));
        assert!(throttle.should_emit(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn throttle_floors_interval_at_50ms() {
        let mut throttle = Throttle::new(1);
        assert_eq!(throttle.interval, Duration::from_millis(50));
    }
}
