//! Background row production.
//!
//! Each [`RowIter`] owns one producer thread that decodes a worksheet and
//! hands rows over through a single-slot rendezvous, so the producer is
//! never more than one row ahead of the consumer.
//!
//! A producer parked on a handoff wakes when the consumer takes the row,
//! when the consumer goes away, or within [`CLOSE_POLL`] of the workbook
//! being closed.

use super::rows::{RowDecoder, SheetTables};
use crate::error::Error;
use crate::model::Row;
use std::io::{BufReader, Read, Seek};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use zip::result::ZipError;
use zip::ZipArchive;

/// Iterator over the rows of one sheet.
///
/// Dropping the iterator (or calling [`RowIter::close`]) stops the
/// producer and waits for it to exit. After a terminal error row, or once
/// the owning workbook is closed, the iterator is exhausted.
#[derive(Debug)]
pub struct RowIter {
    pending: Option<Row>,
    receiver: Option<RowReceiver>,
    producer: Option<JoinHandle<()>>,
    closed: Arc<AtomicBool>,
}

/// Everything a producer thread needs to decode a sheet.
pub(crate) struct ProducerJob<R> {
    pub sheet: String,
    pub member: String,
    pub archive: ZipArchive<R>,
    pub tables: Arc<SheetTables>,
    pub closed: Arc<AtomicBool>,
    pub active: Arc<AtomicUsize>,
}

/// How often a producer waiting on its consumer re-checks whether the
/// workbook was closed.
const CLOSE_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct Slot {
    row: Option<Row>,
    producer_done: bool,
    consumer_gone: bool,
}

/// One-row rendezvous between a producer and its iterator.
#[derive(Debug, Default)]
struct Handoff {
    slot: Mutex<Slot>,
    changed: Condvar,
}

impl Handoff {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer end of a [`Handoff`]. Dropping it ends the stream.
struct RowSender {
    handoff: Arc<Handoff>,
    closed: Arc<AtomicBool>,
}

impl RowSender {
    /// Hand `row` to the consumer and wait until it is taken.
    ///
    /// Returns `false` when the consumer went away or the workbook was
    /// closed; the row is discarded and the producer should stop.
    fn send(&self, row: Row) -> bool {
        let mut slot = self.handoff.lock();
        if slot.consumer_gone {
            return false;
        }
        slot.row = Some(row);
        self.handoff.changed.notify_all();

        loop {
            let (guard, _) = self
                .handoff
                .changed
                .wait_timeout_while(slot, CLOSE_POLL, |s| s.row.is_some() && !s.consumer_gone)
                .unwrap_or_else(PoisonError::into_inner);
            slot = guard;
            if slot.consumer_gone {
                return false;
            }
            if slot.row.is_none() {
                return true;
            }
            if self.closed.load(Ordering::Acquire) {
                slot.row = None;
                return false;
            }
        }
    }
}

impl Drop for RowSender {
    fn drop(&mut self) {
        self.handoff.lock().producer_done = true;
        self.handoff.changed.notify_all();
    }
}

/// Consumer end of a [`Handoff`]. Dropping it releases a waiting producer.
#[derive(Debug)]
struct RowReceiver {
    handoff: Arc<Handoff>,
}

impl RowReceiver {
    /// Wait for the next row; `None` once the producer has exited.
    fn recv(&self) -> Option<Row> {
        let slot = self.handoff.lock();
        let mut slot = self
            .handoff
            .changed
            .wait_while(slot, |s| s.row.is_none() && !s.producer_done)
            .unwrap_or_else(PoisonError::into_inner);
        let row = slot.row.take();
        self.handoff.changed.notify_all();
        row
    }
}

impl Drop for RowReceiver {
    fn drop(&mut self) {
        let mut slot = self.handoff.lock();
        slot.consumer_gone = true;
        slot.row = None;
        drop(slot);
        self.handoff.changed.notify_all();
    }
}

fn handoff(closed: Arc<AtomicBool>) -> (RowSender, RowReceiver) {
    let handoff = Arc::new(Handoff::default());
    (
        RowSender {
            handoff: Arc::clone(&handoff),
            closed,
        },
        RowReceiver { handoff },
    )
}

/// Decrements the live producer count when the producer exits, however it
/// exits.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(active)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RowIter {
    /// Start a producer thread for a sheet.
    pub(crate) fn spawn<R>(job: ProducerJob<R>) -> Self
    where
        R: Read + Seek + Send + 'static,
    {
        let closed = Arc::clone(&job.closed);
        let (sender, receiver) = handoff(Arc::clone(&closed));
        let guard = ActiveGuard::new(Arc::clone(&job.active));

        let spawned = thread::Builder::new()
            .name(format!("unxlsx-rows-{}", job.sheet))
            .spawn(move || {
                let _guard = guard;
                produce(job, sender);
            });

        match spawned {
            Ok(handle) => Self {
                pending: None,
                receiver: Some(receiver),
                producer: Some(handle),
                closed,
            },
            Err(err) => Self::single(Row::failed(0, Error::Io(err)), closed),
        }
    }

    /// An iterator yielding exactly one row, without a producer.
    pub(crate) fn single(row: Row, closed: Arc<AtomicBool>) -> Self {
        Self {
            pending: Some(row),
            receiver: None,
            producer: None,
            closed,
        }
    }

    /// Stop reading: disconnect from the producer and wait for it to exit.
    ///
    /// Idempotent. Subsequent calls to `next` return `None`.
    pub fn close(&mut self) {
        self.pending = None;
        // Disconnect first so a producer parked in `send` wakes up.
        self.receiver = None;
        if let Some(handle) = self.producer.take() {
            if handle.join().is_err() {
                log::warn!("row producer panicked");
            }
        }
    }

    /// Whether the producer thread is still alive.
    pub fn is_running(&self) -> bool {
        self.producer
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Iterator for RowIter {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if let Some(row) = self.pending.take() {
            return Some(row);
        }
        if self.closed.load(Ordering::Acquire) {
            self.close();
            return None;
        }

        let received = self.receiver.as_ref()?.recv();
        if received.is_none() {
            self.close();
        }
        received
    }
}

impl Drop for RowIter {
    fn drop(&mut self) {
        self.close();
    }
}

fn produce<R: Read + Seek>(job: ProducerJob<R>, sender: RowSender) {
    let ProducerJob {
        sheet,
        member,
        mut archive,
        tables,
        closed,
        ..
    } = job;
    log::trace!("row producer for sheet {:?} started", sheet);

    let entry = match archive.by_name(&member) {
        Ok(entry) => entry,
        Err(err) => {
            let err = match err {
                ZipError::FileNotFound => Error::MissingComponent(member),
                other => Error::from(other),
            };
            sender.send(Row::failed(0, err));
            return;
        }
    };

    for row in RowDecoder::new(BufReader::new(entry), tables) {
        if closed.load(Ordering::Acquire) {
            log::trace!("workbook closed, stopping producer for sheet {:?}", sheet);
            return;
        }
        if !sender.send(row) {
            log::trace!("row consumer for sheet {:?} went away", sheet);
            return;
        }
    }

    log::trace!("row producer for sheet {:?} finished", sheet);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handoff_waits_for_consumer() {
        let closed = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = handoff(closed);

        let producer = thread::spawn(move || (sender.send(Row::new(1, Vec::new())), sender));
        assert_eq!(receiver.recv().map(|r| r.index), Some(1));
        let (delivered, sender) = producer.join().unwrap();
        assert!(delivered);

        drop(sender);
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn test_closed_flag_releases_waiting_sender() {
        let closed = Arc::new(AtomicBool::new(false));
        let (sender, _receiver) = handoff(Arc::clone(&closed));

        let producer = thread::spawn(move || sender.send(Row::new(1, Vec::new())));
        thread::sleep(CLOSE_POLL * 3);
        closed.store(true, Ordering::Release);

        assert!(!producer.join().unwrap());
    }

    #[test]
    fn test_dropped_receiver_releases_sender() {
        let (sender, receiver) = handoff(Arc::new(AtomicBool::new(false)));
        drop(receiver);
        assert!(!sender.send(Row::new(1, Vec::new())));
    }
}
