// Copyright (C) 2025 Category Labs, Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Writer/reader handoff around a [`BipBuffer`].
//!
//! The buffer itself is unsynchronized. This module supplies the external
//! serialization it expects: one lock around the buffer and a notification
//! the writer raises after publishing, so exactly one writer thread and one
//! reader thread can share it.

use crate::{
    buffer::BipBuffer,
    error::BipBufError,
    header::{likely, FrameHeader},
    sync::{notification::Notification, Arc, AtomicBool, AtomicU64, Mutex, Ordering},
    trace_macro::bipbuf_trace,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeupStrategy {
    /// Notify the reader after every commit.
    Forced,
    /// Never notify. The writer calls [`Writer::notify`] itself.
    NoWakeup,
}

struct Shared<H: FrameHeader> {
    buffer: Mutex<BipBuffer<H>>,
    notification: Notification,
    dropped: AtomicU64,
    writer_closed: AtomicBool,
    reader_closed: AtomicBool,
}

/// Splits `buffer` into its writing and reading halves.
pub fn channel<H: FrameHeader>(
    buffer: BipBuffer<H>,
    wakeup_strategy: WakeupStrategy,
) -> (Writer<H>, Reader<H>) {
    let shared = Arc::new(Shared {
        buffer: Mutex::new(buffer),
        notification: Notification::new(),
        dropped: AtomicU64::new(0),
        writer_closed: AtomicBool::new(false),
        reader_closed: AtomicBool::new(false),
    });

    let writer = Writer {
        shared: shared.clone(),
        wakeup_strategy,
    };
    (writer, Reader { shared })
}

pub struct Writer<H: FrameHeader = u16> {
    shared: Arc<Shared<H>>,
    wakeup_strategy: WakeupStrategy,
}

impl<H: FrameHeader> Writer<H> {
    /// Reserves `size` bytes, lets `fill` write them in place and commits
    /// the length `fill` returns (clamped to `size`).
    ///
    /// Returns the committed length. A return of 0 means `fill` chose to
    /// publish nothing.
    ///
    /// # Errors
    /// Returns [`BipBufError::Closed`] once the reader is gone, and the
    /// reservation errors of [`BipBuffer::try_reserve`] otherwise.
    pub fn write_with<F>(&self, size: usize, fill: F) -> Result<usize, BipBufError>
    where
        F: FnOnce(&mut [u8]) -> usize,
    {
        if self.shared.reader_closed.load(Ordering::Acquire) {
            return Err(BipBufError::Closed);
        }

        let committed = {
            let mut buffer = self.shared.buffer.lock();
            buffer.try_reserve(size)?;
            let mut pending = PendingWrite {
                buffer: &mut buffer,
                settled: false,
            };
            let used = fill(pending.span());
            pending.commit(used)
        };

        bipbuf_trace!(size = size, committed = committed, "writer commit");

        if likely(committed > 0) {
            match self.wakeup_strategy {
                WakeupStrategy::Forced => self.shared.notification.notify(),
                WakeupStrategy::NoWakeup => {}
            }
        }
        Ok(committed)
    }

    /// Copies `data` into the buffer as one record.
    pub fn send(&self, data: &[u8]) -> Result<usize, BipBufError> {
        self.write_with(data.len(), |span| {
            span.copy_from_slice(data);
            data.len()
        })
    }

    /// Increment the dropped record counter.
    ///
    /// This should be called when a record is intentionally dropped because
    /// the buffer had no room for it.
    pub fn increment_dropped(&self) {
        self.shared.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Manually notify the reader.
    ///
    /// This can be used with `WakeupStrategy::NoWakeup` to control when
    /// the reader is woken.
    pub fn notify(&self) {
        self.shared.notification.notify();
    }

    pub fn wakeup_strategy(&self) -> WakeupStrategy {
        self.wakeup_strategy
    }
}

impl<H: FrameHeader> Drop for Writer<H> {
    fn drop(&mut self) {
        self.shared.writer_closed.store(true, Ordering::Release);
        self.shared.notification.notify();
    }
}

/// Outstanding reservation held while the caller fills it. Dropped without
/// a commit (a panicking fill), it discards the reservation so the buffer
/// stays usable.
struct PendingWrite<'a, H: FrameHeader> {
    buffer: &'a mut BipBuffer<H>,
    settled: bool,
}

impl<H: FrameHeader> PendingWrite<'_, H> {
    fn span(&mut self) -> &mut [u8] {
        self.buffer.reserved_mut()
    }

    fn commit(mut self, used: usize) -> usize {
        self.settled = true;
        self.buffer.commit(used)
    }
}

impl<H: FrameHeader> Drop for PendingWrite<'_, H> {
    fn drop(&mut self) {
        if !self.settled {
            self.buffer.discard();
        }
    }
}

pub struct Reader<H: FrameHeader = u16> {
    shared: Arc<Shared<H>>,
}

impl<H: FrameHeader> Reader<H> {
    /// Copies the oldest record into `out` without blocking. `Ok(0)` means
    /// nothing was available.
    pub fn try_read(&self, out: &mut [u8]) -> Result<usize, BipBufError> {
        self.shared.buffer.lock().read(out)
    }

    /// Hands the oldest record to `f` in place and consumes it.
    pub fn try_read_with<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&[u8]) -> R,
    {
        let mut buffer = self.shared.buffer.lock();
        let record = buffer.next_record()?;
        Some(f(&record))
    }

    /// Reads the next record, waiting for the writer when the buffer is
    /// empty. Returns `Ok(None)` once the writer is gone and every record
    /// has been read.
    pub fn read_blocking(&self, out: &mut [u8]) -> Result<Option<usize>, BipBufError> {
        loop {
            let n = self.try_read(out)?;
            if n > 0 {
                return Ok(Some(n));
            }
            if self.is_closed() {
                // Commits made before the close are visible now.
                let n = self.try_read(out)?;
                return Ok((n > 0).then_some(n));
            }
            self.wait();
        }
    }

    /// Blocks until the writer notifies or goes away.
    pub fn wait(&self) {
        self.shared.notification.wait();
    }

    /// True once the writer has been dropped.
    pub fn is_closed(&self) -> bool {
        self.shared.writer_closed.load(Ordering::Acquire)
    }

    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Bytes of committed, unread records, headers included.
    pub fn available_bytes(&self) -> usize {
        self.shared.buffer.lock().committed_bytes()
    }
}

impl<H: FrameHeader> Drop for Reader<H> {
    fn drop(&mut self) {
        self.shared.reader_closed.store(true, Ordering::Release);
    }
}
