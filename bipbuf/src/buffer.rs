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

use crate::{
    error::BipBufError,
    header::{unlikely, FrameHeader},
    record::Record,
    state::{Mode, Reclaim, Regions},
    trace_macro::bipbuf_trace,
};
use std::marker::PhantomData;

/// Fixed-capacity bipartite buffer of length-framed records.
///
/// Writers claim space with [`reserve`](Self::reserve), fill the returned
/// span in place and publish it with [`commit`](Self::commit). Readers get
/// whole records back in commit order through [`read`](Self::read) or
/// [`next_record`](Self::next_record).
///
/// The buffer does no locking of its own. Every mutating operation takes
/// `&mut self`; see [`channel`](crate::channel) for a writer/reader pair
/// that serializes access across two threads.
pub struct BipBuffer<H: FrameHeader = u16> {
    store: Box<[u8]>,
    state: Regions,
    _header: PhantomData<fn() -> H>,
}

impl BipBuffer {
    /// Allocates a zeroed store of `capacity` bytes with 2-byte headers.
    pub fn new(capacity: usize) -> Result<Self, BipBufError> {
        Self::with_header(capacity)
    }
}

impl<H: FrameHeader> BipBuffer<H> {
    /// Allocates a zeroed store of `capacity` bytes framed with `H`.
    pub fn with_header(capacity: usize) -> Result<Self, BipBufError> {
        if capacity == 0 {
            return Err(BipBufError::ZeroCapacity);
        }

        let mut store = Vec::new();
        store
            .try_reserve_exact(capacity)
            .map_err(|_| BipBufError::AllocationFailed(capacity))?;
        store.resize(capacity, 0);

        Ok(BipBuffer {
            store: store.into_boxed_slice(),
            state: Regions::new(capacity),
            _header: PhantomData,
        })
    }

    pub fn capacity(&self) -> usize {
        self.store.len()
    }

    /// Largest payload a single reservation can ever hold.
    pub fn max_record_len(&self) -> usize {
        H::MAX_LEN.min(self.capacity().saturating_sub(H::WIDTH))
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn is_reserved(&self) -> bool {
        self.state.mode() != Mode::Idle
    }

    /// True when no committed record is waiting to be read.
    pub fn is_empty(&self) -> bool {
        self.state.front().is_none()
    }

    /// Bytes of committed, unread records, headers included.
    pub fn committed_bytes(&self) -> usize {
        self.state.readable()
    }

    /// Claims `size` bytes for a record and returns the span to fill.
    ///
    /// Returns `None` when a reservation is already outstanding, when `size`
    /// is zero or beyond the header range, or when no region has `size`
    /// plus header bytes of contiguous room.
    pub fn reserve(&mut self, size: usize) -> Option<&mut [u8]> {
        self.try_reserve(size).ok()
    }

    /// Like [`reserve`](Self::reserve) but reports why nothing was claimed.
    pub fn try_reserve(&mut self, size: usize) -> Result<&mut [u8], BipBufError> {
        if unlikely(size == 0) {
            return Err(BipBufError::ZeroSize);
        }
        if unlikely(size > H::MAX_LEN) {
            return Err(BipBufError::RecordTooLarge {
                size,
                max: H::MAX_LEN,
            });
        }
        if unlikely(self.is_reserved()) {
            return Err(BipBufError::AlreadyReserved);
        }

        self.reclaim();

        let len = size + H::WIDTH;
        let region = match self.state.select(len) {
            Ok(region) => region,
            Err(available) => {
                bipbuf_trace!(
                    size = size,
                    needed = len,
                    available = available,
                    "reserve failed: insufficient space"
                );
                return Err(BipBufError::InsufficientSpace {
                    needed: len,
                    available,
                });
            }
        };
        let offset = self.state.begin(region, len);

        bipbuf_trace!(region = ?region, offset = offset, size = size, "reserve");

        Ok(&mut self.store[offset + H::WIDTH..offset + len])
    }

    /// Publishes the outstanding reservation with a payload of `size` bytes.
    ///
    /// `size` is clamped to what was reserved. Without an outstanding
    /// reservation this is a no-op returning 0. Committing 0 bytes releases
    /// the reservation without publishing a record.
    pub fn commit(&mut self, size: usize) -> usize {
        match self.state.mode().reserved_len() {
            Some(len) => self.publish(size.min(len - H::WIDTH)),
            None => 0,
        }
    }

    /// Like [`commit`](Self::commit) but rejects a missing reservation or an
    /// oversized commit. A rejected commit leaves the reservation in place.
    pub fn try_commit(&mut self, size: usize) -> Result<usize, BipBufError> {
        let len = self
            .state
            .mode()
            .reserved_len()
            .ok_or(BipBufError::NoReservation)?;
        let reserved = len - H::WIDTH;
        if unlikely(size > reserved) {
            return Err(BipBufError::CommitExceedsReservation {
                requested: size,
                reserved,
            });
        }
        Ok(self.publish(size))
    }

    /// Abandons the outstanding reservation. Returns whether there was one.
    pub fn discard(&mut self) -> bool {
        let discarded = self.state.release();
        if discarded {
            bipbuf_trace!("reservation discarded");
        }
        discarded
    }

    fn publish(&mut self, size: usize) -> usize {
        let Some((offset, _)) = self.state.outstanding() else {
            return 0;
        };
        if size == 0 {
            self.state.release();
            return 0;
        }

        H::encode(size, &mut self.store[offset..offset + H::WIDTH]);
        self.state.finish(H::WIDTH + size);

        bipbuf_trace!(offset = offset, size = size, "commit");
        size
    }

    /// Copies the oldest record into `out` and consumes it.
    ///
    /// Returns `Ok(0)` when the buffer is empty. If `out` cannot hold the
    /// record, nothing is consumed.
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize, BipBufError> {
        let Some((start, len)) = self.front() else {
            return Ok(0);
        };
        if unlikely(out.len() < len) {
            return Err(BipBufError::OutputTooSmall {
                required: len,
                available: out.len(),
            });
        }

        out[..len].copy_from_slice(&self.store[start..start + len]);
        self.state.consume(H::WIDTH + len);

        bipbuf_trace!(offset = start - H::WIDTH, size = len, "read");
        Ok(len)
    }

    /// Borrows the oldest record in place. It is consumed when the returned
    /// [`Record`] is dropped.
    pub fn next_record(&mut self) -> Option<Record<'_, H>> {
        let (start, len) = self.front()?;
        Some(Record::new(self, start, len))
    }

    /// Payload length of the oldest record, without consuming it.
    pub fn peek_len(&self) -> Option<usize> {
        let at = self.state.front()?;
        Some(H::decode(&self.store[at..at + H::WIDTH]))
    }

    /// Payload offset and length of the front record after reclaiming.
    fn front(&mut self) -> Option<(usize, usize)> {
        self.reclaim();
        let at = self.state.front()?;
        let len = H::decode(&self.store[at..at + H::WIDTH]);
        Some((at + H::WIDTH, len))
    }

    fn reclaim(&mut self) {
        match self.state.normalize() {
            Reclaim::Swapped => {
                bipbuf_trace!(a = ?self.state.a(), "swapped region b into a");
            }
            Reclaim::Rewound => {
                bipbuf_trace!("rewound drained buffer");
            }
            Reclaim::None => {}
        }
    }

    pub(crate) fn payload(&self, start: usize, len: usize) -> &[u8] {
        &self.store[start..start + len]
    }

    /// Payload span of the outstanding reservation, empty when idle.
    pub(crate) fn reserved_mut(&mut self) -> &mut [u8] {
        match self.state.outstanding() {
            Some((offset, len)) => &mut self.store[offset + H::WIDTH..offset + len],
            None => &mut [],
        }
    }

    pub(crate) fn consume(&mut self, framed: usize) {
        self.state.consume(framed);
    }
}

impl<H: FrameHeader> std::fmt::Debug for BipBuffer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BipBuffer")
            .field("capacity", &self.capacity())
            .field("header_width", &H::WIDTH)
            .field("a", &self.state.a())
            .field("b", &self.state.b())
            .field("mode", &self.state.mode())
            .finish()
    }
}
