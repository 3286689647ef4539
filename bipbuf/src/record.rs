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

use crate::{buffer::BipBuffer, header::FrameHeader};
use std::ops::Deref;

/// A committed record borrowed in place from a [`BipBuffer`].
///
/// Dropping the record consumes it.
pub struct Record<'a, H: FrameHeader = u16> {
    buffer: &'a mut BipBuffer<H>,
    start: usize,
    len: usize,
}

impl<'a, H: FrameHeader> Record<'a, H> {
    pub(crate) fn new(buffer: &'a mut BipBuffer<H>, start: usize, len: usize) -> Self {
        Record { buffer, start, len }
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buffer.payload(self.start, self.len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<'a, H: FrameHeader> Drop for Record<'a, H> {
    fn drop(&mut self) {
        self.buffer.consume(H::WIDTH + self.len);
    }
}

impl<'a, H: FrameHeader> Deref for Record<'a, H> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}
