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

//! Record framing and small internal helpers.

use std::mem::size_of;

#[inline]
#[cold]
fn cold() {}

#[allow(unused)]
#[inline(always)]
pub(crate) fn likely(b: bool) -> bool {
    if !b {
        cold();
    }
    b
}

#[inline(always)]
pub(crate) fn unlikely(b: bool) -> bool {
    if b {
        cold();
    }
    b
}

/// Fixed-width length prefix written ahead of every record payload.
///
/// The width is chosen at compile time through the buffer's type parameter.
/// Headers are stored in native byte order; the backing store never leaves
/// the process.
pub trait FrameHeader: Copy + Send + Sync + 'static {
    /// Bytes occupied by the header in the backing store.
    const WIDTH: usize;
    /// Largest payload length the header can describe.
    const MAX_LEN: usize;

    /// Writes `len` into `dst`, which is exactly `WIDTH` bytes.
    fn encode(len: usize, dst: &mut [u8]);

    /// Reads a length back from `src`, which is exactly `WIDTH` bytes.
    fn decode(src: &[u8]) -> usize;
}

macro_rules! impl_frame_header {
    ($($ty:ty),*) => {
        $(
            impl FrameHeader for $ty {
                const WIDTH: usize = size_of::<$ty>();
                const MAX_LEN: usize = <$ty>::MAX as usize;

                #[inline(always)]
                fn encode(len: usize, dst: &mut [u8]) {
                    debug_assert!(len <= Self::MAX_LEN);
                    dst.copy_from_slice(&(len as $ty).to_ne_bytes());
                }

                #[inline(always)]
                fn decode(src: &[u8]) -> usize {
                    let mut raw = [0u8; size_of::<$ty>()];
                    raw.copy_from_slice(src);
                    <$ty>::from_ne_bytes(raw) as usize
                }
            }
        )*
    };
}

impl_frame_header!(u16, u32);
