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

//! # bipbuf - Bipartite Record Buffer
//!
//! Fixed-capacity circular byte buffer for variable-length records, built
//! on the bip-buffer layout: two regions of one contiguous store, so every
//! record is contiguous and can be written in place.
//!
//! Each record is stored as a fixed-width length header followed by its
//! payload. Records come back whole, in the order they were committed.
//!
//! ## Writing Records
//!
//! Reserve space, fill the returned span, then commit:
//!
//! ```rust
//! use bipbuf::BipBuffer;
//!
//! let mut buf = BipBuffer::new(1024)?;
//!
//! let span = buf.reserve(5).expect("buffer has room");
//! span.copy_from_slice(b"hello");
//! assert_eq!(buf.commit(5), 5);
//! # Ok::<(), bipbuf::BipBufError>(())
//! ```
//!
//! Committing less than was reserved publishes only that much. Committing
//! more is clamped to the reservation. [`BipBuffer::try_reserve`] and
//! [`BipBuffer::try_commit`] report these cases as [`BipBufError`] instead.
//!
//! ## Reading Records
//!
//! ```rust
//! # use bipbuf::BipBuffer;
//! # let mut buf = BipBuffer::new(1024)?;
//! # buf.reserve(5).unwrap().copy_from_slice(b"hello");
//! # buf.commit(5);
//! let mut out = [0u8; 64];
//! let n = buf.read(&mut out)?;
//! assert_eq!(&out[..n], b"hello");
//! assert_eq!(buf.read(&mut out)?, 0); // empty
//! # Ok::<(), bipbuf::BipBufError>(())
//! ```
//!
//! Or borrow the record in place; it is consumed when dropped:
//!
//! ```rust
//! # use bipbuf::BipBuffer;
//! # let mut buf = BipBuffer::new(1024)?;
//! # buf.reserve(5).unwrap().copy_from_slice(b"hello");
//! # buf.commit(5);
//! if let Some(record) = buf.next_record() {
//!     assert_eq!(record.as_slice(), b"hello");
//! }
//! # Ok::<(), bipbuf::BipBufError>(())
//! ```
//!
//! ## Header Width
//!
//! The default header is a `u16`, limiting payloads to 65535 bytes. Use a
//! `u32` header for larger records:
//!
//! ```rust
//! use bipbuf::BipBuffer;
//!
//! let buf = BipBuffer::<u32>::with_header(1 << 20)?;
//! assert_eq!(buf.max_record_len(), (1 << 20) - 4);
//! # Ok::<(), bipbuf::BipBufError>(())
//! ```
//!
//! ## Sharing Between Threads
//!
//! The buffer is not synchronized. [`channel`] wraps it for one writer
//! thread and one reader thread:
//!
//! ```rust
//! use bipbuf::{channel, BipBuffer, WakeupStrategy};
//!
//! let (writer, reader) = channel(BipBuffer::new(4096)?, WakeupStrategy::Forced);
//!
//! let handle = std::thread::spawn(move || {
//!     for i in 0..10u32 {
//!         writer.send(&i.to_le_bytes()).unwrap();
//!     }
//! });
//!
//! let mut out = [0u8; 4];
//! let mut count = 0;
//! while let Some(n) = reader.read_blocking(&mut out)? {
//!     assert_eq!(u32::from_le_bytes(out), count);
//!     assert_eq!(n, 4);
//!     count += 1;
//! }
//! handle.join().unwrap();
//! assert_eq!(count, 10);
//! # Ok::<(), bipbuf::BipBufError>(())
//! ```

pub use buffer::BipBuffer;
pub use channel::{channel, Reader, WakeupStrategy, Writer};
pub use error::BipBufError;
pub use header::FrameHeader;
pub use record::Record;
pub use state::{Mode, RegionId};

pub(crate) mod buffer;
pub mod channel;
pub mod error;
pub(crate) mod header;
#[cfg(all(test, feature = "loom"))]
pub(crate) mod loom;
pub(crate) mod record;
pub(crate) mod state;
pub(crate) mod sync;
pub(crate) mod trace_macro;
