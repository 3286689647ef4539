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

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BipBufError {
    #[error("capacity must be non-zero")]
    ZeroCapacity,

    #[error("failed to allocate backing store of {0} bytes")]
    AllocationFailed(usize),

    #[error("reservation size must be non-zero")]
    ZeroSize,

    #[error("record of {size} bytes exceeds header range (max {max})")]
    RecordTooLarge { size: usize, max: usize },

    #[error("a reservation is already outstanding")]
    AlreadyReserved,

    #[error("insufficient space: need {needed} contiguous bytes, {available} available")]
    InsufficientSpace { needed: usize, available: usize },

    #[error("commit without an outstanding reservation")]
    NoReservation,

    #[error("commit of {requested} bytes exceeds reservation of {reserved} bytes")]
    CommitExceedsReservation { requested: usize, reserved: usize },

    #[error("output buffer too small: record is {required} bytes, got {available}")]
    OutputTooSmall { required: usize, available: usize },

    #[error("channel closed")]
    Closed,
}
