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

//! Offset bookkeeping for the two regions and the reservation mode.
//!
//! Nothing here touches the backing store. Every transition the buffer makes
//! (selection, commit, swap, reset) is a method on [`Regions`], so the whole
//! state machine can be exercised with plain integers.

/// Identifies one of the two regions of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionId {
    /// Primary region. Readers always consume from here.
    A,
    /// Wrapped region, physically before A's unread data.
    B,
}

/// Reservation state of the buffer.
///
/// `len` is the full framed length (header included).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    ReservedInA {
        len: usize,
    },
    ReservedInB {
        len: usize,
    },
}

impl Mode {
    pub fn region(&self) -> Option<RegionId> {
        match self {
            Mode::Idle => None,
            Mode::ReservedInA { .. } => Some(RegionId::A),
            Mode::ReservedInB { .. } => Some(RegionId::B),
        }
    }

    pub fn reserved_len(&self) -> Option<usize> {
        match *self {
            Mode::Idle => None,
            Mode::ReservedInA { len } | Mode::ReservedInB { len } => Some(len),
        }
    }

    fn reserved(region: RegionId, len: usize) -> Self {
        match region {
            RegionId::A => Mode::ReservedInA { len },
            RegionId::B => Mode::ReservedInB { len },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Region {
    pub(crate) read: usize,
    pub(crate) write: usize,
}

impl Region {
    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        self.read == self.write
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.write - self.read
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Regions {
    a: Region,
    b: Region,
    mode: Mode,
    capacity: usize,
}

/// What [`Regions::normalize`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reclaim {
    None,
    /// A was drained and B took its place.
    Swapped,
    /// Both regions were empty and A was rewound to offset zero.
    Rewound,
}

impl Regions {
    pub(crate) fn new(capacity: usize) -> Self {
        Regions {
            a: Region::default(),
            b: Region::default(),
            mode: Mode::Idle,
            capacity,
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn a(&self) -> Region {
        self.a
    }

    pub(crate) fn b(&self) -> Region {
        self.b
    }

    fn region_mut(&mut self, id: RegionId) -> &mut Region {
        match id {
            RegionId::A => &mut self.a,
            RegionId::B => &mut self.b,
        }
    }

    /// Bytes (headers included) published and not yet consumed.
    pub(crate) fn readable(&self) -> usize {
        self.a.len() + self.b.len()
    }

    /// Offset of the oldest unread header, if any.
    pub(crate) fn front(&self) -> Option<usize> {
        if !self.a.is_empty() {
            Some(self.a.read)
        } else if !self.b.is_empty() {
            Some(self.b.read)
        } else {
            None
        }
    }

    /// Reclaims drained space.
    ///
    /// A drained A with data in B is replaced by B; an outstanding
    /// reservation in B moves along with it. When both regions are empty and
    /// nothing is reserved, A rewinds to the start of the store.
    pub(crate) fn normalize(&mut self) -> Reclaim {
        if !self.a.is_empty() {
            return Reclaim::None;
        }
        if !self.b.is_empty() {
            self.a = self.b;
            self.b = Region::default();
            if let Mode::ReservedInB { len } = self.mode {
                self.mode = Mode::ReservedInA { len };
            }
            return Reclaim::Swapped;
        }
        if self.mode == Mode::Idle && self.a.write != 0 {
            self.a = Region::default();
            return Reclaim::Rewound;
        }
        Reclaim::None
    }

    /// Picks the region that can hold `len` contiguous bytes.
    ///
    /// A is only eligible while B is empty; once data has wrapped, new
    /// records must follow it in B. On failure returns the largest
    /// contiguous run that is available.
    pub(crate) fn select(&self, len: usize) -> Result<RegionId, usize> {
        let b_active = !self.b.is_empty();
        if !b_active && self.a.write + len <= self.capacity {
            return Ok(RegionId::A);
        }
        if self.b.write + len <= self.a.read {
            return Ok(RegionId::B);
        }

        let behind_a = self.a.read - self.b.write;
        if b_active {
            Err(behind_a)
        } else {
            Err((self.capacity - self.a.write).max(behind_a))
        }
    }

    /// Enters the reserved mode and returns the offset of the record header.
    pub(crate) fn begin(&mut self, region: RegionId, len: usize) -> usize {
        debug_assert_eq!(self.mode, Mode::Idle);
        self.mode = Mode::reserved(region, len);
        self.region_mut(region).write
    }

    /// Outstanding reservation as `(header offset, framed length)`.
    pub(crate) fn outstanding(&self) -> Option<(usize, usize)> {
        let region = self.mode.region()?;
        let len = self.mode.reserved_len()?;
        let offset = match region {
            RegionId::A => self.a.write,
            RegionId::B => self.b.write,
        };
        Some((offset, len))
    }

    /// Publishes `used` framed bytes of the outstanding reservation.
    pub(crate) fn finish(&mut self, used: usize) {
        if let Some(region) = self.mode.region() {
            debug_assert!(used <= self.mode.reserved_len().unwrap_or(0));
            self.region_mut(region).write += used;
        }
        self.mode = Mode::Idle;
    }

    /// Drops the outstanding reservation without publishing anything.
    pub(crate) fn release(&mut self) -> bool {
        let had = self.mode != Mode::Idle;
        self.mode = Mode::Idle;
        had
    }

    /// Advances A's read offset past a consumed record.
    pub(crate) fn consume(&mut self, framed: usize) {
        debug_assert!(framed <= self.a.len());
        self.a.read += framed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[fixture]
    fn regions() -> Regions {
        Regions::new(100)
    }

    fn publish(regions: &mut Regions, len: usize) -> RegionId {
        let region = regions.select(len).unwrap();
        regions.begin(region, len);
        regions.finish(len);
        region
    }

    #[rstest]
    fn test_initial_state(regions: Regions) {
        assert_eq!(regions.mode(), Mode::Idle);
        assert_eq!(regions.readable(), 0);
        assert_eq!(regions.front(), None);
    }

    #[rstest]
    fn test_begin_sets_mode(mut regions: Regions) {
        let offset = regions.begin(RegionId::A, 12);
        assert_eq!(offset, 0);
        assert_eq!(regions.mode(), Mode::ReservedInA { len: 12 });
        assert_eq!(regions.outstanding(), Some((0, 12)));
        assert_eq!(regions.readable(), 0);
    }

    #[rstest]
    fn test_finish_publishes_used_length(mut regions: Regions) {
        regions.begin(RegionId::A, 32);
        regions.finish(22);
        assert_eq!(regions.mode(), Mode::Idle);
        assert_eq!(regions.a(), Region { read: 0, write: 22 });
        assert_eq!(regions.readable(), 22);
    }

    #[rstest]
    fn test_release(mut regions: Regions) {
        assert!(!regions.release());
        regions.begin(RegionId::A, 10);
        assert!(regions.release());
        assert_eq!(regions.mode(), Mode::Idle);
        assert_eq!(regions.readable(), 0);
    }

    #[rstest]
    fn test_select_prefers_a_until_end(mut regions: Regions) {
        assert_eq!(publish(&mut regions, 50), RegionId::A);
        assert_eq!(publish(&mut regions, 50), RegionId::A);
        assert_eq!(regions.select(1), Err(0));
    }

    #[rstest]
    fn test_select_wraps_into_b(mut regions: Regions) {
        publish(&mut regions, 30);
        publish(&mut regions, 30);
        publish(&mut regions, 30);
        assert_eq!(regions.select(30), Err(10));

        regions.consume(30);
        assert_eq!(regions.select(30), Ok(RegionId::B));
        assert_eq!(regions.select(31), Err(30));
    }

    #[rstest]
    fn test_select_stays_in_b_once_wrapped(mut regions: Regions) {
        publish(&mut regions, 30);
        publish(&mut regions, 30);
        publish(&mut regions, 30);
        regions.consume(30);
        assert_eq!(publish(&mut regions, 20), RegionId::B);

        // 10 bytes are still free after A's tail, but B holds newer data.
        assert_eq!(regions.select(4), Ok(RegionId::B));
        assert_eq!(regions.select(11), Err(10));
    }

    #[rstest]
    fn test_swap_moves_b_into_a(mut regions: Regions) {
        publish(&mut regions, 40);
        publish(&mut regions, 40);
        regions.consume(40);
        publish(&mut regions, 30);
        regions.consume(40);

        assert_eq!(regions.front(), Some(0));
        assert_eq!(regions.normalize(), Reclaim::Swapped);
        assert_eq!(regions.a(), Region { read: 0, write: 30 });
        assert_eq!(regions.b(), Region::default());
    }

    #[rstest]
    fn test_swap_carries_reservation(mut regions: Regions) {
        publish(&mut regions, 40);
        publish(&mut regions, 40);
        regions.consume(40);
        publish(&mut regions, 30);
        let region = regions.select(10).unwrap();
        assert_eq!(region, RegionId::B);
        regions.begin(region, 10);
        regions.consume(40);

        assert_eq!(regions.normalize(), Reclaim::Swapped);
        assert_eq!(regions.mode(), Mode::ReservedInA { len: 10 });
        assert_eq!(regions.outstanding(), Some((30, 10)));
    }

    #[rstest]
    fn test_rewind_when_drained(mut regions: Regions) {
        publish(&mut regions, 60);
        regions.consume(60);
        assert_eq!(regions.select(70), Err(60));

        assert_eq!(regions.normalize(), Reclaim::Rewound);
        assert_eq!(regions.a(), Region::default());
        assert_eq!(regions.select(100), Ok(RegionId::A));
    }

    #[rstest]
    fn test_no_rewind_with_reservation(mut regions: Regions) {
        publish(&mut regions, 60);
        regions.consume(60);
        regions.begin(RegionId::A, 20);
        assert_eq!(regions.normalize(), Reclaim::None);
        assert_eq!(regions.outstanding(), Some((60, 20)));
    }
}
