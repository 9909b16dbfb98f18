//! Division of the 24-bit key space into equal, contiguous partitions
//!
//! Only one partition's postings are resident at a time, so the number of
//! partitions trades repeated scans of the reference for a lower memory peak.

use std::ops::Range;

use crate::error::{BuildError, Result};
use crate::TABLE_LENGTH;

/// A half-open range `[start, end)` of the key space processed in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Position of this partition in the ascending partition order
    pub index: u32,
    /// First key of the partition
    pub start: u32,
    /// One past the last key of the partition
    pub end: u32,
}

impl Partition {
    #[must_use]
    pub fn new(index: u32, start: u32, end: u32) -> Self {
        debug_assert!(start <= end && end <= TABLE_LENGTH);
        Self { index, start, end }
    }

    /// The partition covering the whole key space
    #[must_use]
    pub fn full() -> Self {
        Self::new(0, 0, TABLE_LENGTH)
    }

    /// Number of keys in the partition
    #[must_use]
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: u32) -> bool {
        key >= self.start && key < self.end
    }

    /// Slot of `key` within the partition's per-key arrays
    #[inline]
    #[must_use]
    pub fn slot(&self, key: u32) -> usize {
        (key - self.start) as usize
    }

    /// The first partition truncates the output tables, later ones append
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.start == 0
    }

    #[must_use]
    pub fn keys(&self) -> Range<u32> {
        self.start..self.end
    }
}

/// Ascending sequence of equal partitions covering `[0, TABLE_LENGTH)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitions {
    num_blocks: u32,
}

impl Partitions {
    /// Splits the key space into `num_blocks` partitions
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidBlockCount`] unless `num_blocks` is a power of
    /// two no larger than `TABLE_LENGTH`, which are exactly the counts that divide
    /// the key space evenly.
    pub fn new(num_blocks: u32) -> Result<Self> {
        if !num_blocks.is_power_of_two() || num_blocks > TABLE_LENGTH {
            return Err(BuildError::InvalidBlockCount(num_blocks).into());
        }
        Ok(Self { num_blocks })
    }

    #[must_use]
    pub fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    /// Number of keys in every partition
    #[must_use]
    pub fn block_len(&self) -> u32 {
        TABLE_LENGTH / self.num_blocks
    }

    /// Returns the `index`-th partition, if any
    #[must_use]
    pub fn get(&self, index: u32) -> Option<Partition> {
        if index >= self.num_blocks {
            return None;
        }
        let block_len = self.block_len();
        Some(Partition::new(
            index,
            block_len * index,
            block_len * (index + 1),
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = Partition> + '_ {
        (0..self.num_blocks).filter_map(|index| self.get(index))
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::{Error, DEFAULT_NUM_BLOCKS};

    #[test]
    fn test_default_partitions() -> Result<()> {
        let partitions = Partitions::new(DEFAULT_NUM_BLOCKS)?;
        let all: Vec<_> = partitions.iter().collect();
        assert_eq!(all.len(), 8);
        assert_eq!(partitions.block_len(), 1 << 21);

        // contiguous, non-overlapping, covering the key space
        assert_eq!(all[0].start, 0);
        assert!(all[0].is_first());
        for pair in all.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_eq!(pair[0].index + 1, pair[1].index);
            assert!(!pair[1].is_first());
        }
        assert_eq!(all[7].end, TABLE_LENGTH);
        Ok(())
    }

    #[test]
    fn test_single_block() -> Result<()> {
        let partitions = Partitions::new(1)?;
        let all: Vec<_> = partitions.iter().collect();
        assert_eq!(all, vec![Partition::full()]);
        assert_eq!(all[0].len(), TABLE_LENGTH as usize);
        Ok(())
    }

    #[test]
    fn test_invalid_block_counts() {
        for n in [0, 3, 6, 7, 12, TABLE_LENGTH * 2] {
            assert!(matches!(
                Partitions::new(n),
                Err(Error::BuildError(BuildError::InvalidBlockCount(m))) if m == n
            ));
        }
    }

    #[test]
    fn test_contains_and_slot() -> Result<()> {
        let partition = Partitions::new(8)?.get(1).unwrap();
        assert!(!partition.contains((1 << 21) - 1));
        assert!(partition.contains(1 << 21));
        assert!(partition.contains((1 << 22) - 1));
        assert!(!partition.contains(1 << 22));
        assert_eq!(partition.slot((1 << 21) + 5), 5);
        assert!(Partitions::new(8)?.get(8).is_none());
        Ok(())
    }
}
