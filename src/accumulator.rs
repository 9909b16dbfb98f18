//! Per-partition position lists in offset-addressed form
//!
//! A partition is accumulated in two scans of the reference. The first scan
//! counts occurrences per key and turns the histogram into start offsets with a
//! prefix sum. The second scan writes every position straight into a buffer of
//! exactly the counted size, advancing a per-key cursor. Position lists come out
//! in ascending order because the scan visits positions in ascending order.
//!
//! All buffers belong to one [`PartitionPostings`] value, so dropping it
//! releases the whole partition at once.

use crate::error::{BuildError, Result};
use crate::partition::Partition;
use crate::sequence::SequenceView;
use crate::window::{scan, KeySink};

/// Allocates a zeroed `u32` buffer, failing the run instead of aborting
fn try_zeroed(entries: usize) -> Result<Vec<u32>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(entries)
        .map_err(|_| BuildError::Allocation { entries })?;
    buffer.resize(entries, 0);
    Ok(buffer)
}

/// First pass: occurrence histogram over the partition's keys
struct KeyCounter {
    partition: Partition,
    counts: Vec<u32>,
}

impl KeyCounter {
    fn new(partition: Partition) -> Result<Self> {
        Ok(Self {
            partition,
            counts: try_zeroed(partition.len())?,
        })
    }

    /// Converts the histogram into `len + 1` start offsets
    fn into_offsets(self) -> Result<Vec<u32>> {
        let mut offsets = try_zeroed(self.counts.len() + 1)?;
        let mut total = 0u32;
        for (slot, count) in self.counts.into_iter().enumerate() {
            offsets[slot] = total;
            total = total
                .checked_add(count)
                .ok_or(BuildError::PostingsOverflow)?;
        }
        if let Some(last) = offsets.last_mut() {
            *last = total;
        }
        Ok(offsets)
    }
}

impl KeySink for KeyCounter {
    #[inline]
    fn push(&mut self, key: u32, _position: u32) {
        self.counts[self.partition.slot(key)] += 1;
    }
}

/// Second pass: scatters positions behind per-key write cursors
struct PositionFiller {
    partition: Partition,
    cursors: Vec<u32>,
    positions: Vec<u32>,
}

impl KeySink for PositionFiller {
    #[inline]
    fn push(&mut self, key: u32, position: u32) {
        let cursor = &mut self.cursors[self.partition.slot(key)];
        self.positions[*cursor as usize] = position;
        *cursor += 1;
    }
}

/// The position lists of every key in one partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPostings {
    /// Key range these postings belong to
    partition: Partition,
    /// Start of each key's list in `positions`, plus a final end entry
    offsets: Vec<u32>,
    /// All position lists concatenated in key order
    positions: Vec<u32>,
}

impl PartitionPostings {
    /// Accumulates the position lists of `partition` from a full scan of `view`
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Allocation`] if a partition buffer cannot be
    /// reserved. There is no partial result.
    pub fn build(view: &SequenceView<'_>, partition: Partition) -> Result<Self> {
        let mut counter = KeyCounter::new(partition)?;
        scan(view, partition, &mut counter);
        let offsets = counter.into_offsets()?;

        let total = offsets.last().copied().unwrap_or(0) as usize;
        let mut cursors = try_zeroed(partition.len())?;
        cursors.copy_from_slice(&offsets[..partition.len()]);
        let mut filler = PositionFiller {
            partition,
            cursors,
            positions: try_zeroed(total)?,
        };
        scan(view, partition, &mut filler);
        debug_assert_eq!(&filler.cursors[..], &offsets[1..]);

        Ok(Self {
            partition,
            offsets,
            positions: filler.positions,
        })
    }

    #[must_use]
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Total number of postings in the partition
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of occurrences of `key`, zero outside of the partition
    #[must_use]
    pub fn count(&self, key: u32) -> usize {
        self.positions(key).len()
    }

    /// Ascending positions of `key`, empty outside of the partition
    #[must_use]
    pub fn positions(&self, key: u32) -> &[u32] {
        if !self.partition.contains(key) {
            return &[];
        }
        let slot = self.partition.slot(key);
        let start = self.offsets[slot] as usize;
        let end = self.offsets[slot + 1] as usize;
        &self.positions[start..end]
    }

    /// Iterates every key of the partition in ascending order with its positions
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u32])> + '_ {
        self.partition.keys().map(move |key| (key, self.positions(key)))
    }

    /// All position lists concatenated in key order
    #[must_use]
    pub fn postings(&self) -> &[u32] {
        &self.positions
    }

    /// Partition-local start offsets, one per key, without the end entry
    #[must_use]
    pub fn local_offsets(&self) -> &[u32] {
        &self.offsets[..self.partition.len()]
    }
}
