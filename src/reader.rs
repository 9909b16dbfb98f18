//! Memory-mapped access to a written index
//!
//! The consumer side of the two tables: the offsets table is mapped and cast to
//! `&[u32]`, and a key's postings are the slice between its offset and the next
//! key's offset. The last key ends at the terminator entry when present, and at
//! the end of the postings table otherwise.

use std::fs::File;
use std::path::Path;

use bytemuck::try_cast_slice;
use memmap2::Mmap;

use crate::error::{IndexError, ReadError, Result};
use crate::writer::IndexPaths;
use crate::TABLE_LENGTH;

/// Maps one table file read-only, `None` for an empty table
fn map_table(path: &Path) -> Result<Option<Mmap>> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(ReadError::IncompatibleFile.into());
    }
    if metadata.len() == 0 {
        return Ok(None);
    }
    // Safety: the file is open and won't be modified while mapped
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Some(mmap))
}

/// Bytes of a mapped table
fn table_bytes(table: &Option<Mmap>) -> &[u8] {
    table.as_deref().unwrap_or(&[])
}

/// Reinterprets a mapped table as `u32` entries
fn entries(bytes: &[u8]) -> Result<&[u32]> {
    // an unmapped table has no aligned base pointer
    if bytes.is_empty() {
        return Ok(&[]);
    }
    try_cast_slice(bytes).map_err(|e| IndexError::Misaligned(format!("{e:?}")).into())
}

/// A read-only view of the offsets and postings tables
pub struct IndexReader {
    /// Mapped offsets table
    offsets: Option<Mmap>,

    /// Mapped postings table
    postings: Option<Mmap>,
}

impl IndexReader {
    /// Maps both tables and checks their shapes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Either table cannot be opened or mapped
    /// * Either table is not a whole number of `u32` entries
    /// * The offsets table has neither `TABLE_LENGTH` nor `TABLE_LENGTH + 1` entries
    /// * The terminator entry disagrees with the postings table length
    pub fn open(paths: &IndexPaths) -> Result<Self> {
        let reader = Self {
            offsets: map_table(&paths.offsets)?,
            postings: map_table(&paths.postings)?,
        };

        let offsets = reader.offsets()?;
        if offsets.len() != TABLE_LENGTH as usize && offsets.len() != TABLE_LENGTH as usize + 1 {
            return Err(IndexError::InvalidOffsetsLength(offsets.len()).into());
        }
        let total = reader.postings()?.len();
        if reader.has_terminator() && offsets[TABLE_LENGTH as usize] as usize != total {
            return Err(IndexError::Corrupt(format!(
                "terminator {} does not match {} postings",
                offsets[TABLE_LENGTH as usize], total
            ))
            .into());
        }
        Ok(reader)
    }

    /// Maps the tables at their default names inside `dir`
    pub fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open(&IndexPaths::in_dir(dir))
    }

    /// The raw offsets table, including the terminator when present
    pub fn offsets(&self) -> Result<&[u32]> {
        entries(table_bytes(&self.offsets))
    }

    /// The raw postings table
    pub fn postings(&self) -> Result<&[u32]> {
        entries(table_bytes(&self.postings))
    }

    /// Whether the offsets table carries a final total entry
    #[must_use]
    pub fn has_terminator(&self) -> bool {
        table_bytes(&self.offsets).len() / 4 == TABLE_LENGTH as usize + 1
    }

    /// Number of entries in the postings table
    #[must_use]
    pub fn total_postings(&self) -> usize {
        table_bytes(&self.postings).len() / 4
    }

    /// Index range of `key`'s postings
    fn bounds(&self, key: u32) -> Result<(usize, usize)> {
        if key >= TABLE_LENGTH {
            return Err(IndexError::KeyOutOfRange(key).into());
        }
        let offsets = self.offsets()?;
        let start = offsets[key as usize] as usize;
        let end = offsets
            .get(key as usize + 1)
            .map_or(self.total_postings(), |&end| end as usize);
        if start > end || end > self.total_postings() {
            return Err(IndexError::Corrupt(format!(
                "key {key:#x} spans {start}..{end} of {} postings",
                self.total_postings()
            ))
            .into());
        }
        Ok((start, end))
    }

    /// Number of occurrences of `key`
    pub fn count(&self, key: u32) -> Result<usize> {
        let (start, end) = self.bounds(key)?;
        Ok(end - start)
    }

    /// Ascending base positions at which `key` occurs
    pub fn positions(&self, key: u32) -> Result<&[u32]> {
        let (start, end) = self.bounds(key)?;
        Ok(&self.postings()?[start..end])
    }

    /// Checks the structural invariants of the whole index
    ///
    /// The offsets table must be non-decreasing and bounded by the postings
    /// table, and every key's postings must be strictly ascending.
    pub fn validate(&self) -> Result<()> {
        let offsets = self.offsets()?;
        let postings = self.postings()?;

        if let Some(k) = offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(IndexError::Corrupt(format!("offsets decrease after key {k:#x}")).into());
        }
        if offsets.first().is_some_and(|&first| first != 0) {
            return Err(IndexError::Corrupt("offsets do not start at zero".to_string()).into());
        }
        if offsets.last().is_some_and(|&last| last as usize > postings.len()) {
            return Err(IndexError::Corrupt("offsets exceed the postings table".to_string()).into());
        }

        for key in 0..TABLE_LENGTH {
            let group = self.positions(key)?;
            if group.windows(2).any(|w| w[0] >= w[1]) {
                return Err(IndexError::Corrupt(format!(
                    "postings of key {key:#x} are not strictly ascending"
                ))
                .into());
            }
        }
        Ok(())
    }
}
