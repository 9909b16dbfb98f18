//! Serialization of partition postings into the two index tables
//!
//! Both tables are flat arrays of native-endian `u32` with no header:
//! - the offsets table holds, per key, the number of postings of all smaller keys
//! - the postings table holds every position list concatenated in key order
//!
//! Partitions are written in ascending key order. The first partition creates
//! (and truncates) both files, later partitions append to them.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{NativeEndian, WriteBytesExt};
use bytemuck::cast_slice;
use tracing::debug;

use crate::accumulator::PartitionPostings;
use crate::error::{BuildError, Error, Result, WriteError};
use crate::TABLE_LENGTH;

/// File name of the offsets table
pub const OFFSETS_FILE: &str = "hash_table1.bin";

/// File name of the postings table
pub const POSTINGS_FILE: &str = "hash_table2.bin";

/// Size of a table entry in bytes
const ENTRY_BYTES: u64 = std::mem::size_of::<u32>() as u64;

/// Number of offsets converted per write call
const FRAGMENT_CHUNK: usize = 4096;

/// Locations of the two index tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    /// Path of the offsets table
    pub offsets: PathBuf,
    /// Path of the postings table
    pub postings: PathBuf,
}

impl IndexPaths {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(offsets: P, postings: Q) -> Self {
        Self {
            offsets: offsets.into(),
            postings: postings.into(),
        }
    }

    /// Default table names inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(OFFSETS_FILE), dir.join(POSTINGS_FILE))
    }
}

impl Default for IndexPaths {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

/// Running total after appending `postings` to `base` earlier postings
fn fragment_total(base: u32, postings: &PartitionPostings) -> Result<u32> {
    let total = u32::try_from(postings.len())
        .ok()
        .and_then(|len| base.checked_add(len))
        .ok_or(BuildError::PostingsOverflow)?;
    Ok(total)
}

/// Writes the offsets fragment, shifted by `base`
///
/// Every local offset is at most the partition length, so with a checked
/// [`fragment_total`] the sums cannot overflow.
fn write_offsets_fragment<W: Write>(
    out: &mut W,
    base: u32,
    postings: &PartitionPostings,
) -> std::io::Result<()> {
    let mut chunk = [0u32; FRAGMENT_CHUNK];
    for local in postings.local_offsets().chunks(FRAGMENT_CHUNK) {
        for (dst, &offset) in chunk.iter_mut().zip(local) {
            *dst = base + offset;
        }
        out.write_all(cast_slice(&chunk[..local.len()]))?;
    }
    Ok(())
}

/// Tags an I/O failure with the table it happened on
fn table_error(path: &Path, source: std::io::Error) -> Error {
    WriteError::Table {
        path: path.to_path_buf(),
        source,
    }
    .into()
}

/// Writes the offsets and postings fragments of one partition
///
/// `base` is the number of postings already written by earlier partitions.
/// Offsets entry `m` of the fragment is `base` plus the postings of keys
/// `start..start + m`. Returns the new running total.
pub fn write_fragments<W: Write, V: Write>(
    offsets_out: &mut W,
    postings_out: &mut V,
    base: u32,
    postings: &PartitionPostings,
) -> Result<u32> {
    let total = fragment_total(base, postings)?;
    write_offsets_fragment(offsets_out, base, postings)?;
    postings_out.write_all(cast_slice(postings.postings()))?;
    Ok(total)
}

/// Appends partitions to the on-disk index tables
#[derive(Debug)]
pub struct IndexWriter {
    /// Output locations
    paths: IndexPaths,

    /// Number of postings written so far
    total: u32,

    /// First key of the next partition to be written
    next_key: u32,

    /// Whether `finish` appends the total as a final offsets entry
    terminator: bool,
}

impl IndexWriter {
    #[must_use]
    pub fn new(paths: IndexPaths) -> Self {
        Self {
            paths,
            total: 0,
            next_key: 0,
            terminator: false,
        }
    }

    /// Appends the postings total as an extra offsets entry on [`finish`](Self::finish)
    #[must_use]
    pub fn with_terminator(mut self, yes: bool) -> Self {
        self.terminator = yes;
        self
    }

    #[must_use]
    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    /// Number of postings written so far
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Opens an output table for a partition
    fn open(path: &Path, first: bool) -> Result<File> {
        let file = if first {
            File::create(path)
        } else {
            OpenOptions::new().append(true).open(path)
        };
        file.map_err(|e| table_error(path, e))
    }

    /// Serializes one partition and appends it to both tables
    ///
    /// # Errors
    ///
    /// Returns an error if the partition is not the next one in key order, if
    /// the postings table on disk does not hold the running total, or if
    /// either table cannot be opened or written.
    pub fn write_partition(&mut self, postings: &PartitionPostings) -> Result<()> {
        let partition = postings.partition();
        if partition.start != self.next_key {
            return Err(WriteError::OutOfOrder {
                expected: self.next_key,
                got: partition.start,
            }
            .into());
        }

        let first = partition.is_first();
        let offsets_file = Self::open(&self.paths.offsets, first)?;
        let postings_file = Self::open(&self.paths.postings, first)?;

        // the offsets base is the current length of the postings table
        let on_disk = postings_file
            .metadata()
            .map_err(|e| table_error(&self.paths.postings, e))?
            .len();
        if on_disk != u64::from(self.total) * ENTRY_BYTES {
            return Err(WriteError::UnexpectedLength {
                expected: u64::from(self.total),
                got: on_disk / ENTRY_BYTES,
            }
            .into());
        }

        let total = fragment_total(self.total, postings)?;
        let mut offsets_out = BufWriter::new(offsets_file);
        write_offsets_fragment(&mut offsets_out, self.total, postings)
            .and_then(|()| offsets_out.flush())
            .map_err(|e| table_error(&self.paths.offsets, e))?;
        let mut postings_out = BufWriter::new(postings_file);
        postings_out
            .write_all(cast_slice(postings.postings()))
            .and_then(|()| postings_out.flush())
            .map_err(|e| table_error(&self.paths.postings, e))?;

        debug!(
            block = partition.index,
            keys = partition.len(),
            postings = postings.len(),
            total,
            "wrote partition"
        );
        self.total = total;
        self.next_key = partition.end;
        Ok(())
    }

    /// Completes the index and returns the total number of postings
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Incomplete`] if the key space has not been fully
    /// written, or an I/O error if the terminator cannot be appended.
    pub fn finish(self) -> Result<u32> {
        if self.next_key != TABLE_LENGTH {
            return Err(WriteError::Incomplete(self.next_key).into());
        }
        if self.terminator {
            let mut offsets_out = Self::open(&self.paths.offsets, false).map(BufWriter::new)?;
            offsets_out
                .write_u32::<NativeEndian>(self.total)
                .and_then(|()| offsets_out.flush())
                .map_err(|e| table_error(&self.paths.offsets, e))?;
        }
        Ok(self.total)
    }
}
