//! Read-only access to the 2-bit packed reference sequence
//!
//! The reference is a flat byte array holding four bases per byte with no header.
//! Base `n` of the reference lives in byte `n / 4` at bit offset `2 * (n % 4)`,
//! so the first base of every byte occupies its two least significant bits.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{ReadError, Result};
use crate::{BASES_PER_BYTE, WINDOW_BYTES};

/// Largest reference (in bytes) whose base positions all fit in a `u32`
pub const MAX_REFERENCE_BYTES: usize = (u32::MAX as usize / BASES_PER_BYTE) + 1;

/// A validated, read-only view over a packed reference
///
/// Construction guarantees that every base position `4 * i + j` of the view
/// fits in a `u32`, which is the width of a posting in the index tables.
#[derive(Debug, Clone, Copy)]
pub struct SequenceView<'a> {
    bytes: &'a [u8],
}

impl<'a> SequenceView<'a> {
    /// Wraps a packed byte buffer
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::ReferenceTooLarge`] if the buffer holds more bases
    /// than a 32-bit position can address.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() > MAX_REFERENCE_BYTES {
            return Err(ReadError::ReferenceTooLarge(bytes.len(), MAX_REFERENCE_BYTES).into());
        }
        Ok(Self { bytes })
    }

    /// Size of the reference in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of byte offsets that start a full 100-base window
    #[must_use]
    pub fn num_windows(&self) -> usize {
        (self.bytes.len() + 1).saturating_sub(WINDOW_BYTES)
    }

    /// Number of base positions visited by a full scan of the view
    #[must_use]
    pub fn num_positions(&self) -> usize {
        self.num_windows() * BASES_PER_BYTE
    }

    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// A packed reference mapped into memory from disk
///
/// The mapping stays alive for as long as this value does, and every
/// [`SequenceView`] handed out borrows from it.
pub struct MappedReference {
    /// Memory mapped file contents, `None` for an empty file
    mmap: Option<Mmap>,
}

impl MappedReference {
    /// Opens and maps a packed reference file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be opened
    /// * The file is not a regular file
    /// * The file cannot be mapped
    /// * The file is larger than [`MAX_REFERENCE_BYTES`]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Verify input file is a file before attempting to map
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(ReadError::IncompatibleFile.into());
        }

        let size = metadata.len() as usize;
        if size > MAX_REFERENCE_BYTES {
            return Err(ReadError::ReferenceTooLarge(size, MAX_REFERENCE_BYTES).into());
        }
        if size == 0 {
            return Ok(Self { mmap: None });
        }

        // Safety: the file is open and won't be modified while mapped
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap: Some(mmap) })
    }

    /// Size of the mapped reference in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.view().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_none()
    }

    /// Returns a view over the whole mapped reference
    #[must_use]
    pub fn view(&self) -> SequenceView<'_> {
        // size was validated on open
        SequenceView {
            bytes: self.mmap.as_deref().unwrap_or(&[]),
        }
    }
}
