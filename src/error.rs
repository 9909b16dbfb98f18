/// Custom Result type for genhash operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the genhash library, encompassing all possible error cases
/// that can occur while packing a reference, building an index, or reading one back.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors that occur while opening or validating the packed reference
    ReadError(#[from] ReadError),
    /// Errors that occur while writing the index tables or a packed reference
    WriteError(#[from] WriteError),
    /// Errors that occur while partitioning or accumulating postings
    BuildError(#[from] BuildError),
    /// Errors that occur while consuming a written index
    IndexError(#[from] IndexError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// UTF-8 encoding/decoding errors
    Utf8Error(#[from] std::str::Utf8Error),
    /// Errors from the bitnuc nucleotide processing library
    BitnucError(#[from] bitnuc::Error),
    /// Generic errors that can occur in any part of the system
    AnyhowError(#[from] anyhow::Error),
}

/// Errors that can occur while opening the packed reference sequence
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The file being read is not a regular file (e.g., it might be a directory or special file)
    #[error("File is not regular")]
    IncompatibleFile,

    /// The reference holds more bases than a 32-bit position can address
    ///
    /// # Arguments
    /// * First `usize` - The size of the reference in bytes
    /// * Second `usize` - The largest supported size in bytes
    #[error("Reference of {0} bytes exceeds the addressable maximum of {1} bytes")]
    ReferenceTooLarge(usize, usize),
}

/// Errors that can occur while writing index tables or packed references
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// The postings table on disk does not hold the number of entries written so far
    ///
    /// # Fields
    /// * `expected` - The running total of postings written by this run
    /// * `got` - The number of entries found in the file
    #[error("Postings table holds {got} entries but {expected} were written")]
    UnexpectedLength { expected: u64, got: u64 },

    /// A partition was handed to the writer out of ascending key order
    ///
    /// # Fields
    /// * `expected` - The first key of the partition the writer expects next
    /// * `got` - The first key of the partition that was provided
    #[error("Partition starting at key {got:#x} written out of order (expected {expected:#x})")]
    OutOfOrder { expected: u32, got: u32 },

    /// The writer was finished before the whole key space was written
    ///
    /// # Arguments
    /// * `u32` - The number of keys written so far
    #[error("Index finished after only {0} keys were written")]
    Incomplete(u32),

    /// An index table could not be opened or written
    ///
    /// # Fields
    /// * `path` - The table being opened or written
    /// * `source` - The underlying I/O error
    #[error("Unable to write index table \"{}\"", path.display())]
    Table {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// The sequence contains invalid nucleotide characters
    ///
    /// # Arguments
    /// * `String` - Description of the invalid nucleotides found
    #[error("Invalid nucleotides found in sequence: {0}")]
    InvalidNucleotideSequence(String),
}

/// Errors that can occur while partitioning the key space and accumulating postings
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    /// The key space cannot be split into the requested number of equal partitions
    ///
    /// # Arguments
    /// * `u32` - The requested number of partitions
    #[error("Invalid number of blocks: {0} (must be a power of two between 1 and 2^24)")]
    InvalidBlockCount(u32),

    /// A partition-sized buffer could not be reserved
    ///
    /// # Fields
    /// * `entries` - The number of `u32` entries requested
    #[error("Unable to allocate {entries} entries for the partition buffers")]
    Allocation { entries: usize },

    /// The running postings total no longer fits a 32-bit offset
    #[error("Postings total exceeds the 32-bit offset range")]
    PostingsOverflow,
}

/// Errors that can occur while reading a written index
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The offsets table has neither `TABLE_LENGTH` nor `TABLE_LENGTH + 1` entries
    ///
    /// # Arguments
    /// * `usize` - The number of entries found
    #[error("Offsets table holds {0} entries")]
    InvalidOffsetsLength(usize),

    /// A table is not a whole number of `u32` entries
    ///
    /// # Arguments
    /// * `String` - Description of the cast failure
    #[error("Table is not a flat u32 array: {0}")]
    Misaligned(String),

    /// The requested key lies outside of the key space
    ///
    /// # Arguments
    /// * `u32` - The requested key
    #[error("Key {0:#x} is outside of the 24-bit key space")]
    KeyOutOfRange(u32),

    /// A structural invariant of the index does not hold
    ///
    /// # Arguments
    /// * `String` - Description of the violation
    #[error("Corrupt index: {0}")]
    Corrupt(String),
}
