//! # genhash
//!
//! Builds an offline lookup index over a 2-bit packed reference genome: for every
//! 12-base prefix ("key") of a sliding 100-base window, the index records every
//! base position at which that prefix occurs. The result is a static, two-file
//! inverted index consumed by downstream aligners.
//!
//! ## Usage
//!
//! ```no_run
//! use genhash::{build_index_from_path, IndexConfig, IndexReader};
//!
//! fn main() -> genhash::Result<()> {
//!     let config = IndexConfig::default().output_dir("./index");
//!     let summary = build_index_from_path("./reference.bin", &config)?;
//!     println!("{} postings", summary.total_postings);
//!
//!     let index = IndexReader::open(&config.paths())?;
//!     let positions = index.positions(0x1b_e4_93)?;
//!     println!("key occurs {} times", positions.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Packed reference format
//!
//! Raw bytes with no header, four bases per byte, two bits per base
//! (A=00, C=01, G=10, T=11). Base `n` is stored in byte `n / 4` at bit offset
//! `2 * (n % 4)`. Runs of unknown bases are expected to be packed as `A`
//! (all-zero bytes); see [`pack_fasta`] for producing a reference from FASTA.
//!
//! ## Index format
//!
//! | File              | Entries                    | Contents                                    |
//! | ----------------- | -------------------------- | ------------------------------------------- |
//! | `hash_table1.bin` | `2^24` (`+1` with terminator) | offset of each key's postings (prefix sum) |
//! | `hash_table2.bin` | total postings             | positions grouped by key, ascending         |
//!
//! Both tables are flat arrays of native-endian `u32`. The postings of key `k`
//! are `postings[offsets[k]..offsets[k + 1]]`; the last key ends at the
//! terminator entry if present, or at the end of the postings table.
//!
//! ## Keys and windows
//!
//! - A window starts at every base position `4 * i + j` for which 25 bytes
//!   (100 bases) are available from byte `i`.
//! - The key is the big-endian value of the window's first three bytes after
//!   re-aligning it to base `j`.
//! - A window whose key is zero and whose bytes `4..24` are all zero is
//!   considered padding and is not indexed.
//!
//! ## Memory
//!
//! The key space is processed in [`DEFAULT_NUM_BLOCKS`] equal partitions, one
//! full scan of the reference each, so only one partition's postings are held
//! in memory at a time.

mod accumulator;
mod builder;
mod error;
mod pack;
mod partition;
mod policy;
mod reader;
mod sequence;
mod window;
mod writer;

pub use accumulator::PartitionPostings;
pub use builder::{build_index, build_index_from_path, IndexBuilder, IndexConfig, IndexSummary};
pub use error::{BuildError, Error, IndexError, ReadError, Result, WriteError};
pub use pack::{pack_fasta, ReferencePacker};
pub use partition::{Partition, Partitions};
pub use policy::{Policy, RNG_SEED};
pub use reader::IndexReader;
pub use sequence::{MappedReference, SequenceView, MAX_REFERENCE_BYTES};
pub use window::{is_degenerate_tail, scan, KeyRegister, KeySink};
pub use writer::{write_fragments, IndexPaths, IndexWriter, OFFSETS_FILE, POSTINGS_FILE};

/// Number of bases packed into one byte
pub const BASES_PER_BYTE: usize = 4;

/// Number of bytes (and bits / 8) of a key: 12 bases
pub const KEY_BYTES: usize = 3;

/// Width of a key in bits
pub const KEY_BITS: u32 = 24;

/// Number of distinct keys, and entries of the offsets table
pub const TABLE_LENGTH: u32 = 1 << KEY_BITS;

/// Bytes of look-ahead a window needs: 100 bases
pub const WINDOW_BYTES: usize = 25;

/// Default number of key-space partitions
pub const DEFAULT_NUM_BLOCKS: u32 = 8;
