//! Partition-by-partition index construction
//!
//! The key space is split into equal partitions and the whole reference is
//! scanned once per partition, so only that partition's postings are resident
//! at any time. Partition buffers are dropped before the next pass begins.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::accumulator::PartitionPostings;
use crate::error::Result;
use crate::partition::Partitions;
use crate::sequence::SequenceView;
use crate::writer::{IndexPaths, IndexWriter, OFFSETS_FILE, POSTINGS_FILE};
use crate::{DEFAULT_NUM_BLOCKS, TABLE_LENGTH};

/// Build-time configuration.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    num_blocks: u32,
    output_dir: PathBuf,
    offsets_path: Option<PathBuf>,
    postings_path: Option<PathBuf>,
    terminator: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            num_blocks: DEFAULT_NUM_BLOCKS,
            output_dir: PathBuf::from("."),
            offsets_path: None,
            postings_path: None,
            terminator: false,
        }
    }
}

impl IndexConfig {
    /// Number of key-space partitions (power of two, default 8)
    #[must_use]
    pub fn num_blocks(mut self, n: u32) -> Self {
        self.num_blocks = n;
        self
    }
    /// Directory receiving both tables under their default names
    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }
    /// Explicit offsets table path (overrides the output directory)
    #[must_use]
    pub fn offsets_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.offsets_path = Some(path.into());
        self
    }
    /// Explicit postings table path (overrides the output directory)
    #[must_use]
    pub fn postings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.postings_path = Some(path.into());
        self
    }
    /// Append the postings total as a final offsets entry (default: false)
    #[must_use]
    pub fn terminator(mut self, yes: bool) -> Self {
        self.terminator = yes;
        self
    }

    /// Resolved table locations
    #[must_use]
    pub fn paths(&self) -> IndexPaths {
        let resolve = |explicit: &Option<PathBuf>, name: &str| {
            explicit
                .clone()
                .unwrap_or_else(|| self.output_dir.join(name))
        };
        IndexPaths::new(
            resolve(&self.offsets_path, OFFSETS_FILE),
            resolve(&self.postings_path, POSTINGS_FILE),
        )
    }
}

/// Totals reported after a successful build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    /// Number of entries in the postings table
    pub total_postings: u32,
    /// Number of partitions the key space was processed in
    pub num_blocks: u32,
    /// Number of entries in the offsets table
    pub offsets_entries: usize,
}

/// Drives extraction and serialization over every partition
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    partitions: Partitions,
    paths: IndexPaths,
    terminator: bool,
}

impl IndexBuilder {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidBlockCount`](crate::BuildError::InvalidBlockCount)
    /// if the key space cannot be split into the configured number of blocks.
    pub fn new(config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            partitions: Partitions::new(config.num_blocks)?,
            paths: config.paths(),
            terminator: config.terminator,
        })
    }

    #[must_use]
    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    /// Builds both index tables from `view`
    ///
    /// Any failure aborts the build; the tables are then incomplete and must
    /// not be consumed.
    pub fn build(&self, view: &SequenceView<'_>) -> Result<IndexSummary> {
        let start = Instant::now();
        info!(
            reference_bytes = view.len(),
            windows = view.num_windows(),
            blocks = self.partitions.num_blocks(),
            "building index"
        );

        let mut writer = IndexWriter::new(self.paths.clone()).with_terminator(self.terminator);
        for partition in self.partitions.iter() {
            let postings = PartitionPostings::build(view, partition)?;
            debug!(
                block = partition.index,
                start = partition.start,
                end = partition.end,
                postings = postings.len(),
                "accumulated partition"
            );
            writer.write_partition(&postings)?;
        }
        let total_postings = writer.finish()?;

        let summary = IndexSummary {
            total_postings,
            num_blocks: self.partitions.num_blocks(),
            offsets_entries: TABLE_LENGTH as usize + usize::from(self.terminator),
        };
        info!(
            postings = summary.total_postings,
            offsets = summary.offsets_entries,
            elapsed_ms = start.elapsed().as_millis(),
            "index complete"
        );
        Ok(summary)
    }
}

/// Builds an index over the reference in `view` with the given configuration
pub fn build_index(view: &SequenceView<'_>, config: &IndexConfig) -> Result<IndexSummary> {
    IndexBuilder::new(config)?.build(view)
}

/// Maps the packed reference at `path` and builds its index
pub fn build_index_from_path<P: AsRef<Path>>(path: P, config: &IndexConfig) -> Result<IndexSummary> {
    let builder = IndexBuilder::new(config)?;
    let reference = crate::sequence::MappedReference::open(path)?;
    builder.build(&reference.view())
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::error::{BuildError, WriteError};
    use crate::Error;

    #[test]
    fn test_default_paths() {
        let paths = IndexConfig::default().paths();
        assert_eq!(paths, IndexPaths::in_dir("."));
    }

    #[test]
    fn test_path_overrides() {
        let paths = IndexConfig::default()
            .output_dir("/data/index")
            .postings_path("/elsewhere/postings.bin")
            .paths();
        assert_eq!(paths.offsets, Path::new("/data/index").join(OFFSETS_FILE));
        assert_eq!(paths.postings, PathBuf::from("/elsewhere/postings.bin"));
    }

    #[test]
    fn test_invalid_blocks_fail_before_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = IndexConfig::default().num_blocks(5).output_dir(dir.path());
        assert!(matches!(
            IndexBuilder::new(&config),
            Err(Error::BuildError(BuildError::InvalidBlockCount(5)))
        ));
        assert!(!dir.path().join(OFFSETS_FILE).exists());
        Ok(())
    }

    #[test]
    fn test_summary() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let bytes: Vec<u8> = (0..40u32).map(|i| (i * 29 + 3) as u8).collect();
        let view = SequenceView::new(&bytes)?;

        let config = IndexConfig::default().output_dir(dir.path()).terminator(true);
        let summary = build_index(&view, &config)?;
        assert_eq!(summary.total_postings as usize, view.num_positions());
        assert_eq!(summary.num_blocks, DEFAULT_NUM_BLOCKS);
        assert_eq!(summary.offsets_entries, TABLE_LENGTH as usize + 1);

        let offsets_len = std::fs::metadata(dir.path().join(OFFSETS_FILE))?.len();
        assert_eq!(offsets_len, 4 * (u64::from(TABLE_LENGTH) + 1));
        Ok(())
    }

    #[test]
    fn test_missing_output_dir_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("no").join("such").join("dir");
        let bytes = [0x1bu8; 30];
        let view = SequenceView::new(&bytes)?;

        let config = IndexConfig::default().output_dir(&missing);
        let err = build_index(&view, &config).unwrap_err();
        assert!(matches!(
            &err,
            Error::WriteError(WriteError::Table { path, .. }) if path == &missing.join(OFFSETS_FILE)
        ));
        assert!(err.to_string().contains(OFFSETS_FILE));
        assert!(!missing.exists());
        Ok(())
    }
}

