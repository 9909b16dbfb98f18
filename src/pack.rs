//! Packing nucleotide text into the 2-bit reference layout
//!
//! Bases are encoded 32 at a time with `bitnuc` (A=00, C=01, G=10, T=11, first
//! base in the least significant bits) and written as little-endian `u64`
//! chunks, so base `n` lands in byte `n / 4` at bit offset `2 * (n % 4)`. The
//! final partial chunk is truncated to the bytes it actually occupies.

use std::io::{BufRead, Write};

use byteorder::{ByteOrder, LittleEndian};
use rand::{rngs::SmallRng, SeedableRng};

use crate::error::Result;
use crate::policy::{Policy, RNG_SEED};
use crate::BASES_PER_BYTE;

/// Number of bases held by one encoded `u64`
const CHUNK_BASES: usize = 32;

#[inline]
fn is_valid_base(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

/// Streams nucleotide text into a packed reference
pub struct ReferencePacker<W: Write> {
    /// Inner writer
    inner: W,

    /// Invalid nucleotide policy
    policy: Policy,

    /// Random number generator for the `RandomDraw` policy
    rng: SmallRng,

    /// Uppercased bases waiting for a full chunk
    pending: Vec<u8>,

    /// Reusable buffer for policy-corrected bases
    ibuf: Vec<u8>,

    /// Reusable buffer for the 2-bit encoding
    ebuf: Vec<u64>,

    /// Number of bases written so far
    bases: u64,
}

impl<W: Write> ReferencePacker<W> {
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self::with_policy(inner, Policy::default())
    }

    #[must_use]
    pub fn with_policy(inner: W, policy: Policy) -> Self {
        Self {
            inner,
            policy,
            rng: SmallRng::seed_from_u64(RNG_SEED),
            pending: Vec::with_capacity(CHUNK_BASES),
            ibuf: Vec::with_capacity(CHUNK_BASES),
            ebuf: Vec::with_capacity(1),
            bases: 0,
        }
    }

    /// Appends nucleotides to the reference
    ///
    /// Whitespace is ignored and lowercase (soft-masked) bases are uppercased.
    /// Anything else outside of `ACGT` goes through the packer's [`Policy`].
    pub fn push(&mut self, sequence: &[u8]) -> Result<()> {
        for &b in sequence {
            if b.is_ascii_whitespace() {
                continue;
            }
            self.pending.push(b.to_ascii_uppercase());
            if self.pending.len() == CHUNK_BASES {
                self.write_chunk()?;
            }
        }
        Ok(())
    }

    /// Encodes and writes the pending bases
    fn write_chunk(&mut self) -> Result<()> {
        let n = self.pending.len();
        if n == 0 {
            return Ok(());
        }
        let bases = if self.pending.iter().copied().all(is_valid_base) {
            &self.pending
        } else {
            self.policy
                .handle(&self.pending, &mut self.ibuf, &mut self.rng)?;
            &self.ibuf
        };

        self.ebuf.clear();
        bitnuc::twobit::encode(bases, &mut self.ebuf)?;

        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, self.ebuf[0]);
        self.inner.write_all(&bytes[..n.div_ceil(BASES_PER_BYTE)])?;

        self.bases += n as u64;
        self.pending.clear();
        Ok(())
    }

    /// Number of bases accepted so far, including pending ones
    #[must_use]
    pub fn num_bases(&self) -> u64 {
        self.bases + self.pending.len() as u64
    }

    /// Writes the final partial chunk and returns the inner writer with the base count
    pub fn finish(mut self) -> Result<(W, u64)> {
        self.write_chunk()?;
        self.inner.flush()?;
        Ok((self.inner, self.bases))
    }
}

/// Packs every sequence of a FASTA stream, concatenated, into one reference
///
/// Header (`>`) and comment (`;`) lines are skipped. Returns the number of
/// bases written.
pub fn pack_fasta<R: BufRead, W: Write>(reader: R, writer: W, policy: Policy) -> Result<u64> {
    let mut packer = ReferencePacker::with_policy(writer, policy);
    for line in reader.split(b'\n') {
        let line = line?;
        if matches!(line.first(), Some(b'>' | b';')) {
            continue;
        }
        packer.push(&line)?;
    }
    let (_, bases) = packer.finish()?;
    Ok(bases)
}
