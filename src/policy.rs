use std::str::FromStr;

use rand::Rng;

use crate::{error::WriteError, Result};

/// Seed of the random number generator used by [`Policy::RandomDraw`]
pub const RNG_SEED: u64 = 42;

/// Policy for handling invalid nucleotides while packing a reference
///
/// Packed references have no way to mark an unknown base, so every non-ACGT
/// character must either be replaced or rejected. The default replaces with `A`,
/// whose all-zero encoding is what the index builder treats as padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
    #[default]
    SetToA,
    SetToC,
    SetToG,
    SetToT,
    RandomDraw,
    BreakOnInvalid,
}
impl Policy {
    fn fill_with_known(sequence: &[u8], val: u8, ibuf: &mut Vec<u8>) {
        for &n in sequence {
            ibuf.push(match n {
                b'A' | b'C' | b'G' | b'T' => n,
                _ => val,
            });
        }
    }

    fn fill_with_random<R: Rng>(sequence: &[u8], rng: &mut R, ibuf: &mut Vec<u8>) {
        for &n in sequence {
            ibuf.push(match n {
                b'A' | b'C' | b'G' | b'T' => n,
                _ => b"ACGT"[rng.random_range(0..4)],
            });
        }
    }

    /// Convert the sequence according to the N-policy
    ///
    /// First clears the output buffer to ensure that it is empty.
    ///
    /// Returns an error if the sequence should be broken on invalid nucleotides.
    ///
    /// # Arguments
    /// * `sequence` - The (uppercase) sequence to be converted
    /// * `ibuf` - The buffer to store the converted sequence
    /// * `rng` - The random number generator
    pub fn handle<R: Rng>(&self, sequence: &[u8], ibuf: &mut Vec<u8>, rng: &mut R) -> Result<()> {
        ibuf.clear();
        match self {
            Self::SetToA => Self::fill_with_known(sequence, b'A', ibuf),
            Self::SetToC => Self::fill_with_known(sequence, b'C', ibuf),
            Self::SetToG => Self::fill_with_known(sequence, b'G', ibuf),
            Self::SetToT => Self::fill_with_known(sequence, b'T', ibuf),
            Self::RandomDraw => Self::fill_with_random(sequence, rng, ibuf),
            Self::BreakOnInvalid => {
                let seq_str = std::str::from_utf8(sequence)?.to_string();
                return Err(WriteError::InvalidNucleotideSequence(seq_str).into());
            }
        }
        Ok(())
    }
}

impl FromStr for Policy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a" => Ok(Self::SetToA),
            "c" => Ok(Self::SetToC),
            "g" => Ok(Self::SetToG),
            "t" => Ok(Self::SetToT),
            "random" | "r" => Ok(Self::RandomDraw),
            "break" | "b" => Ok(Self::BreakOnInvalid),
            _ => Err(anyhow::anyhow!("Unknown nucleotide policy: {s}").into()),
        }
    }
}
