//! Key extraction with a bit-level sliding window
//!
//! Every byte offset `i` with a full 100-base look-ahead (25 bytes) yields four
//! base-aligned windows, one per base phase `j`, starting at base `4 * i + j`.
//! The key of a window is the big-endian value of its first three bytes once
//! the window has been re-aligned to the phase, i.e. the leading 12 bases.
//!
//! Re-alignment never touches the reference again: the key bytes are rotated
//! right by one base, pulling the low two bits of each byte into the high two
//! bits of the byte before it.

use crate::partition::Partition;
use crate::sequence::SequenceView;
use crate::{BASES_PER_BYTE, KEY_BYTES, WINDOW_BYTES};

/// Number of bytes held in the rotating register
///
/// One byte beyond the key feeds the last key byte through three rotations.
const REGISTER_BYTES: usize = KEY_BYTES + 1;

/// Bytes of the unrotated window inspected by the degenerate-region check
const TAIL_START: usize = KEY_BYTES + 1;
const TAIL_END: usize = WINDOW_BYTES - 1;

/// Receiver of the `(key, position)` pairs produced by [`scan`]
pub trait KeySink {
    /// Called once per emitted window, in ascending position order
    fn push(&mut self, key: u32, position: u32);
}

impl<F: FnMut(u32, u32)> KeySink for F {
    #[inline]
    fn push(&mut self, key: u32, position: u32) {
        self(key, position);
    }
}

/// The rotating key bytes of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRegister {
    bytes: [u8; REGISTER_BYTES],
}

impl KeyRegister {
    /// Loads the phase-0 register from the start of a window
    #[inline]
    #[must_use]
    pub fn load(window: &[u8]) -> Self {
        let mut bytes = [0u8; REGISTER_BYTES];
        bytes.copy_from_slice(&window[..REGISTER_BYTES]);
        Self { bytes }
    }

    /// Big-endian value of the leading key bytes
    #[inline]
    #[must_use]
    pub fn key(&self) -> u32 {
        self.bytes[..KEY_BYTES]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
    }

    /// Re-aligns the register one base to the right
    #[inline]
    pub fn shift_base(&mut self) {
        for k in 0..REGISTER_BYTES {
            let carry = self.bytes.get(k + 1).map_or(0, |&next| next & 0x3);
            self.bytes[k] = (self.bytes[k] >> 2) | (carry << 6);
        }
    }
}

/// Returns true if window bytes `4..24` are all zero
///
/// Together with a zero key this marks a padding/unknown region. The check
/// reads the unrotated window, so all four phases of an offset share it.
#[inline]
#[must_use]
pub fn is_degenerate_tail(window: &[u8]) -> bool {
    window[TAIL_START..TAIL_END]
        .iter()
        .fold(0u8, |acc, &b| acc | b)
        == 0
}

/// Base position of phase `phase` at byte offset `offset`
///
/// [`SequenceView`] guarantees the value fits in a `u32`.
#[inline]
fn position(offset: usize, phase: usize) -> u32 {
    (offset * BASES_PER_BYTE + phase) as u32
}

/// Emits every non-degenerate `(key, position)` pair whose key lies in `partition`
///
/// Pairs are produced in strictly ascending position order. References shorter
/// than one full window produce nothing.
pub fn scan<S: KeySink + ?Sized>(view: &SequenceView<'_>, partition: Partition, sink: &mut S) {
    for (offset, window) in view.as_bytes().windows(WINDOW_BYTES).enumerate() {
        let mut register = KeyRegister::load(window);
        for phase in 0..BASES_PER_BYTE {
            let key = register.key();
            if partition.contains(key) && !(key == 0 && is_degenerate_tail(window)) {
                sink.push(key, position(offset, phase));
            }
            register.shift_base();
        }
    }
}
