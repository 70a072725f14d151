//! Link-layer helpers for wireless M-Bus (EN 13757-4) frame Format A:
//! the bit-serial CRC-16 engine, per-block CRC verification, and in-place
//! removal of the interleaved block CRCs from a received frame.

#![no_std]

#[cfg(feature = "defmt")]
use defmt::Format;

pub mod crc;
pub mod frame;
pub mod protocol;

pub use crc::*;
pub use frame::*;
pub use protocol::*;

/// Errors that can occur handling a link-layer frame
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Frame shorter than the mandatory first block
    FrameTooShort,
    /// Trailing block too short to carry its CRC
    TruncatedBlock,
    /// A block CRC did not match the block contents
    CrcMismatch,
    /// More bytes than [`frame::MAX_FRAME_LEN`] pushed into a [`FrameBuf`]
    BufferFull,
}
