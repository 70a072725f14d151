//! In-place handling of received link-layer frames (EN 13757-4 frame
//! Format A).
//!
//! A Format A frame interleaves payload with per-block CRCs: a 12-byte
//! first block (10 bytes of link header plus a 2-byte CRC) followed by
//! data blocks of up to 18 bytes (16 payload bytes plus a 2-byte CRC),
//! the last block possibly shorter. [`verify`] checks every block CRC and
//! [`compact`] strips them, repacking the payload contiguously behind the
//! 10 header bytes.

use crate::{crc::checksum, protocol::LinkHeader, LinkError};
use heapless::Vec;
use log::*;

/// Link header preserved at the front of a compacted frame.
pub const LINK_HEADER_SIZE: usize = 10;
/// First block: link header plus its CRC.
pub const FIRST_BLOCK_SIZE: usize = 12;
/// Full data block: payload plus its CRC.
pub const BLOCK_SIZE: usize = 18;
/// Payload bytes carried by a full data block.
pub const BLOCK_PAYLOAD_SIZE: usize = 16;
/// Per-block CRC width.
pub const BLOCK_CRC_SIZE: usize = 2;

/// The L-field is a single byte, so no real frame exceeds this.
pub const MAX_FRAME_LEN: usize = 255;

/// Strip the interleaved block CRCs from `frame` in place.
///
/// The slice is the whole received frame; its length is the frame length
/// and must cover at least the first block. The 10 header bytes stay
/// where they are, the first block's CRC is dropped, and each data
/// block's payload lands immediately after the previous one. Returns the
/// new logical length; bytes past it are left as garbage.
///
/// The write cursor trails the read cursor by the CRC bytes already
/// dropped, so source and destination overlap and each block moves with
/// an overlap-safe copy. A trailing block of one or two bytes holds no
/// payload and contributes nothing.
pub fn compact(frame: &mut [u8]) -> Result<usize, LinkError> {
    if frame.len() < FIRST_BLOCK_SIZE {
        return Err(LinkError::FrameTooShort);
    }

    let mut read = FIRST_BLOCK_SIZE;
    let mut write = LINK_HEADER_SIZE;
    let mut remaining = frame.len() - FIRST_BLOCK_SIZE;

    while remaining > 0 {
        if remaining >= BLOCK_SIZE {
            frame.copy_within(read..read + BLOCK_PAYLOAD_SIZE, write);
            write += BLOCK_PAYLOAD_SIZE;
            read += BLOCK_SIZE;
            remaining -= BLOCK_SIZE;
        } else {
            // Short trailing block; a 1- or 2-byte tail is CRC only.
            let keep = remaining.saturating_sub(BLOCK_CRC_SIZE);
            frame.copy_within(read..read + keep, write);
            write += keep;
            remaining = 0;
        }
    }

    debug!("compact: {} byte frame -> {} bytes", frame.len(), write);
    Ok(write)
}

/// Length [`compact`] returns for a `len`-byte frame.
///
/// Meaningful for `len` of at least [`FIRST_BLOCK_SIZE`].
pub fn compacted_len(len: usize) -> usize {
    let body = len.saturating_sub(FIRST_BLOCK_SIZE);
    let tail = body % BLOCK_SIZE;

    LINK_HEADER_SIZE + (body / BLOCK_SIZE) * BLOCK_PAYLOAD_SIZE + tail.saturating_sub(BLOCK_CRC_SIZE)
}

/// Check every block CRC of a received frame.
///
/// Each block carries the complemented CRC-16 of its own contents, most
/// significant byte first: the first block covers the 10 header bytes,
/// every following block covers its payload bytes.
pub fn verify(frame: &[u8]) -> Result<(), LinkError> {
    if frame.len() < FIRST_BLOCK_SIZE {
        return Err(LinkError::FrameTooShort);
    }

    check_block(&frame[..FIRST_BLOCK_SIZE], 0)?;

    let mut offset = FIRST_BLOCK_SIZE;
    let mut block = 1;
    while offset < frame.len() {
        let remaining = frame.len() - offset;
        if remaining < BLOCK_CRC_SIZE {
            debug!("verify: {} byte tail cannot hold a CRC", remaining);
            return Err(LinkError::TruncatedBlock);
        }
        let size = remaining.min(BLOCK_SIZE);
        check_block(&frame[offset..offset + size], block)?;
        offset += size;
        block += 1;
    }

    Ok(())
}

/// CRC check for one block: data bytes followed by the stored CRC.
fn check_block(block: &[u8], index: usize) -> Result<(), LinkError> {
    let data_len = block.len() - BLOCK_CRC_SIZE;
    let stored = u16::from_be_bytes([block[data_len], block[data_len + 1]]);
    let computed = checksum(&block[..data_len]);

    trace!(
        "block {}: stored crc {:04x}, computed {:04x}",
        index,
        stored,
        computed
    );
    if stored != computed {
        debug!("verify: crc mismatch in block {}", index);
        return Err(LinkError::CrcMismatch);
    }

    Ok(())
}

/// Receive buffer for one link-layer frame.
///
/// Radio drivers deliver a frame in chunks; `FrameBuf` accumulates them
/// up to the link layer's 255-byte cap, then checks and compacts the
/// frame in place.
#[derive(Debug, Clone, Default)]
pub struct FrameBuf {
    buf: Vec<u8, MAX_FRAME_LEN>,
}

impl FrameBuf {
    /// New empty buffer
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append received bytes
    pub fn push_slice(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.buf
            .extend_from_slice(data)
            .map_err(|_| LinkError::BufferFull)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop the accumulated bytes, ready for the next frame
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Typed view of the link header, once a full header has arrived.
    pub fn header(&self) -> Option<LinkHeader> {
        if self.buf.len() < LINK_HEADER_SIZE {
            return None;
        }
        Some(LinkHeader::from_bytes(&self.buf))
    }

    /// Check every block CRC of the accumulated frame.
    pub fn verify(&self) -> Result<(), LinkError> {
        verify(&self.buf)
    }

    /// Strip the block CRCs and truncate to the compacted length.
    pub fn compact(&mut self) -> Result<usize, LinkError> {
        let len = compact(&mut self.buf)?;
        self.buf.truncate(len);
        Ok(len)
    }

    /// Bytes behind the link header; the contiguous payload once
    /// [`Self::compact`] has run.
    pub fn payload(&self) -> &[u8] {
        &self.buf[LINK_HEADER_SIZE.min(self.buf.len())..]
    }
}
