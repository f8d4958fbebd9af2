//! ICY in-band metadata demultiplexing
//!
//! A server that advertises `icy-metaint: N` sends N audio bytes, then one
//! metadata block, then N audio bytes, and so on. A metadata block is a length
//! byte `L` followed by `L * 16` bytes of text. [`IcyDemuxer`] tracks where the
//! next block starts and removes blocks from the session buffer before audio
//! is handed to the caller.

use crate::config::icy::LENGTH_UNIT;
use crate::error::{InputError, Result};
use crate::stream::metadata::extract_stream_title;
use crate::stream::ring::ByteBuffer;

/// Result of looking for a metadata block at the front of the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaBlock {
    /// Audio is still due before the next block
    NotDue,
    /// A block is due but has not fully arrived yet; nothing was consumed
    Incomplete { needed: usize },
    /// A block was removed from the buffer
    Consumed { title: Option<String> },
}

#[derive(Debug, Clone)]
pub struct IcyDemuxer {
    metaint: usize,
    /// Audio bytes delivered since the last metadata block
    offset: usize,
}

impl IcyDemuxer {
    pub fn new(metaint: usize) -> Self {
        Self { metaint, offset: 0 }
    }

    pub fn is_active(&self) -> bool {
        self.metaint > 0
    }

    pub fn metaint(&self) -> usize {
        self.metaint
    }

    /// Audio bytes delivered since the last block
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Strip the metadata block at the front of `buffer` if one is due.
    ///
    /// Fails when the advertised block could never fit in the buffer.
    pub fn take_block(&mut self, buffer: &mut ByteBuffer) -> Result<MetaBlock> {
        if !self.is_active() || self.offset < self.metaint {
            return Ok(MetaBlock::NotDue);
        }
        let Some(&len_byte) = buffer.as_slice().first() else {
            return Ok(MetaBlock::Incomplete { needed: 1 });
        };

        let block_len = 1 + usize::from(len_byte) * LENGTH_UNIT;
        if block_len > buffer.capacity() {
            return Err(InputError::Protocol(format!(
                "ICY metadata block of {block_len} bytes exceeds buffer capacity {}",
                buffer.capacity()
            )));
        }
        if buffer.len() < block_len {
            return Ok(MetaBlock::Incomplete { needed: block_len });
        }

        let title = if block_len > 1 {
            extract_stream_title(&buffer.as_slice()[1..block_len])
        } else {
            None
        };
        buffer.consume(block_len);
        self.offset = 0;
        Ok(MetaBlock::Consumed { title })
    }

    /// Audio bytes that may be delivered before the next block is due
    pub fn deliverable(&self, buffered: usize) -> usize {
        if self.is_active() {
            buffered.min(self.metaint - self.offset)
        } else {
            buffered
        }
    }

    /// Record `n` audio bytes as delivered
    pub fn advance(&mut self, n: usize) {
        if self.is_active() {
            debug_assert!(self.offset + n <= self.metaint);
            self.offset = (self.offset + n).min(self.metaint);
        }
    }
}
