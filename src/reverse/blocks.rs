use std::io::{self, Read, Seek, SeekFrom};

use crate::files::Resource;
use super::ReadError;

/// One block read from the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Absolute byte offset of `data[0]` in the resource.
    pub offset: u64,
    pub data:   Vec<u8>,
}

/// Lazy tail-to-head block sequence; see [`reverse_blocks`].
pub struct ReverseBlocks<'a, R> {
    resource:    &'a mut Resource<R>,
    block_size:  u64,
    size:        u64,
    full_blocks: u64,
    /// Blocks still to yield, tail remainder included.
    remaining:   u64,
}

/// Enumerate `resource` in `block_size` blocks from its end to its start.
///
/// The resource size is taken once, here.  Yields `full_blocks + 1` blocks:
/// the `size % block_size` trailing bytes first, then each full block in
/// descending offset order.
///
/// # Errors
/// `InvalidMode` for a text-mode resource and `InvalidBlockSize` for a zero
/// block size, both before any I/O.  A failing seek to the end surfaces as
/// `Io`.
pub fn reverse_blocks<R: Read + Seek>(
    resource:   &mut Resource<R>,
    block_size: usize,
) -> Result<ReverseBlocks<'_, R>, ReadError> {
    if !resource.mode().is_binary() {
        return Err(ReadError::InvalidMode);
    }
    if block_size == 0 {
        return Err(ReadError::InvalidBlockSize(block_size));
    }

    let size        = resource.seek(SeekFrom::End(0))?;
    let block_size  = block_size as u64;
    let full_blocks = size / block_size;
    log::debug!(
        "reverse read: {} bytes, {} full block(s) of {} + {} trailing byte(s)",
        size, full_blocks, block_size, size % block_size,
    );

    Ok(ReverseBlocks {
        resource,
        block_size,
        size,
        full_blocks,
        remaining: full_blocks + 1,
    })
}

impl<'a, R: Read + Seek> ReverseBlocks<'a, R> {
    /// Resource size in bytes, as measured at construction.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    fn read_block(&mut self, offset: u64, len: u64) -> io::Result<Block> {
        self.resource.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; len as usize];
        self.resource.read_exact(&mut data)?;
        log::trace!("read block at {} ({} bytes)", offset, len);
        Ok(Block { offset, data })
    }
}

impl<'a, R: Read + Seek> Iterator for ReverseBlocks<'a, R> {
    type Item = io::Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tail = self.remaining == self.full_blocks + 1;
        self.remaining -= 1;

        let (offset, len) = if tail {
            let start = self.full_blocks * self.block_size;
            (start, self.size - start)
        } else {
            (self.remaining * self.block_size, self.block_size)
        };

        let result = self.read_block(offset, len);
        if result.is_err() {
            self.remaining = 0;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}
