//! Reverse line reader — iterate a file's lines from last to first.
//!
//! # Block enumeration
//! [`reverse_blocks`] reads a seekable binary [`Resource`](crate::files::Resource) backward in
//! fixed-size blocks.  The first block yielded is the short remainder at
//! the end of the file (possibly empty), so every later block is aligned
//! on a `block_size` boundary.  Only block order is reversed; bytes inside
//! a block keep file order:
//!
//! ```text
//! "111122223333444", block_size 4  →  "444", "3333", "2222", "1111"
//! ```
//!
//! # Line reassembly
//! [`reverse_lines`] decodes each block, prepends it to a carry buffer and
//! splits the buffer into lines.  The earliest line in the buffer may have
//! started in a block not yet read, so it stays in the carry; every other
//! line is complete and is yielded, latest first.  Once the head of the
//! file has been read the carry is yielded as the first line.
//!
//! No line index is built and at most one block is buffered beyond the
//! carry.
//!
//! ```no_run
//! use utl::files::binary_file;
//! use utl::reverse::{reverse_lines, ReverseOptions};
//!
//! let mut log = binary_file("app.log")?;
//! for line in reverse_lines(&mut log, ReverseOptions::default())?.take(10) {
//!     println!("{}", line?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Errors
//! Configuration errors (text-mode resource, zero block size) are returned
//! before anything is read.  I/O and decoding errors end the iteration:
//! the iterator yields the `Err` once and then returns `None`.

mod blocks;
mod lines;

pub use blocks::{reverse_blocks, Block, ReverseBlocks};
pub use lines::{reverse_lines, split_lines, strip_line_ending, ReverseLines};

use std::io;
use thiserror::Error;

use crate::encoding::{DecodeFailure, TextEncoding};

/// Default block size: 4 KiB.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

// ── ReverseOptions ───────────────────────────────────────────────────────────

/// Configuration for [`reverse_lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseOptions {
    pub block_size:        usize,
    /// Keep each line's terminator (`\n`, `\r\n`, ...) as part of the line.
    pub keep_line_endings: bool,
    pub encoding:          TextEncoding,
}

impl Default for ReverseOptions {
    fn default() -> Self {
        Self {
            block_size:        DEFAULT_BLOCK_SIZE,
            keep_line_endings: false,
            encoding:          TextEncoding::Ascii,
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Resource must be opened in binary mode")]
    InvalidMode,
    #[error("Block size must be positive, got {0}")]
    InvalidBlockSize(usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot decode byte at offset {offset} as {encoding}")]
    Decoding { encoding: TextEncoding, offset: u64 },
}

impl ReadError {
    /// True for errors raised before any read: bad mode or block size.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ReadError::InvalidMode | ReadError::InvalidBlockSize(_))
    }
}

impl From<DecodeFailure> for ReadError {
    fn from(f: DecodeFailure) -> Self {
        ReadError::Decoding { encoding: f.encoding, offset: f.offset }
    }
}

#[cfg(test)]
pub(crate) mod test_io {
    use std::io::{self, Cursor, Read, Seek, SeekFrom};

    /// In-memory resource whose reads fail while positioned below `bad_below`.
    pub(crate) struct FailingBelow {
        inner:     Cursor<Vec<u8>>,
        bad_below: u64,
    }

    impl FailingBelow {
        pub(crate) fn new(content: &[u8], bad_below: u64) -> Self {
            Self { inner: Cursor::new(content.to_vec()), bad_below }
        }
    }

    impl Read for FailingBelow {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.inner.position() < self.bad_below {
                return Err(io::Error::new(io::ErrorKind::Other, "device error"));
            }
            self.inner.read(buf)
        }
    }

    impl Seek for FailingBelow {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }
}
