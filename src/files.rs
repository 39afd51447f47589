//! File-opening shortcuts, line counting and line-offset iteration.
//!
//! # Open mode
//! A [`Resource`] pairs a handle with the [`OpenMode`] it was opened in.
//! The mode is fixed at construction and checked structurally by consumers
//! that need raw bytes (the reverse reader refuses `Text` resources).
//! Rust performs no newline translation on any handle; the mode records
//! the caller's intent.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// UTF-8 byte order mark.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Read size used by [`file_lines_count`]: 1 MiB.
pub const COUNT_BUFFER_SIZE: usize = 1024 * 1024;

// ── Resource ─────────────────────────────────────────────────────────────────

/// How a [`Resource`] is meant to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Raw bytes, no decoding.
    Binary,
    /// Decoded text.
    Text,
}

impl OpenMode {
    pub fn is_binary(self) -> bool {
        matches!(self, OpenMode::Binary)
    }
}

/// A caller-owned handle tagged with its [`OpenMode`].
#[derive(Debug)]
pub struct Resource<R> {
    inner: R,
    mode:  OpenMode,
}

impl<R> Resource<R> {
    pub fn new(inner: R, mode: OpenMode) -> Self {
        Self { inner, mode }
    }

    pub fn binary(inner: R) -> Self {
        Self::new(inner, OpenMode::Binary)
    }

    pub fn text(inner: R) -> Self {
        Self::new(inner, OpenMode::Text)
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Resource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for Resource<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

// ── Opening shortcuts ────────────────────────────────────────────────────────

/// Open a file for reading raw bytes.
pub fn binary_file<P: AsRef<Path>>(path: P) -> io::Result<Resource<File>> {
    Ok(Resource::binary(File::open(path)?))
}

/// Open a file for reading text.
pub fn text_file<P: AsRef<Path>>(path: P) -> io::Result<Resource<File>> {
    Ok(Resource::text(File::open(path)?))
}

/// Create (or truncate) a file for writing bytes.
pub fn writable_binary_file<P: AsRef<Path>>(path: P) -> io::Result<File> {
    File::create(path)
}

/// Create (or truncate) a file for writing text.
pub fn writable_text_file<P: AsRef<Path>>(path: P) -> io::Result<File> {
    File::create(path)
}

/// Open a UTF-8 text file, skipping a leading byte order mark if present.
pub fn utf8_bom_text_file<P: AsRef<Path>>(path: P) -> io::Result<BufReader<File>> {
    let mut reader = BufReader::new(File::open(path)?);
    if reader.fill_buf()?.starts_with(&UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }
    Ok(reader)
}

// ── Line counting ────────────────────────────────────────────────────────────

/// Count lines in a file.
///
/// Counts line terminators the way universal-newline text reading sees
/// them: `\n`, `\r\n` and a bare `\r` each count once.  A non-empty file
/// has one more line than it has terminators, so `"a\nb"` and `"a\r\nb\r"`
/// count as 2 and 3 respectively, and an empty file counts as 0.
pub fn file_lines_count<P: AsRef<Path>>(path: P) -> io::Result<u64> {
    let mut file  = File::open(path)?;
    let mut buf   = vec![0u8; COUNT_BUFFER_SIZE];
    let mut lines = 0u64;
    let mut has_data = false;
    // `\r` at the end of the previous buffer, not yet known to be bare.
    let mut pending_cr = false;

    loop {
        let n = match file.read(&mut buf) {
            Ok(0)  => break,
            Ok(n)  => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        has_data = true;
        for &b in &buf[..n] {
            if b == b'\n' || pending_cr {
                lines += 1;
            }
            pending_cr = b == b'\r';
        }
    }

    if pending_cr {
        lines += 1;
    }
    if has_data {
        lines += 1;
    }
    Ok(lines)
}

// ── Offset iteration ─────────────────────────────────────────────────────────

/// Iterator of `(offset, line)` pairs; see [`offset_iter`].
pub struct LineOffsets<R> {
    reader: R,
    done:   bool,
}

/// Iterate the lines of `reader` together with the byte offset at which
/// each line starts.
///
/// Lines are raw bytes and keep their trailing `\n`.  Offsets are taken
/// from the reader's position, so iteration starts wherever the reader is
/// currently positioned.
pub fn offset_iter<R: BufRead + Seek>(reader: R) -> LineOffsets<R> {
    LineOffsets { reader, done: false }
}

impl<R> LineOffsets<R> {
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead + Seek> Iterator for LineOffsets<R> {
    type Item = io::Result<(u64, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let offset = match self.reader.stream_position() {
            Ok(pos) => pos,
            Err(e)  => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_)  => Some(Ok((offset, line))),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
