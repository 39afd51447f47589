use std::io::{Read, Seek};
use std::mem;

use crate::encoding::BlockDecoder;
use crate::files::Resource;
use super::{reverse_blocks, ReadError, ReverseBlocks, ReverseOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Streaming,
    Done,
}

/// Lazy reverse-order line sequence; see [`reverse_lines`].
pub struct ReverseLines<'a, R> {
    blocks:            ReverseBlocks<'a, R>,
    decoder:           BlockDecoder,
    keep_line_endings: bool,
    /// Earliest line seen so far; its start may lie in an unread block.
    carry:             String,
    /// Complete lines of the current buffer in file order, popped from the back.
    ready:             Vec<String>,
    state:             State,
}

/// Iterate the lines of `resource` from the last line to the first.
///
/// Configuration errors are returned here, before any line is read.
pub fn reverse_lines<R: Read + Seek>(
    resource: &mut Resource<R>,
    options:  ReverseOptions,
) -> Result<ReverseLines<'_, R>, ReadError> {
    let blocks = reverse_blocks(resource, options.block_size)?;
    Ok(ReverseLines {
        blocks,
        decoder:           BlockDecoder::new(options.encoding),
        keep_line_endings: options.keep_line_endings,
        carry:             String::new(),
        ready:             Vec::new(),
        state:             State::Streaming,
    })
}

impl<'a, R: Read + Seek> ReverseLines<'a, R> {
    fn emit(&self, line: String) -> String {
        if self.keep_line_endings {
            line
        } else {
            strip_line_ending(&line).to_owned()
        }
    }

    fn fail(&mut self, err: ReadError) -> Option<Result<String, ReadError>> {
        self.state = State::Done;
        self.ready.clear();
        Some(Err(err))
    }
}

impl<'a, R: Read + Seek> Iterator for ReverseLines<'a, R> {
    type Item = Result<String, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.ready.pop() {
                return Some(Ok(self.emit(line)));
            }
            if self.state == State::Done {
                return None;
            }

            match self.blocks.next() {
                Some(Ok(block)) => {
                    let mut buf = match self.decoder.decode(block.offset, &block.data) {
                        Ok(text) => text,
                        Err(e)   => return self.fail(e.into()),
                    };
                    buf.push_str(&self.carry);

                    let mut lines = split_lines(&buf);
                    if lines.is_empty() {
                        continue;
                    }
                    let rest = lines.split_off(1);
                    self.carry = lines.pop().unwrap_or_default().to_owned();
                    self.ready = rest.into_iter().map(str::to_owned).collect();
                }
                Some(Err(e)) => return self.fail(e.into()),
                None => {
                    if let Err(e) = self.decoder.finish() {
                        return self.fail(e.into());
                    }
                    self.state = State::Done;
                    let first = mem::take(&mut self.carry);
                    return Some(Ok(self.emit(first)));
                }
            }
        }
    }
}

// ── Line splitting ───────────────────────────────────────────────────────────

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split `text` into lines, each keeping its terminator.
///
/// `\r\n` is a single terminator.  A trailing terminator does not produce
/// an empty final line, and empty input produces no lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                end = j + 1;
                chars.next();
            }
        }
        lines.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// `line` without its trailing terminator, if any.
pub fn strip_line_ending(line: &str) -> &str {
    if let Some(stripped) = line.strip_suffix("\r\n") {
        return stripped;
    }
    match line.chars().next_back() {
        Some(c) if is_line_break(c) => &line[..line.len() - c.len_utf8()],
        _ => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;
    use crate::reverse::test_io::FailingBelow;
    use std::io::Cursor;

    fn collect(content: &[u8], options: ReverseOptions) -> Vec<String> {
        let mut res = Resource::binary(Cursor::new(content.to_vec()));
        reverse_lines(&mut res, options)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn opts(block_size: usize, keep_line_endings: bool) -> ReverseOptions {
        ReverseOptions { block_size, keep_line_endings, ..Default::default() }
    }

    #[test]
    fn split_keeps_terminators() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a\n", "b\r\n", "c\r", "d"]);
        assert_eq!(split_lines("a\n"), vec!["a\n"]);
        assert_eq!(split_lines("\n\n"), vec!["\n", "\n"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn strip_handles_crlf_and_bare_text() {
        assert_eq!(strip_line_ending("x\r\n"), "x");
        assert_eq!(strip_line_ending("x\n"), "x");
        assert_eq!(strip_line_ending("x\u{2028}"), "x");
        assert_eq!(strip_line_ending("x"), "x");
        assert_eq!(strip_line_ending(""), "");
    }

    #[test]
    fn no_trailing_terminator() {
        assert_eq!(
            collect(b"1111\n2222\n3333\n444", opts(4, false)),
            vec!["444", "3333", "2222", "1111"],
        );
    }

    #[test]
    fn terminators_preserved() {
        assert_eq!(
            collect(b"1111\n2222\n3333\n444", opts(3, true)),
            vec!["444", "3333\n", "2222\n", "1111\n"],
        );
    }

    #[test]
    fn default_block_size() {
        assert_eq!(
            collect(b"1111\n2222\n3333\n444", ReverseOptions::default()),
            vec!["444", "3333", "2222", "1111"],
        );
    }

    #[test]
    fn empty_resource_yields_single_empty_line() {
        assert_eq!(collect(b"", opts(4, false)), vec![""]);
        assert_eq!(collect(b"", opts(1, true)), vec![""]);
    }

    #[test]
    fn crlf_split_across_blocks() {
        // Block size 3 splits the terminator: "ab\r" | "\ncd".
        let content = b"ab\r\ncd";
        assert_eq!(collect(content, opts(3, true)), vec!["cd", "ab\r\n"]);
        assert_eq!(collect(content, opts(3, false)), vec!["cd", "ab"]);
    }

    #[test]
    fn blank_lines_independent_of_block_size() {
        let content = b"a\n\n";
        let expected = vec!["", "a"];
        for bs in [1, 2, 3, 4096] {
            assert_eq!(collect(content, opts(bs, false)), expected, "block size {}", bs);
        }
    }

    #[test]
    fn utf8_across_block_boundaries() {
        let content = "żółw\nkot\n€uro".as_bytes();
        let options = ReverseOptions {
            block_size:        1,
            keep_line_endings: false,
            encoding:          TextEncoding::Utf8,
        };
        assert_eq!(collect(content, options), vec!["€uro", "kot", "żółw"]);
    }

    #[test]
    fn decoding_error_ends_iteration() {
        let mut res = Resource::binary(Cursor::new(b"bad\xff\nok\nend".to_vec()));
        let mut lines = reverse_lines(&mut res, opts(4, false)).unwrap();

        assert_eq!(lines.next().unwrap().unwrap(), "end");
        assert_eq!(lines.next().unwrap().unwrap(), "ok");
        let err = lines.next().unwrap().unwrap_err();
        assert!(matches!(err, ReadError::Decoding { offset: 3, .. }));
        assert!(lines.next().is_none());
    }

    #[test]
    fn io_error_ends_iteration() {
        let mut res = Resource::binary(FailingBelow::new(b"1111\n2222\n3333\n444", 8));
        let mut lines = reverse_lines(&mut res, opts(4, false)).unwrap();

        assert_eq!(lines.next().unwrap().unwrap(), "444");
        assert_eq!(lines.next().unwrap().unwrap(), "3333");
        let err = lines.next().unwrap().unwrap_err();
        assert!(matches!(err, ReadError::Io(_)));
        assert!(!err.is_configuration());
        assert!(lines.next().is_none());
        assert!(lines.next().is_none());
    }

    #[test]
    fn lines_are_lazy() {
        let content: Vec<u8> = (0..1000).flat_map(|i| format!("line {}\n", i).into_bytes()).collect();
        let mut res = Resource::binary(Cursor::new(content));
        let last: Vec<String> = reverse_lines(&mut res, opts(64, false))
            .unwrap()
            .take(2)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(last, vec!["line 999", "line 998"]);
    }
}
