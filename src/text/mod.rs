//! Line-oriented text helpers.
//!
//! The adapters here are lazy and compose: a typical pipeline strips each
//! line, drops comments, then parses what is left while counting how many
//! lines were read and how many parsed successfully.
//!
//! ```
//! use utl::text::{lines_parser, lines_stripped, lines_uncommented, DEFAULT_COMMENTS};
//!
//! let input = ["  alpha = 1", "# note", "beta = 2 ", "garbage"];
//! let parsed: Vec<_> = lines_parser(
//!     lines_uncommented(lines_stripped(input, None), DEFAULT_COMMENTS),
//!     |line: &str| line.split_once(" = ").map(|(k, v)| (k.to_owned(), v.to_owned())),
//! )
//! .collect();
//!
//! assert_eq!(parsed.len(), 2);
//! assert_eq!(parsed[1].0.read, 2);
//! assert_eq!(parsed[1].0.processed, 2);
//! ```

mod progress;

pub use progress::{ProgressPrinter, DEFAULT_JUSTIFY};

/// Comment prefixes recognised by [`lines_uncommented`] by default.
pub const DEFAULT_COMMENTS: &[&str] = &[";", "#"];

/// Split `s` into pieces of `size` characters; the last piece may be
/// shorter.  A `size` of zero is treated as one.
pub fn chunk(s: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    chars.chunks(size.max(1)).map(|c| c.iter().collect()).collect()
}

/// Trim each line.  `None` trims whitespace; `Some(set)` trims any of the
/// characters in `set` from both ends.
pub fn lines_stripped<'a, I>(lines: I, chars: Option<&'a str>) -> impl Iterator<Item = String> + 'a
where
    I: IntoIterator + 'a,
    I::IntoIter: 'a,
    I::Item: AsRef<str>,
{
    lines.into_iter().map(move |line| {
        let line = line.as_ref();
        match chars {
            None      => line.trim().to_owned(),
            Some(set) => line.trim_matches(|c: char| set.contains(c)).to_owned(),
        }
    })
}

/// Drop lines starting with any of `prefixes`.
pub fn lines_uncommented<'a, I>(lines: I, prefixes: &'a [&'a str]) -> impl Iterator<Item = I::Item> + 'a
where
    I: IntoIterator + 'a,
    I::IntoIter: 'a,
    I::Item: AsRef<str>,
{
    lines
        .into_iter()
        .filter(move |line| !prefixes.iter().any(|p| line.as_ref().starts_with(p)))
}

// ── Parser ───────────────────────────────────────────────────────────────────

/// Counters reported alongside each parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseStats {
    /// 1-based number of the input line that produced the value.
    pub read:      usize,
    /// Lines parsed successfully so far, this one included.
    pub processed: usize,
}

/// Iterator returned by [`lines_parser`].
pub struct LinesParser<I, F> {
    lines: I,
    parse: F,
    stats: ParseStats,
}

/// Apply `parse_line` to every line, yielding `(stats, value)` for each
/// line it accepts.  Lines for which it returns `None` are skipped but
/// still counted in `read`.
pub fn lines_parser<I, F, T>(lines: I, parse_line: F) -> LinesParser<I::IntoIter, F>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    F: FnMut(&str) -> Option<T>,
{
    LinesParser { lines: lines.into_iter(), parse: parse_line, stats: ParseStats::default() }
}

impl<I, F, T> Iterator for LinesParser<I, F>
where
    I: Iterator,
    I::Item: AsRef<str>,
    F: FnMut(&str) -> Option<T>,
{
    type Item = (ParseStats, T);

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            self.stats.read += 1;
            if let Some(value) = (self.parse)(line.as_ref()) {
                self.stats.processed += 1;
                return Some((self.stats, value));
            }
        }
        None
    }
}
