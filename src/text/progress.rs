use std::io::{self, Write};

/// Default width the status line is padded to.
pub const DEFAULT_JUSTIFY: usize = 75;

/// Single-line console progress display.
///
/// Every call rewrites the current line (`\r`-prefixed, no newline):
///
/// ```text
/// <name> <read>/<total> (processed: <processed>)  Lines saved: <saved>
/// ```
///
/// When `update` switches to a different name, `" Done!"` and a newline
/// close the previous file's line first.
pub struct ProgressPrinter<W: Write> {
    out:        W,
    justify:    usize,
    name:       String,
    read:       u64,
    total:      u64,
    processed:  u64,
    saved:      u64,
}

impl ProgressPrinter<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr(), DEFAULT_JUSTIFY)
    }
}

impl<W: Write> ProgressPrinter<W> {
    pub fn new(out: W, justify: usize) -> Self {
        Self {
            out,
            justify,
            name:      String::new(),
            read:      0,
            total:     0,
            processed: 0,
            saved:     0,
        }
    }

    /// Report the state of file `name`.
    pub fn update(&mut self, name: &str, read: u64, total: u64, processed: u64) -> io::Result<()> {
        if name != self.name {
            if !self.name.is_empty() {
                writeln!(self.out, " Done!")?;
            }
            self.name = name.to_owned();
        }
        self.read      = read;
        self.total     = total;
        self.processed = processed;
        self.render()
    }

    /// Add `lines` to the saved-lines counter.
    pub fn add_saved(&mut self, lines: u64) -> io::Result<()> {
        self.saved += lines;
        self.render()
    }

    /// Close the current line.
    pub fn finish(&mut self) -> io::Result<()> {
        if !self.name.is_empty() {
            writeln!(self.out, " Done!")?;
            self.name.clear();
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self) -> io::Result<()> {
        let status = format!(
            "{} {}/{} (processed: {})  Lines saved: {}",
            self.name, self.read, self.total, self.processed, self.saved,
        );
        write!(self.out, "\r{:<width$}", status, width = self.justify.saturating_sub(1))?;
        self.out.flush()
    }
}
