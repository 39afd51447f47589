use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use utl::encoding::TextEncoding;
use utl::files::{binary_file, file_lines_count, offset_iter, text_file};
use utl::hexstr;
use utl::reverse::{reverse_blocks, reverse_lines, ReverseOptions, DEFAULT_BLOCK_SIZE};
use utl::text::{chunk, lines_parser, lines_stripped, ProgressPrinter, DEFAULT_COMMENTS};
use utl::version::VersionStore;

#[derive(Parser)]
#[command(name = "utl", about = "Reverse line reader and small file utilities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the lines of a file, last line first
    Reverse {
        input: PathBuf,
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
        /// Keep line terminators exactly as stored
        #[arg(short, long)]
        keep_ends: bool,
        /// Encoding: ascii (default), latin-1, utf-8
        #[arg(short, long, default_value = "ascii")]
        encoding: TextEncoding,
        /// Stop after this many lines
        #[arg(short = 'n', long)]
        lines: Option<usize>,
    },
    /// Show the blocks a reverse read visits, in visiting order
    Blocks {
        input: PathBuf,
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },
    /// Count lines in a file
    Count {
        input: PathBuf,
    },
    /// Print the byte offset of every line
    Offsets {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print non-empty, uncommented lines with surrounding whitespace removed
    Strip {
        input: PathBuf,
        /// Comment prefix (repeatable; default ';' and '#')
        #[arg(short, long)]
        comment: Vec<String>,
        /// Report progress on stderr
        #[arg(short, long)]
        progress: bool,
    },
    /// Hex string helpers
    Hex {
        #[command(subcommand)]
        command: HexCommands,
    },
    /// Application version files
    Version {
        #[arg(short = 'C', long, default_value = ".")]
        dir: PathBuf,
        #[command(subcommand)]
        command: VersionCommands,
    },
}

#[derive(Subcommand)]
enum HexCommands {
    /// Decode a hex string and print the byte values
    Decode { hexstr: String },
    /// Hex-dump a file
    Encode {
        input: PathBuf,
        #[arg(long)]
        lower: bool,
        /// Bytes per output line
        #[arg(short, long, default_value = "16")]
        width: usize,
    },
    /// Swap the characters of every pair
    Swap { hexstr: String },
    /// Exit with status 1 unless the argument is a hex string
    Check { hexstr: String },
}

#[derive(Subcommand)]
enum VersionCommands {
    /// Increment the build number
    Bump,
    /// Print the current version
    Show {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct OffsetRecord {
    offset: u64,
    line:   String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match Cli::parse().command {

        // ── Reverse ──────────────────────────────────────────────────────────
        Commands::Reverse { input, block_size, keep_ends, encoding, lines } => {
            let options = ReverseOptions {
                block_size,
                keep_line_endings: keep_ends,
                encoding,
            };
            let mut file = binary_file(&input)?;
            let reader = reverse_lines(&mut file, options)?;
            for line in reader.take(lines.unwrap_or(usize::MAX)) {
                let line = line?;
                if keep_ends {
                    write!(out, "{}", line)?;
                } else {
                    writeln!(out, "{}", line)?;
                }
            }
        }

        // ── Blocks ───────────────────────────────────────────────────────────
        Commands::Blocks { input, block_size } => {
            let mut file = binary_file(&input)?;
            let blocks = reverse_blocks(&mut file, block_size)?;
            writeln!(out, "{} bytes in blocks of {}", blocks.size(), blocks.block_size())?;
            writeln!(out, "{:>12} {:>8}", "Offset", "Length")?;
            for block in blocks {
                let block = block?;
                writeln!(out, "{:>12} {:>8}", block.offset, block.data.len())?;
            }
        }

        // ── Count ────────────────────────────────────────────────────────────
        Commands::Count { input } => {
            writeln!(out, "{}", file_lines_count(&input)?)?;
        }

        // ── Offsets ──────────────────────────────────────────────────────────
        Commands::Offsets { input, json } => {
            let reader = BufReader::new(binary_file(&input)?);
            for item in offset_iter(reader) {
                let (offset, raw) = item?;
                let line = String::from_utf8_lossy(&raw);
                let line = line.trim_end_matches(&['\r', '\n'][..]);
                if json {
                    let record = OffsetRecord { offset, line: line.to_owned() };
                    writeln!(out, "{}", serde_json::to_string(&record)?)?;
                } else {
                    writeln!(out, "{:>12}  {}", offset, line)?;
                }
            }
        }

        // ── Strip ────────────────────────────────────────────────────────────
        Commands::Strip { input, comment, progress } => {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let total = file_lines_count(&input)?;
            let prefixes: Vec<&str> = if comment.is_empty() {
                DEFAULT_COMMENTS.to_vec()
            } else {
                comment.iter().map(String::as_str).collect()
            };

            let lines = BufReader::new(text_file(&input)?)
                .lines()
                .collect::<io::Result<Vec<String>>>()?;
            let kept = lines_parser(lines_stripped(lines, None), |line: &str| {
                let commented = prefixes.iter().any(|p| line.starts_with(p));
                (!commented && !line.is_empty()).then(|| line.to_owned())
            });

            let mut printer = progress.then(ProgressPrinter::stderr);
            let mut saved = 0u64;
            for (stats, line) in kept {
                writeln!(out, "{}", line)?;
                saved += 1;
                if let Some(p) = printer.as_mut() {
                    p.update(&name, stats.read as u64, total, stats.processed as u64)?;
                }
            }
            if let Some(p) = printer.as_mut() {
                p.add_saved(saved)?;
                p.finish()?;
            }
        }

        // ── Hex ──────────────────────────────────────────────────────────────
        Commands::Hex { command } => match command {
            HexCommands::Decode { hexstr: text } => {
                let bytes = hexstr::hexstr_to_bytes(&text)?;
                let values: Vec<String> = bytes.iter().map(u8::to_string).collect();
                writeln!(out, "{}", values.join(" "))?;
            }
            HexCommands::Encode { input, lower, width } => {
                let data = std::fs::read(&input)?;
                let dump = hexstr::bytes_to_hexstr(&data, !lower);
                for (i, row) in chunk(&dump, width.max(1) * 2).iter().enumerate() {
                    writeln!(out, "{:08x}  {}", i * width.max(1), row)?;
                }
            }
            HexCommands::Swap { hexstr: text } => {
                writeln!(out, "{}", hexstr::swap_nibbles(&text)?)?;
            }
            HexCommands::Check { hexstr: text } => {
                if !hexstr::is_hexstr(&text) {
                    std::process::exit(1);
                }
            }
        },

        // ── Version ──────────────────────────────────────────────────────────
        Commands::Version { dir, command } => {
            let store = VersionStore::new(dir);
            match command {
                VersionCommands::Bump => {
                    writeln!(out, "{}", store.new_version()?)?;
                }
                VersionCommands::Show { json } => {
                    let version = store.current_version()?;
                    if json {
                        writeln!(out, "{}", serde_json::to_string(&version)?)?;
                    } else {
                        writeln!(out, "{}", version)?;
                    }
                }
            }
        }
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reverse_encoding(args: &[&str]) -> Result<TextEncoding, clap::Error> {
        let cli = Cli::try_parse_from(args)?;
        match cli.command {
            Commands::Reverse { encoding, .. } => Ok(encoding),
            _ => panic!("expected the reverse subcommand"),
        }
    }

    #[test]
    fn encoding_defaults_to_ascii() {
        assert_eq!(reverse_encoding(&["utl", "reverse", "log.txt"]).unwrap(), TextEncoding::Ascii);
    }

    #[test]
    fn encoding_aliases_accepted() {
        let enc = reverse_encoding(&["utl", "reverse", "-e", "UTF8", "log.txt"]).unwrap();
        assert_eq!(enc, TextEncoding::Utf8);
    }

    #[test]
    fn unknown_encoding_rejected() {
        let err = reverse_encoding(&["utl", "reverse", "-e", "cp1250", "log.txt"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
