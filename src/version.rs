//! Application version bookkeeping: `major.minor.build`.
//!
//! Two files live in the store directory:
//!
//! | File | Content | Maintained by |
//! |------|---------|---------------|
//! | `main_version.txt` | `major.minor` | hand (created as `1.0` if missing) |
//! | `app_version.txt`  | `version = 'major.minor.build'` | [`VersionStore::new_version`] |
//!
//! Every [`VersionStore::new_version`] call increments the build number of
//! the previous full version and rewrites `app_version.txt`.  To bump major
//! or minor and restart the build count, edit `main_version.txt` and
//! delete `app_version.txt`.
//!
//! Both files are read through the text helpers: the first non-empty line
//! that is not a `#`/`;` comment is the value.

use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::files::{text_file, writable_text_file};
use crate::text::{lines_stripped, lines_uncommented, DEFAULT_COMMENTS};

pub const MAIN_VERSION_FILE:    &str = "main_version.txt";
pub const FULL_VERSION_FILE:    &str = "app_version.txt";
pub const DEFAULT_MAIN_VERSION: &str = "1.0";

pub const MAX_MAJOR: u32 = 255;
pub const MAX_MINOR: u32 = 255;
pub const MAX_BUILD: u32 = 65535;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Malformed version '{0}'")]
    Malformed(String),
    #[error("{part} version value {value} exceeds the maximum {max}")]
    OutOfRange { part: &'static str, value: u32, max: u32 },
    #[error("Maximum build number {} reached", MAX_BUILD)]
    BuildExhausted,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Version ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, build: u32) -> Result<Self, VersionError> {
        check_range("major", major, MAX_MAJOR)?;
        check_range("minor", minor, MAX_MINOR)?;
        check_range("build", build, MAX_BUILD)?;
        Ok(Self { major, minor, build })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_parts(s)?.as_slice() {
            &[major, minor, build] => Version::new(major, minor, build),
            _ => Err(VersionError::Malformed(s.to_owned())),
        }
    }
}

fn check_range(part: &'static str, value: u32, max: u32) -> Result<(), VersionError> {
    if value > max {
        return Err(VersionError::OutOfRange { part, value, max });
    }
    Ok(())
}

fn parse_parts(s: &str) -> Result<Vec<u32>, VersionError> {
    s.trim()
        .split('.')
        .map(|p| p.parse::<u32>().map_err(|_| VersionError::Malformed(s.to_owned())))
        .collect()
}

/// `major.minor` as kept in the main version file.
fn parse_main_version(s: &str) -> Result<(u32, u32), VersionError> {
    match parse_parts(s)?.as_slice() {
        &[major, minor] => {
            check_range("major", major, MAX_MAJOR)?;
            check_range("minor", minor, MAX_MINOR)?;
            Ok((major, minor))
        }
        _ => Err(VersionError::Malformed(s.to_owned())),
    }
}

/// Accepts both `version = '1.0.3'` and a bare `1.0.3`.
fn parse_full_version(line: &str) -> Result<Version, VersionError> {
    let value = match line.split_once('=') {
        Some((_, rhs)) => rhs,
        None           => line,
    };
    value.trim().trim_matches('\'').parse()
}

// ── VersionStore ─────────────────────────────────────────────────────────────

/// The pair of version files in one directory.
#[derive(Debug, Clone)]
pub struct VersionStore {
    dir: PathBuf,
}

impl VersionStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn main_version_path(&self) -> PathBuf {
        self.dir.join(MAIN_VERSION_FILE)
    }

    pub fn full_version_path(&self) -> PathBuf {
        self.dir.join(FULL_VERSION_FILE)
    }

    /// Read `major.minor`, creating the main version file with
    /// [`DEFAULT_MAIN_VERSION`] if it does not exist.
    pub fn main_version(&self) -> Result<(u32, u32), VersionError> {
        let path = self.main_version_path();
        let text = match read_value_line(&path) {
            Ok(Some(line)) => line,
            Ok(None)       => return Err(VersionError::Malformed(String::new())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::write(&path, DEFAULT_MAIN_VERSION)?;
                log::info!("created {} ({})", path.display(), DEFAULT_MAIN_VERSION);
                DEFAULT_MAIN_VERSION.to_owned()
            }
            Err(e) => return Err(e.into()),
        };
        parse_main_version(&text)
    }

    /// Produce the next version and record it in the full version file.
    pub fn new_version(&self) -> Result<Version, VersionError> {
        let (major, minor) = self.main_version()?;
        let version = Version::new(major, minor, self.next_build()?)?;

        let path = self.full_version_path();
        let mut out = writable_text_file(&path)?;
        write!(
            out,
            "# last autogenerated application version ({})\n\nversion = '{}'\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            version,
        )?;
        out.flush()?;
        log::info!("version {} written to {}", version, path.display());
        Ok(version)
    }

    /// The recorded version; generated with [`new_version`](Self::new_version)
    /// when nothing has been recorded yet.
    pub fn current_version(&self) -> Result<Version, VersionError> {
        match read_value_line(&self.full_version_path()) {
            Ok(Some(line)) => parse_full_version(&line),
            Ok(None)       => self.new_version(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.new_version(),
            Err(e) => Err(e.into()),
        }
    }

    fn next_build(&self) -> Result<u32, VersionError> {
        let previous = match read_value_line(&self.full_version_path()) {
            Ok(Some(line)) => parse_full_version(&line)?,
            Ok(None)       => return Ok(0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        if previous.build >= MAX_BUILD {
            return Err(VersionError::BuildExhausted);
        }
        Ok(previous.build + 1)
    }
}

/// First non-empty, uncommented line of `path`, stripped.
fn read_value_line(path: &Path) -> io::Result<Option<String>> {
    let reader = BufReader::new(text_file(path)?);
    let lines = reader.lines().collect::<io::Result<Vec<String>>>()?;
    Ok(lines_uncommented(lines_stripped(lines, None), DEFAULT_COMMENTS).find(|l| !l.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fresh_store_starts_at_zero_build() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path());

        assert_eq!(store.current_version().unwrap().to_string(), "1.0.0");
        assert_eq!(fs::read_to_string(store.main_version_path()).unwrap(), "1.0");
        assert_eq!(store.new_version().unwrap().to_string(), "1.0.1");
        assert_eq!(store.current_version().unwrap().to_string(), "1.0.1");
    }

    #[test]
    fn full_version_file_format() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path());
        store.new_version().unwrap();

        let text = fs::read_to_string(store.full_version_path()).unwrap();
        assert!(text.starts_with("# last autogenerated application version"));
        assert!(text.ends_with("\nversion = '1.0.0'\n"));
    }

    #[test]
    fn main_version_edit_keeps_build_sequence() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path());
        store.new_version().unwrap();

        fs::write(store.main_version_path(), "; bumped by hand\n2.3\n").unwrap();
        assert_eq!(store.new_version().unwrap(), Version { major: 2, minor: 3, build: 1 });
    }

    #[test]
    fn main_version_out_of_range() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path());
        fs::write(store.main_version_path(), "300.0").unwrap();

        let err = store.new_version().unwrap_err();
        assert!(matches!(err, VersionError::OutOfRange { part: "major", value: 300, .. }));
    }

    #[test]
    fn build_exhausted() {
        let dir = tempdir().unwrap();
        let store = VersionStore::new(dir.path());
        fs::write(store.full_version_path(), "version = '1.0.65535'\n").unwrap();

        assert!(matches!(store.new_version().unwrap_err(), VersionError::BuildExhausted));
    }

    #[test]
    fn parse_forms() {
        assert_eq!(parse_full_version("version = '4.5.6'").unwrap(), Version { major: 4, minor: 5, build: 6 });
        assert_eq!(parse_full_version("'4.5.6'").unwrap().to_string(), "4.5.6");
        assert!(parse_full_version("version = 'x.y'").is_err());
        assert!("1.2".parse::<Version>().is_err());
    }
}
