pub mod files;
pub mod encoding;
pub mod reverse;
pub mod text;
pub mod hexstr;
pub mod version;

pub use files::{binary_file, text_file, OpenMode, Resource};
pub use encoding::TextEncoding;
pub use reverse::{reverse_blocks, reverse_lines, ReadError, ReverseOptions};
pub use version::{Version, VersionStore};
