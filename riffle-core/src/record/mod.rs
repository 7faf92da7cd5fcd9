//! Record files
//!
//! Framing of record files and resolution of source patterns to files.

pub mod format;
pub mod pattern;

pub use format::{write_record_file, Record, RecordFormat, RecordIter, RecordWriter};
pub use pattern::{split_format_prefix, FilePattern};
