//! File pattern resolution
//!
//! A pattern is `[format:]glob[,glob...]`: an optional framing prefix
//! followed by one or more globs whose matches are unioned into a single
//! source.

use std::collections::BTreeSet;
use std::path::PathBuf;

use super::format::RecordFormat;
use crate::error::{Result, YielderError};

/// Split a recognised `format:` prefix off `raw`
///
/// An unknown prefix is not a format; it stays part of the glob.
pub fn split_format_prefix(raw: &str) -> Option<(RecordFormat, &str)> {
    let (prefix, rest) = raw.trim().split_once(':')?;
    RecordFormat::from_prefix(prefix).map(|format| (format, rest))
}

/// A parsed source pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    raw: String,
    format: RecordFormat,
    globs: Vec<String>,
}

impl FilePattern {
    /// Parse a pattern, validating every glob
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (format, rest) =
            split_format_prefix(trimmed).unwrap_or((RecordFormat::default(), trimmed));

        let globs: Vec<String> = rest
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(String::from)
            .collect();

        if globs.is_empty() {
            return Err(YielderError::InvalidPattern {
                pattern: raw.to_string(),
                reason: "pattern is empty".into(),
            });
        }

        for g in &globs {
            glob::Pattern::new(g).map_err(|e| YielderError::InvalidPattern {
                pattern: raw.to_string(),
                reason: e.to_string(),
            })?;
        }

        Ok(Self {
            raw: raw.to_string(),
            format,
            globs,
        })
    }

    /// The pattern as given by the caller
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    /// Sorted, de-duplicated union of regular files matched by every glob
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        let mut files = BTreeSet::new();

        for g in &self.globs {
            let paths = glob::glob(g).map_err(|e| YielderError::InvalidPattern {
                pattern: self.raw.clone(),
                reason: e.to_string(),
            })?;

            for entry in paths {
                let path = entry.map_err(|e| {
                    let path = e.path().to_path_buf();
                    YielderError::Io {
                        path,
                        source: e.into_error(),
                    }
                })?;
                if path.is_file() {
                    files.insert(path);
                }
            }
        }

        if files.is_empty() {
            return Err(YielderError::NoFilesMatched {
                pattern: self.raw.clone(),
            });
        }

        Ok(files.into_iter().collect())
    }
}
