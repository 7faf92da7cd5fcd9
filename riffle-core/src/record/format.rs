//! On-disk record framing
//!
//! Records are opaque byte payloads. Two framings are understood:
//! checksummed length-delimited frames (`tfrecord:`) and newline-separated
//! lines (`text:`).

use bytes::Bytes;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, YielderError};

/// Length field (8) plus its checksum (4)
const HEADER_LEN: usize = 12;
/// Payload checksum
const FOOTER_LEN: usize = 4;
const MASK_DELTA: u32 = 0xa282_ead8;

/// A record handed to consumers
#[derive(Debug, Clone)]
pub struct Record {
    /// Payload (zero-copy slice of the file buffer)
    pub data: Bytes,
    /// Index of the source this record was read from
    pub source_id: usize,
    /// 1-based pass over the source's files during which it was read
    pub epoch: u64,
}

impl Record {
    /// Create a new record
    pub fn new(data: Bytes, source_id: usize, epoch: u64) -> Self {
        Self {
            data,
            source_id,
            epoch,
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Framing used by the files behind a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// Length-delimited frames with masked CRC32C checksums
    #[default]
    TfRecord,
    /// One record per line
    Text,
}

impl RecordFormat {
    /// Look up a format by its pattern prefix (without the trailing colon)
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "tfrecord" => Some(RecordFormat::TfRecord),
            "text" => Some(RecordFormat::Text),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            RecordFormat::TfRecord => "tfrecord",
            RecordFormat::Text => "text",
        }
    }

    /// Iterate the records contained in one file's bytes
    pub fn records(self, data: Bytes, origin: impl Into<String>) -> RecordIter {
        RecordIter {
            format: self,
            data,
            offset: 0,
            origin: origin.into(),
            failed: false,
        }
    }
}

/// Masked CRC32C as stored in frame headers and footers
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

fn read_u32_le(buf: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[..4]);
    u32::from_le_bytes(raw)
}

fn read_u64_le(buf: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[..8]);
    u64::from_le_bytes(raw)
}

/// Iterator over the records of a single file
///
/// Stops after the first framing error.
pub struct RecordIter {
    format: RecordFormat,
    data: Bytes,
    offset: usize,
    origin: String,
    failed: bool,
}

impl RecordIter {
    fn corrupt(&mut self, reason: impl Into<String>) -> Option<Result<Bytes>> {
        self.failed = true;
        Some(Err(YielderError::CorruptRecord {
            path: self.origin.clone(),
            offset: self.offset as u64,
            reason: reason.into(),
        }))
    }

    fn next_frame(&mut self) -> Option<Result<Bytes>> {
        let remaining = &self.data[self.offset..];
        if remaining.len() < HEADER_LEN {
            return self.corrupt("truncated header");
        }

        let length = read_u64_le(remaining);
        if masked_crc32c(&remaining[..8]) != read_u32_le(&remaining[8..]) {
            return self.corrupt("length checksum mismatch");
        }

        let total = usize::try_from(length)
            .ok()
            .and_then(|len| len.checked_add(HEADER_LEN + FOOTER_LEN));
        let (length, total) = match total {
            Some(total) if total <= remaining.len() => (length as usize, total),
            _ => return self.corrupt(format!("truncated record of {} bytes", length)),
        };

        let start = self.offset + HEADER_LEN;
        let payload = self.data.slice(start..start + length);
        let expected = read_u32_le(&remaining[HEADER_LEN + length..]);
        if masked_crc32c(&payload) != expected {
            return self.corrupt("data checksum mismatch");
        }

        self.offset += total;
        Some(Ok(payload))
    }

    fn next_line(&mut self) -> Option<Result<Bytes>> {
        let remaining = &self.data[self.offset..];
        let line = match remaining.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let line = self.data.slice(self.offset..self.offset + pos);
                self.offset += pos + 1;
                line
            }
            None => {
                let line = self.data.slice(self.offset..);
                self.offset = self.data.len();
                line
            }
        };
        Some(Ok(line))
    }
}

impl Iterator for RecordIter {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        match self.format {
            RecordFormat::TfRecord => self.next_frame(),
            RecordFormat::Text => self.next_line(),
        }
    }
}

/// Writes checksummed length-delimited frames
pub struct RecordWriter<W: Write> {
    inner: W,
    records_written: u64,
}

impl<W: Write> RecordWriter<W> {
    /// Create a new writer
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records_written: 0,
        }
    }

    /// Append one record
    pub fn write_record(&mut self, data: &[u8]) -> std::io::Result<()> {
        let length = (data.len() as u64).to_le_bytes();
        self.inner.write_all(&length)?;
        self.inner.write_all(&masked_crc32c(&length).to_le_bytes())?;
        self.inner.write_all(data)?;
        self.inner.write_all(&masked_crc32c(data).to_le_bytes())?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> std::io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Write `records` as a framed record file at `path`
pub fn write_record_file<I, R>(path: &Path, records: I) -> Result<u64>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[u8]>,
{
    let io_err = |source| YielderError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut writer = RecordWriter::new(std::io::BufWriter::new(file));
    for record in records {
        writer.write_record(record.as_ref()).map_err(io_err)?;
    }
    let written = writer.records_written();
    writer.into_inner().map_err(io_err)?;
    Ok(written)
}
