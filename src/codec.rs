//! Record codec
//!
//! Line-oriented text format shared by the WAL and the snapshot file.
//!
//! ## Line Format
//! ```text
//! key:value\n     upsert (value may itself contain ':')
//! key\n           tombstone
//! key:\n          tombstone (accepted on read, never written)
//! ```
//!
//! Keys can never contain `:` or `\n`, and values can never contain `\n` or be
//! empty, so every line decodes to exactly one record.

use std::io::BufRead;

use crate::error::{KvError, Result};

/// Separator between key and value
pub const DELIMITER: char = ':';

// =============================================================================
// Records
// =============================================================================

/// A single logged mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Insert or overwrite a key
    Put { key: String, value: String },

    /// Remove a key
    Delete { key: String },
}

impl Record {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Record::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Record::Delete { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Record::Put { key, .. } | Record::Delete { key } => key,
        }
    }

    /// Encode as one newline-terminated line
    pub fn encode(&self) -> String {
        match self {
            Record::Put { key, value } => {
                let mut line = String::with_capacity(key.len() + value.len() + 2);
                line.push_str(key);
                line.push(DELIMITER);
                line.push_str(value);
                line.push('\n');
                line
            }
            Record::Delete { key } => {
                let mut line = String::with_capacity(key.len() + 1);
                line.push_str(key);
                line.push('\n');
                line
            }
        }
    }

    /// Decode one line (without its trailing newline)
    pub fn decode(line: &str) -> Result<Self> {
        if line.is_empty() {
            return Err(KvError::malformed("empty line"));
        }

        match line.split_once(DELIMITER) {
            Some(("", _)) => Err(KvError::malformed("empty key")),
            Some((key, "")) => Ok(Record::delete(key)),
            Some((key, value)) => Ok(Record::put(key, value)),
            None => Ok(Record::delete(line)),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Check that a key can be stored without breaking the line format
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(KvError::InvalidInput("key must not be empty".to_string()));
    }
    if key.contains(DELIMITER) {
        return Err(KvError::InvalidInput(format!(
            "key must not contain '{}'",
            DELIMITER
        )));
    }
    if key.contains('\n') {
        return Err(KvError::InvalidInput(
            "key must not contain a newline".to_string(),
        ));
    }
    Ok(())
}

/// Check that a value can be stored without breaking the line format
///
/// Empty values are rejected because they would replay as tombstones.
pub fn validate_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(KvError::InvalidInput("value must not be empty".to_string()));
    }
    if value.contains('\n') {
        return Err(KvError::InvalidInput(
            "value must not contain a newline".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// Streaming Reader
// =============================================================================

/// Counters collected while reading a record file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Records successfully decoded
    pub records: u64,

    /// Malformed lines that were skipped
    pub skipped: u64,

    /// The last line had no terminating newline (interrupted append)
    pub torn_tail: bool,

    /// Byte length of the prefix made of complete lines
    pub valid_len: u64,
}

/// Lazily decodes records from a buffered source, one line at a time
///
/// Malformed lines are skipped and counted. An unterminated final line is
/// treated as a torn write and never yielded. The first I/O or UTF-8 error is
/// yielded once and ends the sequence.
pub struct RecordReader<R> {
    reader: R,
    buf: String,
    line_no: u64,
    stats: ReadStats,
    done: bool,
    /// Label used in log lines ("wal", "snapshot")
    source: &'static str,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, source: &'static str) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
            stats: ReadStats::default(),
            done: false,
            source,
        }
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    /// Count a decoded record as skipped (for callers with stricter rules)
    pub(crate) fn reject_last(&mut self, reason: &str) {
        self.stats.records -= 1;
        self.stats.skipped += 1;
        tracing::warn!(
            source = self.source,
            line = self.line_no,
            "skipping record: {}",
            reason
        );
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            let read = match self.reader.read_line(&mut self.buf) {
                Ok(n) => n,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };

            if read == 0 {
                self.done = true;
                break;
            }
            self.line_no += 1;

            let Some(line) = self.buf.strip_suffix('\n') else {
                self.done = true;
                self.stats.torn_tail = true;
                tracing::warn!(
                    source = self.source,
                    line = self.line_no,
                    bytes = read,
                    "ignoring unterminated final line"
                );
                break;
            };
            self.stats.valid_len += read as u64;

            match Record::decode(line) {
                Ok(record) => {
                    self.stats.records += 1;
                    return Some(Ok(record));
                }
                Err(e) => {
                    self.stats.skipped += 1;
                    tracing::warn!(
                        source = self.source,
                        line = self.line_no,
                        "skipping record: {}",
                        e
                    );
                }
            }
        }
        None
    }
}
