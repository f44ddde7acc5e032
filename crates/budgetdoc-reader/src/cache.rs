//! Fingerprint-keyed table cache
//!
//! Re-rendering the same upload (PDF, then workbook, then another selection)
//! should not parse the spreadsheet again. The cache holds at most one table,
//! keyed by the SHA-256 of the input bytes, and is owned by whoever drives
//! the pipeline. Loading different bytes replaces the entry; `invalidate`
//! drops it explicitly.
//!
//! It only pays off for a caller that keeps it across loads, such as an
//! interactive front end. The `budgetdoc` binary parses its input once per
//! run and uses [`Fingerprint`] alone.

use std::fmt;
use std::sync::Arc;

use budgetdoc_core::RawTable;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{read_bytes, InputFormat, ReadError};

/// SHA-256 of an input file's bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// First 12 hex characters, enough for log lines
    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

#[derive(Debug)]
struct Entry {
    fingerprint: Fingerprint,
    format: InputFormat,
    table: Arc<RawTable>,
}

/// Single-entry cache of the last parsed input
#[derive(Debug, Default)]
pub struct TableCache {
    entry: Option<Entry>,
    parses: usize,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed table for these bytes, parsing only if they changed
    pub fn load(&mut self, bytes: &[u8], format: InputFormat) -> Result<Arc<RawTable>, ReadError> {
        let fingerprint = Fingerprint::of(bytes);

        if let Some(entry) = &self.entry {
            if entry.fingerprint == fingerprint && entry.format == format {
                debug!(fingerprint = %fingerprint.short(), "table cache hit");
                return Ok(Arc::clone(&entry.table));
            }
        }

        debug!(fingerprint = %fingerprint.short(), "table cache miss");
        let table = Arc::new(read_bytes(bytes, format)?);
        self.parses += 1;
        self.entry = Some(Entry {
            fingerprint,
            format,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Forget the cached table, e.g. when a new file is uploaded
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Fingerprint of the cached input, if any
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.entry.as_ref().map(|e| e.fingerprint)
    }

    /// How many times input was actually parsed
    pub fn parse_count(&self) -> usize {
        self.parses
    }
}
