// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Writing the record table and JSON artifacts

use crate::error::{Error, Result};
use crate::types::CommitRecord;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Supported table formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TableFormat {
    /// Comma-separated values, extension breakdown as a JSON column
    Csv,
    /// One pretty-printed JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl TableFormat {
    /// Get file extension for format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Jsonl => "jsonl",
        }
    }
}

/// Flat CSV shape of a record
#[derive(Serialize)]
struct CsvRow<'a> {
    hash: &'a str,
    date_utc: String,
    year: i32,
    month: u32,
    day_of_week: u32,
    hour_utc: u32,
    timezone_offset_minutes: i32,
    author_name: &'a str,
    author_email: &'a str,
    author_domain: &'a str,
    committer_name: &'a str,
    committer_email: &'a str,
    is_merge: bool,
    category: &'a str,
    additions: u64,
    deletions: u64,
    commit_total_adds: u64,
    commit_total_dels: u64,
    extensions_json: String,
    canonical_id: i64,
    canonical_name: &'a str,
}

impl<'a> CsvRow<'a> {
    fn from_record(r: &'a CommitRecord) -> Result<Self> {
        Ok(Self {
            hash: &r.hash,
            date_utc: r.date_utc.to_rfc3339(),
            year: r.year,
            month: r.month,
            day_of_week: r.day_of_week,
            hour_utc: r.hour_utc,
            timezone_offset_minutes: r.timezone_offset_minutes,
            author_name: &r.author_name,
            author_email: &r.author_email,
            author_domain: &r.author_domain,
            committer_name: &r.committer_name,
            committer_email: &r.committer_email,
            is_merge: r.is_merge,
            category: &r.category,
            additions: r.additions,
            deletions: r.deletions,
            commit_total_adds: r.commit_total_adds,
            commit_total_dels: r.commit_total_dels,
            extensions_json: serde_json::to_string(&r.extension_breakdown).map_err(io_other)?,
            canonical_id: r.canonical_id,
            canonical_name: &r.canonical_name,
        })
    }
}

/// Write `records` to `writer`
pub fn write_records<W: Write>(records: &[CommitRecord], format: TableFormat, writer: W) -> Result<()> {
    match format {
        TableFormat::Csv => {
            let mut csv = csv::Writer::from_writer(writer);
            for record in records {
                csv.serialize(CsvRow::from_record(record)?).map_err(io_other)?;
            }
            csv.flush()?;
        }
        TableFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, records).map_err(io_other)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        TableFormat::Jsonl => {
            let mut writer = writer;
            for record in records {
                serde_json::to_writer(&mut writer, record).map_err(io_other)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

/// Write `records` to a file, creating parent directories
pub fn write_records_file(records: &[CommitRecord], format: TableFormat, path: &Path) -> Result<()> {
    let file = create(path)?;
    write_records(records, format, BufWriter::new(file)).map_err(|e| at_path(e, path))
}

/// Write any serializable artifact as pretty JSON
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let file = create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(io_other)
        .and_then(|()| {
            writer.write_all(b"\n")?;
            writer.flush()?;
            Ok(())
        })
        .map_err(|e| at_path(e, path))
}

fn create(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::File::create(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn io_other<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
    Error::Stream(std::io::Error::new(std::io::ErrorKind::Other, err))
}

fn at_path(err: Error, path: &Path) -> Error {
    match err {
        Error::Stream(source) => Error::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}
