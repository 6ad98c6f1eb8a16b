//! Rendering of records for the terminal.

use std::fmt::Display;
use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use crate::voice::{ClonedVoice, Sample};

/// Errors that can occur while printing records.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Unknown field: {field}. Available fields: {available}")]
    UnknownField { field: String, available: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How records are printed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human readable.
    #[default]
    Plain,
    /// A JSON document.
    Json,
    /// CSV rows with the selected fields.
    Fields(Vec<String>),
}

impl OutputFormat {
    /// `Json` when `json` is set, `Plain` otherwise.
    pub fn json_or_plain(json: bool) -> Self {
        if json { OutputFormat::Json } else { OutputFormat::Plain }
    }
}

/// A record printable in every [`OutputFormat`].
pub trait Record: Serialize + Display {
    const FIELDS: &'static [&'static str];

    fn field(&self, name: &str) -> Option<String>;
}

impl Record for ClonedVoice {
    const FIELDS: &'static [&'static str] = ClonedVoice::FIELDS;

    fn field(&self, name: &str) -> Option<String> {
        ClonedVoice::field(self, name)
    }
}

impl Record for Sample {
    const FIELDS: &'static [&'static str] = Sample::FIELDS;

    fn field(&self, name: &str) -> Option<String> {
        Sample::field(self, name)
    }
}

fn check_fields<R: Record>(fields: &[String]) -> Result<(), OutputError> {
    match fields.iter().find(|f| !R::FIELDS.contains(&f.as_str())) {
        Some(field) => Err(OutputError::UnknownField {
            field: field.clone(),
            available: R::FIELDS.join(", "),
        }),
        None => Ok(()),
    }
}

/// Print a list of records.
pub fn write_records<R: Record, W: Write>(
    out: &mut W,
    records: &[R],
    format: &OutputFormat,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, records)?;
            writeln!(out)?;
        }
        OutputFormat::Plain => {
            if records.is_empty() {
                writeln!(out, "Nothing found.")?;
            }
            for record in records {
                writeln!(out, "{record}")?;
            }
        }
        OutputFormat::Fields(fields) => {
            check_fields::<R>(fields)?;

            let mut writer = csv::WriterBuilder::new()
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(&mut *out);
            for record in records {
                let row: Vec<String> = fields
                    .iter()
                    .map(|f| record.field(f).unwrap_or_default())
                    .collect();
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}

/// Print a single record.
pub fn write_record<R: Record, W: Write>(
    out: &mut W,
    record: &R,
    format: &OutputFormat,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, record)?;
            writeln!(out)?;
            Ok(())
        }
        OutputFormat::Plain => {
            writeln!(out, "{record}")?;
            Ok(())
        }
        OutputFormat::Fields(_) => write_records(out, std::slice::from_ref(record), format),
    }
}
