//! The context corpus: free-text rows read from one column of a CSV file.
//!
//! Row order is kept exactly as read, since it decides which rows the
//! assembler tries first.

use std::io::Read;
use std::path::{Path, PathBuf};

use contextchat_core::error::Error;
use tracing::info;

/// An ordered, immutable sequence of context rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextCorpus {
    rows: Vec<String>,
}

impl ContextCorpus {
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    /// Load `column` from the CSV file at `path`.
    pub fn from_csv_path(path: &Path, column: &str) -> Result<Self, CorpusError> {
        if !path.is_file() {
            return Err(CorpusError::NotFound(path.to_path_buf()));
        }

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| CorpusError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let corpus = Self::from_csv(reader, column).map_err(|e| match e {
            CorpusError::Read { reason, .. } => CorpusError::Read {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        info!(
            path = %path.display(),
            column,
            rows = corpus.len(),
            "Loaded context corpus"
        );
        Ok(corpus)
    }

    /// Load `column` from any CSV source with a header row.
    pub fn from_reader<R: Read>(reader: R, column: &str) -> Result<Self, CorpusError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Self::from_csv(reader, column)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>, column: &str) -> Result<Self, CorpusError> {
        let read_error = |e: csv::Error| CorpusError::Read {
            path: PathBuf::from("<reader>"),
            reason: e.to_string(),
        };

        let headers = reader.headers().map_err(read_error)?.clone();
        let index = headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| CorpusError::MissingColumn {
                column: column.to_string(),
                available: headers.iter().map(String::from).collect(),
            })?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(read_error)?;
            // Short records count as empty cells.
            rows.push(record.get(index).unwrap_or_default().to_string());
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Errors from loading the corpus.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Data file not found at: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read data file {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Column '{column}' not found (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

impl From<CorpusError> for Error {
    fn from(e: CorpusError) -> Self {
        Error::Corpus {
            message: e.to_string(),
        }
    }
}
