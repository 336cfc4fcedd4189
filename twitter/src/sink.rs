use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{TwitterError, TwitterResult};
use crate::record::Record;

/// Where the records of one (subject, resource) pair accumulate.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Destination {
    pub subject_id: String,
    pub endpoint: Endpoint,
}

impl Destination {
    pub fn new(subject_id: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            subject_id: subject_id.into(),
            endpoint,
        }
    }

    pub fn file_name(&self) -> TwitterResult<String> {
        let suffix = self.endpoint.file_suffix().ok_or_else(|| {
            TwitterError::Configuration(format!("{} records are not persisted", self.endpoint))
        })?;
        Ok(format!("{}_{}.csv", self.subject_id, suffix))
    }
}

/// Append-only record storage.
pub trait Sink {
    /// Persist `records` after everything previously appended to `destination`, returning how many
    /// were written.
    fn append(&mut self, destination: &Destination, records: &[Record]) -> TwitterResult<usize>;
}

impl Sink for Vec<Record> {
    fn append(&mut self, _destination: &Destination, records: &[Record]) -> TwitterResult<usize> {
        self.extend_from_slice(records);
        Ok(records.len())
    }
}

/// Writes one header-less CSV file per destination, opened in append mode for every page so
/// repeated runs accumulate rows.
#[derive(Clone, Debug)]
pub struct CsvSink {
    directory: PathBuf,
}

impl CsvSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path(&self, destination: &Destination) -> TwitterResult<PathBuf> {
        Ok(self.directory.join(destination.file_name()?))
    }
}

impl Sink for CsvSink {
    fn append(&mut self, destination: &Destination, records: &[Record]) -> TwitterResult<usize> {
        let path = self.path(destination)?;
        if records.is_empty() {
            return Ok(0);
        }

        fs::create_dir_all(&self.directory)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for record in records {
            writer.write_record(record.to_row(destination.endpoint, &destination.subject_id))?;
        }
        writer.flush()?;

        debug!(path = %path.display(), count = records.len(), "appended records");
        Ok(records.len())
    }
}
