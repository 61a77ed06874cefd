//! Typed CSV files for the stock scores and candidate lists.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::error::ScreenerError;

/// Writes `records` with a header row, replacing any existing file and
/// creating parent directories.
pub fn write_records<T: Serialize, P: AsRef<Path>>(path: P, records: &[T]) -> Result<(), ScreenerError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    tracing::debug!(path = %path.display(), rows = records.len(), "csv written");
    Ok(())
}

pub fn read_records<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>, ScreenerError> {
    let mut rdr = csv::Reader::from_path(path.as_ref())?;
    let records = rdr.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(records)
}
