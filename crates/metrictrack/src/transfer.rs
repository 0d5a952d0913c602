//! JSON export and import of the whole collection.

use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::storage::KeyValueStore;
use crate::store::RecordStore;
use crate::validate::{validate, Schema};

/// File name suggested for exports.
pub const EXPORT_FILE_NAME: &str = "metrics.json";

/// Serialize the canonical collection as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_all<S>(store: &RecordStore<S>) -> Result<String> {
    let payload = serde_json::to_string_pretty(store.records())?;
    info!(count = store.len(), "Exported metrics");
    Ok(payload)
}

/// Replace the collection with the records of an export payload.
///
/// The payload is parsed and validated as a whole before the store is
/// touched. Returns the number of imported records.
///
/// # Errors
///
/// Returns [`Error::Import`] if the payload is not JSON or fails validation;
/// the store is unchanged in that case. Returns a storage error if the
/// replacement could not be persisted.
pub fn import_all<S: KeyValueStore>(
    store: &mut RecordStore<S>,
    payload: &str,
    schema: Schema,
) -> Result<usize> {
    let candidate: serde_json::Value = serde_json::from_str(payload).map_err(|e| {
        warn!(error = %e, "Import payload is not valid JSON");
        Error::Import(format!("not valid JSON: {e}"))
    })?;

    let records = validate(&candidate, schema).map_err(|e| {
        warn!(reason = %e, "Import payload rejected");
        Error::from(e)
    })?;

    let count = records.len();
    store.replace_all(records)?;
    info!(count, "Imported metrics");
    Ok(count)
}

/// Read an import payload from a user-chosen file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read as UTF-8 text.
pub async fn read_payload(path: impl AsRef<Path>) -> Result<String> {
    Ok(tokio::fs::read_to_string(path).await?)
}
