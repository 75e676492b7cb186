//! Snapshot persistence for [`MemoryDatabase`].
//!
//! `.json` files are read and written with serde_json; anything else is
//! treated as a bincode snapshot.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use super::database::{MemoryDatabase, Snapshot};
use crate::error::{GraphError, Result};

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn snapshot_error(path: &Path, message: impl ToString) -> GraphError {
    GraphError::Snapshot {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

impl MemoryDatabase {
    /// Open a database from a snapshot file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| GraphError::io(path.display().to_string(), e))?;
        let reader = BufReader::new(file);
        let snapshot: Snapshot = if is_json(path) {
            serde_json::from_reader(reader).map_err(|e| snapshot_error(path, e))?
        } else {
            bincode::deserialize_from(reader).map_err(|e| snapshot_error(path, e))?
        };
        debug!(path = %path.display(), "snapshot decoded");
        MemoryDatabase::from_snapshot(snapshot)
    }

    /// Write the database content to a snapshot file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let target = path.display().to_string();
        let file = File::create(path).map_err(|e| GraphError::io(target.clone(), e))?;
        let mut writer = BufWriter::new(file);
        if is_json(path) {
            serde_json::to_writer_pretty(&mut writer, self.snapshot())
                .map_err(|e| snapshot_error(path, e))?;
        } else {
            bincode::serialize_into(&mut writer, self.snapshot())
                .map_err(|e| snapshot_error(path, e))?;
        }
        writer.flush().map_err(|e| GraphError::io(target, e))?;
        info!(path = %path.display(), "snapshot saved");
        Ok(())
    }
}
