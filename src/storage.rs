use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::{Result, eyre::Context};
use log::{info, warn};
use serde_json::Value;

use crate::schedule::ScheduleDocument;

/// Where the schedule document lives between runs.
pub trait ScheduleStore {
    /// Never fails: a missing or unreadable document is an empty one.
    fn load(&self) -> ScheduleDocument;
    fn save(&self, doc: &ScheduleDocument) -> Result<()>;
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScheduleStore for JsonFileStore {
    fn load(&self) -> ScheduleDocument {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                info!("No schedule at {} ({e}), starting empty", self.path.display());
                return ScheduleDocument::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) if value.is_object() => {
                let doc = ScheduleDocument::from_value(&value);
                info!("Loaded {} games from {}", doc.games.len(), self.path.display());
                doc
            }
            Ok(_) => {
                warn!("Schedule at {} is not a JSON object, starting empty", self.path.display());
                ScheduleDocument::default()
            }
            Err(e) => {
                warn!("Schedule at {} is corrupt ({e}), starting empty", self.path.display());
                ScheduleDocument::default()
            }
        }
    }

    /// Writes next to the target and renames over it, so readers see either
    /// the old document or the new one.
    fn save(&self, doc: &ScheduleDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(doc)?)
            .wrap_err_with(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .wrap_err_with(|| format!("failed to replace {}", self.path.display()))?;

        info!("Saved {} games to {}", doc.games.len(), self.path.display());
        Ok(())
    }
}
