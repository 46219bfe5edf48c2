//! Persisted display preferences.
//!
//! The on-disk equivalent of the dashboard's local storage: column order,
//! hidden protocols per view, collapsed categories, the last selected date
//! and the chosen dataset. Stored as pretty JSON; unknown or missing fields
//! fall back to defaults.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::columns::MetricKey;
use crate::config::{self, DataType};
use crate::error::{AnalyticsError, Result};
use crate::models::ProtocolId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub column_order: Vec<MetricKey>,
    /// Hidden protocols keyed by view name (e.g. `"daily"`, `"weekly"`).
    pub hidden_protocols: BTreeMap<String, BTreeSet<ProtocolId>>,
    pub collapsed_categories: BTreeSet<String>,
    pub last_selected_date: Option<NaiveDate>,
    pub data_type: DataType,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            column_order: MetricKey::all(),
            hidden_protocols: BTreeMap::new(),
            collapsed_categories: BTreeSet::new(),
            last_selected_date: None,
            data_type: DataType::default(),
        }
    }
}

impl Preferences {
    /// Column order with duplicates dropped and any missing columns appended.
    pub fn normalized_column_order(&self) -> Vec<MetricKey> {
        let mut order: Vec<MetricKey> = Vec::new();
        for key in self.column_order.iter().chain(MetricKey::all().iter()) {
            if !order.contains(key) {
                order.push(*key);
            }
        }
        order
    }

    pub fn is_hidden(&self, view: &str, protocol: &ProtocolId) -> bool {
        self.hidden_protocols
            .get(view)
            .is_some_and(|set| set.contains(protocol))
    }

    /// Toggle a protocol's visibility in `view`; returns the new hidden state.
    pub fn toggle_hidden(&mut self, view: &str, protocol: ProtocolId) -> bool {
        let set = self.hidden_protocols.entry(view.to_string()).or_default();
        if set.remove(&protocol) {
            if set.is_empty() {
                self.hidden_protocols.remove(view);
            }
            false
        } else {
            set.insert(protocol);
            true
        }
    }

    /// Toggle a category's collapsed state; returns the new state.
    pub fn toggle_category(&mut self, category: &str) -> bool {
        if self.collapsed_categories.remove(category) {
            false
        } else {
            self.collapsed_categories.insert(category.to_string());
            true
        }
    }

    /// Move `key` to `index` in the column order.
    pub fn move_column(&mut self, key: MetricKey, index: usize) -> Result<()> {
        let mut order = self.normalized_column_order();
        let from = order
            .iter()
            .position(|k| *k == key)
            .ok_or_else(|| AnalyticsError::InvalidArgument(format!("unknown column {:?}", key)))?;
        if index >= order.len() {
            return Err(AnalyticsError::InvalidArgument(format!(
                "column index {} out of range (0..{})",
                index,
                order.len()
            )));
        }
        let moved = order.remove(from);
        order.insert(index, moved);
        self.column_order = order;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PreferenceStore
// ---------------------------------------------------------------------------

/// Reads and writes [`Preferences`] at a fixed path.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store at `path`, or the platform config directory when `None`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(config::default_preferences_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences, or defaults when nothing has been saved.
    ///
    /// An unreadable file is logged, removed and replaced by defaults.
    pub fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&contents) {
            Ok(prefs) => Ok(prefs),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt preferences file, resetting");
                let _ = fs::remove_file(&self.path);
                Ok(Preferences::default())
            }
        }
    }

    /// Atomically replace the stored preferences.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        serde_json::to_writer_pretty(&mut tmp, prefs)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Load, apply `f`, save, and return the updated preferences.
    pub fn update<F>(&self, f: F) -> Result<Preferences>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut prefs = self.load()?;
        f(&mut prefs);
        self.save(&prefs)?;
        Ok(prefs)
    }

    /// Delete the stored preferences.
    pub fn reset(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
