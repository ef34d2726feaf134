//! MRTP Settings
//!
//! Persisted application settings. Only the paging section is read by the
//! table models; the rest belongs to the hosting application.

use anyhow::{Context, Result};
use mrtp_core::TableKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Filter text that selects rows whose column is NULL
pub const DEFAULT_NULL_FILTER: &str = "#NULL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MrtpSettings {
    pub paging: PagingSettings,
    pub general: GeneralSettings,
}

impl MrtpSettings {
    /// Load from the default location, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        let settings: Self =
            serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")?;
        Ok(settings.sanitized())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;
        Ok(config_dir.join("mrtp").join("settings.json"))
    }

    /// Replace values a hand-edited file may have zeroed out
    fn sanitized(mut self) -> Self {
        let defaults = PagingSettings::default();
        if self.paging.batch_size == 0 {
            tracing::warn!("batch_size of 0 in settings, using default");
            self.paging.batch_size = defaults.batch_size;
        }
        if self.paging.null_filter.trim().is_empty() {
            self.paging.null_filter = defaults.null_filter;
        }
        self.paging.items_per_page.sanitize();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingSettings {
    /// Rows materialized by a single fetch
    pub batch_size: usize,
    pub items_per_page: ItemsPerPage,
    /// Filter text matched (case-insensitive prefix) as "column IS NULL"
    pub null_filter: String,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            items_per_page: ItemsPerPage::default(),
            null_filter: DEFAULT_NULL_FILTER.to_string(),
        }
    }
}

impl PagingSettings {
    pub fn items_per_page(&self, kind: TableKind) -> usize {
        self.items_per_page.get(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemsPerPage {
    pub stations: usize,
    pub segments: usize,
    pub lines: usize,
    pub rs_owners: usize,
    pub rs_models: usize,
    pub rollingstock: usize,
}

impl Default for ItemsPerPage {
    fn default() -> Self {
        Self {
            stations: 500,
            segments: 100,
            lines: 100,
            rs_owners: 100,
            rs_models: 100,
            rollingstock: 100,
        }
    }
}

impl ItemsPerPage {
    pub fn get(&self, kind: TableKind) -> usize {
        match kind {
            TableKind::Stations => self.stations,
            TableKind::Segments => self.segments,
            TableKind::Lines => self.lines,
            TableKind::RsOwners => self.rs_owners,
            TableKind::RsModels => self.rs_models,
            TableKind::Rollingstock => self.rollingstock,
        }
    }

    pub fn set(&mut self, kind: TableKind, value: usize) {
        let slot = match kind {
            TableKind::Stations => &mut self.stations,
            TableKind::Segments => &mut self.segments,
            TableKind::Lines => &mut self.lines,
            TableKind::RsOwners => &mut self.rs_owners,
            TableKind::RsModels => &mut self.rs_models,
            TableKind::Rollingstock => &mut self.rollingstock,
        };
        *slot = value.max(1);
    }

    fn sanitize(&mut self) {
        let defaults = Self::default();
        for kind in TableKind::all() {
            if self.get(*kind) == 0 {
                self.set(*kind, defaults.get(*kind));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralSettings {
    pub recent_files: Vec<PathBuf>,
}

impl GeneralSettings {
    const MAX_RECENT_FILES: usize = 10;

    /// Move `path` to the front of the recent files list
    pub fn push_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(Self::MAX_RECENT_FILES);
    }
}
