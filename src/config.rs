use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_THUMBNAIL_MAX_EDGE_PX: u32 = 320;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RecognitionConfig {
    pub endpoint: String,
    pub model: String,
    /// No timeout beyond the HTTP client's own when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
    pub attach_thumbnail: bool,
    pub thumbnail_max_edge_px: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            attach_thumbnail: true,
            thumbnail_max_edge_px: DEFAULT_THUMBNAIL_MAX_EDGE_PX,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScannerConfig {
    pub recognition: RecognitionConfig,
    pub capture: CaptureConfig,
}

/// Scanner configuration kept in a JSON file next to the database.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<ScannerConfig>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed config {}: {err}", path.display());
                ScannerConfig::default()
            })
        } else {
            ScannerConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> ScannerConfig {
        self.read().clone()
    }

    pub fn recognition(&self) -> RecognitionConfig {
        self.read().recognition.clone()
    }

    pub fn capture(&self) -> CaptureConfig {
        self.read().capture
    }

    pub fn update_recognition(&self, recognition: RecognitionConfig) -> Result<()> {
        let mut guard = self.write();
        guard.recognition = recognition;
        self.persist(&guard)
    }

    pub fn update_capture(&self, capture: CaptureConfig) -> Result<()> {
        let mut guard = self.write();
        guard.capture = capture;
        self.persist(&guard)
    }

    fn persist(&self, data: &ScannerConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, ScannerConfig> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ScannerConfig> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
