use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Default for OverlayPosition {
    fn default() -> Self {
        OverlayPosition::BottomRight
    }
}

/// In-page overlay preferences. Stored and returned verbatim; surfaces
/// interpret them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    pub overlay_enabled: bool,
    pub position: OverlayPosition,
    pub opacity: f64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            overlay_enabled: true,
            position: OverlayPosition::default(),
            opacity: 0.9,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    overlay: OverlaySettings,
}

const SETTINGS_CHANNEL_CAPACITY: usize = 16;

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
    changes: broadcast::Sender<OverlaySettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Settings at {} are unreadable, using defaults: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        let (changes, _) = broadcast::channel(SETTINGS_CHANNEL_CAPACITY);

        Ok(Self {
            path,
            data: RwLock::new(data),
            changes,
        })
    }

    pub fn overlay(&self) -> OverlaySettings {
        match self.data.read() {
            Ok(guard) => guard.overlay.clone(),
            Err(poisoned) => poisoned.into_inner().overlay.clone(),
        }
    }

    /// Overlay settings after every successful `update_overlay`.
    pub fn subscribe(&self) -> broadcast::Receiver<OverlaySettings> {
        self.changes.subscribe()
    }

    pub fn update_overlay(&self, settings: OverlaySettings) -> Result<OverlaySettings> {
        {
            let mut guard = match self.data.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.overlay = settings.clone();
            self.persist(&guard)?;
        }

        // No subscribers is fine.
        let _ = self.changes.send(settings.clone());
        Ok(settings)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
