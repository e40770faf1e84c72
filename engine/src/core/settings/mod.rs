//! Overlay Settings Persistence
//!
//! Provides persistent overlay settings with:
//! - Atomic file writes (temp file + rename)
//! - Tolerant loading with defaults and clamping
//! - Migration support for schema changes
//!
//! Storage location: {config_dir}/overlay.json

use std::collections::BTreeMap;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::layout::DEFAULT_ROW_TOLERANCE;
use crate::core::{OverlayError, OverlayResult, TrackKind, TrackVisibility};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "overlay.json";

/// Overlay settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Track visibility and text presentation
    #[serde(default)]
    pub display: DisplaySettings,

    /// Row detection
    #[serde(default)]
    pub layout: LayoutSettings,

    /// Dictionary lookups
    #[serde(default)]
    pub lookup: LookupSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            display: DisplaySettings::default(),
            layout: LayoutSettings::default(),
            lookup: LookupSettings::default(),
        }
    }
}

impl OverlaySettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected instead of rejected, so an edited or old
    /// config never disables the overlay.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.display.scale = clamp_f64(self.display.scale, 0.5, 3.0);
        self.display.background_opacity = clamp_f64(self.display.background_opacity, 0.0, 1.0);

        self.layout.row_tolerance = clamp_f64(self.layout.row_tolerance, 0.1, 16.0);

        self.lookup
            .language_hints
            .retain(|_, language| !language.trim().is_empty());
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

/// Visibility and presentation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    /// Which tracks are rendered
    #[serde(default)]
    pub visibility: TrackVisibility,

    /// Text scale factor
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Background opacity (0.0 - 1.0)
    #[serde(default = "default_background_opacity")]
    pub background_opacity: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            visibility: TrackVisibility::default(),
            scale: default_scale(),
            background_opacity: default_background_opacity(),
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

fn default_background_opacity() -> f64 {
    0.6
}

/// Row detection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    /// Tops closer than this share a visual row
    #[serde(default = "default_row_tolerance")]
    pub row_tolerance: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            row_tolerance: default_row_tolerance(),
        }
    }
}

fn default_row_tolerance() -> f64 {
    DEFAULT_ROW_TOLERANCE
}

/// Lookup settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LookupSettings {
    /// Fallback language code per track when the cue source has none
    #[serde(default)]
    pub language_hints: BTreeMap<TrackKind, String>,
}

// =============================================================================
// Settings Store
// =============================================================================

/// Loads and saves settings in a directory
pub struct SettingsStore {
    settings_path: PathBuf,
}

impl SettingsStore {
    /// Creates a store for the given config directory
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            settings_path: config_dir.as_ref().join(SETTINGS_FILE),
        }
    }

    /// Creates a store for an explicit settings file
    pub fn at_path(settings_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
        }
    }

    /// Lock file next to the settings file, named after it
    fn lock_path(&self) -> PathBuf {
        let mut lock_name = self
            .settings_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| SETTINGS_FILE.into());
        lock_name.push(".lock");
        self.settings_path.with_file_name(lock_name)
    }

    fn with_lock<T>(
        &self,
        exclusive: bool,
        op: impl FnOnce() -> OverlayResult<T>,
    ) -> OverlayResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if missing or unreadable
    pub fn load(&self) -> OverlaySettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(OverlaySettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings = serde_json::from_str::<OverlaySettings>(&content)?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                OverlaySettings::default()
            }
        }
    }

    /// Save settings using atomic write (temp file + rename)
    pub fn save(&self, settings: &OverlaySettings) -> OverlayResult<OverlaySettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            let content = serde_json::to_string_pretty(&normalized)?;

            let temp_path = self.settings_path.with_extension("json.tmp");
            if temp_path.exists() {
                let _ = fs::remove_file(&temp_path);
            }

            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;

            fs::rename(&temp_path, &self.settings_path).map_err(|e| {
                OverlayError::SettingsInvalid(format!("Failed to finalize settings file: {}", e))
            })?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> OverlayResult<OverlaySettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(OverlaySettings::default())
        })
    }
}

/// Migrate settings from an older version
fn migrate(mut settings: OverlaySettings) -> OverlaySettings {
    settings.version = SETTINGS_VERSION;
    settings
}

// =============================================================================
// Tests
// =============================================================================
