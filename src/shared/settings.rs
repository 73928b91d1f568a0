use serde::{Deserialize, Serialize};
use tokio::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use directories::ProjectDirs;
use url::Url;
use crate::shared::error::{SettingsError, SettingsResult, TranslationError};
use crate::shared::events::{AppEvent, EventBus};
use crate::shared::types::Language;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:30000";

/// Read-only view of the configuration consumed by the pipeline
pub trait ConfigProvider: Send + Sync {
    fn server_endpoint(&self) -> Result<Url, TranslationError>;
    fn source_language(&self) -> Language;
    fn target_language(&self) -> Language;
    fn capture_timeout(&self) -> Duration;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub source_language: Language,
    pub target_language: Language,
    /// Kept as text so a bad hand edit costs only this field, not the whole file
    pub server_endpoint: String,
    pub auto_launch: bool,
    pub result_window_timeout_secs: f64,
    pub hotkey_enabled: bool,
    pub capture_timeout_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            source_language: Language::EnglishJapanese,
            target_language: Language::Japanese,
            server_endpoint: DEFAULT_ENDPOINT.to_string(),
            auto_launch: false,
            result_window_timeout_secs: 10.0,
            hotkey_enabled: true,
            capture_timeout_ms: 2000,
        }
    }
}

impl AppSettings {
    pub fn endpoint_url(&self) -> Result<Url, TranslationError> {
        Url::parse(self.server_endpoint.trim()).map_err(|e| {
            TranslationError::InvalidConfiguration(format!(
                "Invalid server endpoint '{}': {}",
                self.server_endpoint, e
            ))
        })
    }

    pub fn get_settings_path() -> SettingsResult<PathBuf> {
        ProjectDirs::from("com", "antigravity", "selection-translator")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Load settings from `path`.
    ///
    /// A missing file yields defaults and writes them out. A file that no longer
    /// parses is replaced by defaults as well, so a bad edit can't wedge startup.
    pub async fn load_from(path: &Path) -> SettingsResult<Self> {
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(path).await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path).await?;

        match serde_json::from_str(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!("[Settings] Failed to parse {}: {}. Restoring defaults.", path.display(), e);
                let settings = Self::default();
                settings.save_to(path).await?;
                Ok(settings)
            }
        }
    }

    pub async fn save_to(&self, path: &Path) -> SettingsResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }
}

/// Live settings backed by a JSON file.
///
/// Every update is persisted and then broadcast as `AppEvent::SettingsUpdated`.
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<AppSettings>,
    events: EventBus,
}

impl SettingsStore {
    pub async fn open(path: PathBuf, events: EventBus) -> SettingsResult<Self> {
        let settings = AppSettings::load_from(&path).await?;
        Ok(Self {
            path,
            current: RwLock::new(settings),
            events,
        })
    }

    pub fn current(&self) -> AppSettings {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the whole settings value, persist it and notify subscribers
    pub async fn save(&self, settings: AppSettings) -> SettingsResult<()> {
        settings.save_to(&self.path).await?;

        match self.current.write() {
            Ok(mut guard) => *guard = settings.clone(),
            Err(poisoned) => *poisoned.into_inner() = settings.clone(),
        }

        tracing::info!("[Settings] Saved to {}", self.path.display());
        self.events.emit(AppEvent::SettingsUpdated(settings));
        Ok(())
    }

    async fn modify(&self, apply: impl FnOnce(&mut AppSettings)) -> SettingsResult<()> {
        let mut settings = self.current();
        apply(&mut settings);
        self.save(settings).await
    }

    pub async fn update_source_language(&self, language: Language) -> SettingsResult<()> {
        self.modify(|s| s.source_language = language).await
    }

    pub async fn update_target_language(&self, language: Language) -> SettingsResult<()> {
        self.modify(|s| s.target_language = language).await
    }

    pub async fn update_server_endpoint(&self, endpoint: Url) -> SettingsResult<()> {
        self.modify(|s| s.server_endpoint = endpoint.to_string()).await
    }

    pub async fn update_hotkey_enabled(&self, enabled: bool) -> SettingsResult<()> {
        self.modify(|s| s.hotkey_enabled = enabled).await
    }

    pub async fn update_auto_launch(&self, enabled: bool) -> SettingsResult<()> {
        self.modify(|s| s.auto_launch = enabled).await
    }

    pub async fn update_result_window_timeout(&self, secs: f64) -> SettingsResult<()> {
        self.modify(|s| s.result_window_timeout_secs = secs).await
    }

    pub async fn reset_to_defaults(&self) -> SettingsResult<()> {
        self.save(AppSettings::default()).await
    }
}

impl ConfigProvider for SettingsStore {
    fn server_endpoint(&self) -> Result<Url, TranslationError> {
        self.current().endpoint_url()
    }

    fn source_language(&self) -> Language {
        self.current().source_language
    }

    fn target_language(&self) -> Language {
        self.current().target_language
    }

    fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.current().capture_timeout_ms)
    }
}
