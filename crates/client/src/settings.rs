use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use astral_chat::{DEFAULT_GREETING, StoreConfig};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Deserializer, Serialize};
use snafu::{ResultExt, Snafu};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CHAT_PATH: &str = "/chat_api";
pub const DEFAULT_URL_CHECK_PATH: &str = "/api/check_url";
pub const DEFAULT_MODEL_INFO_PATH: &str = "/admin/model-info";
pub const DEFAULT_RELOAD_MODEL_PATH: &str = "/admin/reload-model";
pub const SETTINGS_DIRECTORY_NAME: &str = "astral";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_ENV_PREFIX: &str = "ASTRAL_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl<'de> Deserialize<'de> for ThemePreference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        if value.trim().eq_ignore_ascii_case("dark") {
            Ok(Self::Dark)
        } else {
            Ok(Self::Light)
        }
    }
}

/// Where the widget talks to and how it greets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    #[serde(default = "default_url_check_path")]
    pub url_check_path: String,
    #[serde(default = "default_model_info_path")]
    pub model_info_path: String,
    #[serde(default = "default_reload_model_path")]
    pub reload_model_path: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub theme_mode: ThemePreference,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            chat_path: default_chat_path(),
            url_check_path: default_url_check_path(),
            model_info_path: default_model_info_path(),
            reload_model_path: default_reload_model_path(),
            greeting: default_greeting(),
            export_dir: None,
            theme_mode: ThemePreference::default(),
        }
    }
}

impl AppSettings {
    pub fn normalized(mut self) -> Self {
        let server_url = self.server_url.trim().trim_end_matches('/');
        self.server_url = if server_url.is_empty() {
            default_server_url()
        } else {
            server_url.to_string()
        };
        self.chat_path = normalize_path(&self.chat_path, DEFAULT_CHAT_PATH);
        self.url_check_path = normalize_path(&self.url_check_path, DEFAULT_URL_CHECK_PATH);
        self.model_info_path = normalize_path(&self.model_info_path, DEFAULT_MODEL_INFO_PATH);
        self.reload_model_path =
            normalize_path(&self.reload_model_path, DEFAULT_RELOAD_MODEL_PATH);
        self.greeting = non_blank(&self.greeting, DEFAULT_GREETING);
        self.export_dir = self
            .export_dir
            .take()
            .filter(|path| !path.as_os_str().is_empty());

        self
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            greeting: self.greeting.clone(),
        }
    }

    /// Configured export directory, else the user's download directory.
    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<AppSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".astral"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: AppSettings) -> SettingsResult<Arc<AppSettings>> {
        let normalized_settings = Arc::new(settings.normalized());
        self.persist(&normalized_settings)?;
        self.settings.store(normalized_settings.clone());
        Ok(normalized_settings)
    }

    fn load_from_disk(path: &Path) -> AppSettings {
        let mut figment = Figment::from(Serialized::defaults(AppSettings::default()));
        if path.exists() {
            figment = figment.merge(Json::file(path));
        } else {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }
        figment = figment.merge(Env::prefixed(SETTINGS_ENV_PREFIX));

        match figment.extract::<AppSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                AppSettings::default()
            }
        }
    }

    fn persist(&self, settings: &AppSettings) -> SettingsResult<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

fn non_blank(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn normalize_path(value: &str, fallback: &str) -> String {
    let path = non_blank(value, fallback);
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_chat_path() -> String {
    DEFAULT_CHAT_PATH.to_string()
}

fn default_url_check_path() -> String {
    DEFAULT_URL_CHECK_PATH.to_string()
}

fn default_model_info_path() -> String {
    DEFAULT_MODEL_INFO_PATH.to_string()
}

fn default_reload_model_path() -> String {
    DEFAULT_RELOAD_MODEL_PATH.to_string()
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}
