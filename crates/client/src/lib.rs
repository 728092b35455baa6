//! HTTP responders and persisted settings for the astral chat widget.

mod http;
mod settings;

pub use http::{Endpoints, HttpResponder, Responders};
pub use settings::{
    AppSettings, DEFAULT_SERVER_URL, SETTINGS_DIRECTORY_NAME, SETTINGS_FILE_NAME, SettingsError,
    SettingsResult, SettingsStore, ThemePreference,
};
