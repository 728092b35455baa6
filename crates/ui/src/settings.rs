use std::sync::Arc;

use astral_client::{AppSettings, SettingsError, SettingsStore, ThemePreference};
use gpui::*;
use gpui_component::{Theme, ThemeMode};

pub struct SettingsState {
    store: SettingsStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChanged {
    pub settings: Arc<AppSettings>,
}

impl EventEmitter<SettingsChanged> for SettingsState {}

impl SettingsState {
    pub fn new(cx: &mut App) -> Entity<Self> {
        cx.new(|_| Self {
            store: SettingsStore::load(),
        })
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.store.settings()
    }

    pub fn update_settings(
        &mut self,
        settings: AppSettings,
        cx: &mut Context<Self>,
    ) -> Result<(), SettingsError> {
        let saved = self.store.update(settings)?;
        cx.emit(SettingsChanged { settings: saved });
        cx.notify();
        Ok(())
    }

    pub fn toggle_theme(&mut self, cx: &mut Context<Self>) -> Result<(), SettingsError> {
        let mut next = AppSettings::clone(&self.settings());
        next.theme_mode = next.theme_mode.toggled();
        self.update_settings(next, cx)
    }
}

pub fn theme_mode(preference: ThemePreference) -> ThemeMode {
    if preference.is_dark() {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    }
}

pub fn apply_theme(settings: &AppSettings, window: Option<&mut Window>, cx: &mut App) {
    Theme::change(theme_mode(settings.theme_mode), window, cx);
}
