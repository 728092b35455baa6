use serde_json::Value;

use crate::panels::{PanelController, PanelId};
use crate::responder::{ModelInfo, ResponderResult, pretty_json};

pub const RELOADING_TEXT: &str = "Reloading...";

/// Output areas of the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdminPanel {
    pub model_info: String,
    pub reload_output: String,
}

impl AdminPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a model-info fetch result. A loaded model auto-opens the model-info panel.
    pub fn apply_model_info(
        &mut self,
        panels: &mut PanelController,
        outcome: ResponderResult<ModelInfo>,
    ) {
        match outcome {
            Ok(info) => {
                self.model_info = info.pretty();
                if info.model_loaded() {
                    panels.open(PanelId::ModelInfo);
                }
            }
            Err(error) => {
                tracing::warn!(%error, "failed to load model info");
                self.model_info = format!("Error loading model info: {error}");
            }
        }
    }

    /// Starts a reload. A blank token cancels without output. Returns the trimmed token.
    pub fn begin_reload(&mut self, token: &str) -> Option<String> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        self.reload_output = RELOADING_TEXT.to_string();
        Some(token.to_string())
    }

    /// Shows the reload reply. Returns whether model info should be refreshed.
    pub fn resolve_reload(&mut self, outcome: ResponderResult<Value>) -> bool {
        match outcome {
            Ok(payload) => {
                self.reload_output = pretty_json(&payload);
                true
            }
            Err(error) => {
                tracing::warn!(%error, "model reload failed");
                self.reload_output = format!("Reload error: {error}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::responder::ResponderError;

    #[test]
    fn loaded_model_auto_opens_panel() {
        let mut admin = AdminPanel::new();
        let mut panels = PanelController::new();
        panels.activate_title(PanelId::Faq);

        admin.apply_model_info(
            &mut panels,
            Ok(ModelInfo::new(json!({"model_loaded": true, "name": "phishing"}))),
        );

        assert_eq!(panels.open_panel(), Some(PanelId::ModelInfo));
        assert!(admin.model_info.contains("\"model_loaded\": true"));
    }

    #[test]
    fn unloaded_model_leaves_panels_alone() {
        let mut admin = AdminPanel::new();
        let mut panels = PanelController::new();
        panels.activate_title(PanelId::Faq);

        admin.apply_model_info(&mut panels, Ok(ModelInfo::new(json!({"model_loaded": false}))));
        assert_eq!(panels.open_panel(), Some(PanelId::Faq));

        admin.apply_model_info(
            &mut panels,
            Err(ResponderError::Interrupted { stage: "model-info" }),
        );
        assert!(admin.model_info.starts_with("Error loading model info: "));
        assert_eq!(panels.open_panel(), Some(PanelId::Faq));
    }

    #[test]
    fn reload_requires_token() {
        let mut admin = AdminPanel::new();
        assert_eq!(admin.begin_reload("  "), None);
        assert!(admin.reload_output.is_empty());

        assert_eq!(admin.begin_reload(" secret "), Some("secret".to_string()));
        assert_eq!(admin.reload_output, RELOADING_TEXT);

        assert!(admin.resolve_reload(Ok(json!({"reloaded": true}))));
        assert_eq!(admin.reload_output, "{\n  \"reloaded\": true\n}");

        assert!(!admin.resolve_reload(Err(ResponderError::Interrupted { stage: "reload" })));
        assert!(admin.reload_output.starts_with("Reload error: "));
    }
}
