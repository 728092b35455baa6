use std::cell::RefCell;

use crate::responder::{ResponderResult, UrlCheckRequest, UrlChecker, UrlVerdict};

pub const MISSING_URL_TEXT: &str = "Enter a URL first";
pub const CHECKING_TEXT: &str = "Checking…";

/// Standalone quick URL check output. Never touches conversation state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuickCheckPanel {
    pub input: String,
    pub output: String,
}

impl QuickCheckPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the URL and marks the panel busy. Returns the request to issue, if any.
    pub fn begin(&mut self, url: &str) -> Option<UrlCheckRequest> {
        self.input = url.to_string();
        let url = url.trim();
        if url.is_empty() {
            self.output = MISSING_URL_TEXT.to_string();
            return None;
        }

        self.output = CHECKING_TEXT.to_string();
        Some(UrlCheckRequest::new(url))
    }

    pub fn resolve(&mut self, outcome: ResponderResult<UrlVerdict>) {
        self.output = match outcome {
            Ok(verdict) => verdict.text().to_string(),
            Err(error) => {
                tracing::warn!(%error, "url check failed");
                format!("Error: {error}")
            }
        };
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
    }
}

/// Runs a check end to end without holding the panel borrowed across the await.
pub async fn run_check(checker: &dyn UrlChecker, panel: &RefCell<QuickCheckPanel>, url: &str) {
    let Some(request) = panel.borrow_mut().begin(url) else {
        return;
    };
    let outcome = checker.check(request).await;
    panel.borrow_mut().resolve(outcome);
}
