/// Predefined questions offered in the FAQ panel.
pub const FAQ_ITEMS: [&str; 5] = [
    "What is phishing?",
    "How to protect from phishing?",
    "How to report phishing?",
    "How does the URL classifier work?",
    "What is 2FA and why enable it?",
];

/// Quick categories offered in the categories panel.
pub const CATEGORIES: [&str; 5] = [
    "Email scams",
    "SMS/OTP scams",
    "Fake websites",
    "Social engineering",
    "Training",
];

/// Where an outgoing chat text came from.
///
/// The origin decides both the user message shown in the transcript and the text sent to the
/// responder; for quick categories the two differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Composer(String),
    Faq(String),
    Category(String),
}

impl Outgoing {
    pub fn composer(text: impl Into<String>) -> Self {
        Self::Composer(text.into())
    }

    pub fn faq(question: impl Into<String>) -> Self {
        Self::Faq(question.into())
    }

    pub fn category(name: impl Into<String>) -> Self {
        Self::Category(name.into())
    }

    pub fn display_text(&self) -> String {
        match self {
            Self::Composer(text) => text.trim().to_string(),
            Self::Faq(question) => question.clone(),
            Self::Category(name) => format!("Show resources for {name}"),
        }
    }

    pub fn request_text(&self) -> String {
        match self {
            Self::Composer(text) => text.trim().to_string(),
            Self::Faq(question) => question.clone(),
            Self::Category(name) => format!("Resources for {name}"),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Composer(text) | Self::Faq(text) | Self::Category(text) => {
                text.trim().is_empty()
            }
        }
    }
}
