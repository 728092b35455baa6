use astral_chat::{ConversationId, Outgoing, PanelId};

/// Emitted when the composer submits text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn into_outgoing(self) -> Outgoing {
        Outgoing::composer(self.content)
    }
}

/// Interactions raised by the sidebar, routed by the chat view into headless state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarEvent {
    TitleActivated(PanelId),
    ConversationChosen(ConversationId),
    FaqChosen(&'static str),
    CategoryChosen(&'static str),
    QuickCheckRequested(String),
    QuickCheckCleared,
    ReloadRequested(String),
    ExportRequested,
    PinToggled,
}

impl SidebarEvent {
    /// Chat text carried by catalog picks.
    pub fn outgoing(&self) -> Option<Outgoing> {
        match self {
            Self::FaqChosen(question) => Some(Outgoing::faq(*question)),
            Self::CategoryChosen(name) => Some(Outgoing::category(*name)),
            _ => None,
        }
    }
}
