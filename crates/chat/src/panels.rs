use std::fmt;
use std::str::FromStr;

use snafu::Snafu;

/// Sidebar section identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelId {
    /// Never opens; activating it starts a new conversation.
    NewChat,
    Faq,
    Categories,
    QuickCheck,
    ModelInfo,
    Export,
}

impl PanelId {
    pub const ALL: [PanelId; 6] = [
        PanelId::NewChat,
        PanelId::Faq,
        PanelId::Categories,
        PanelId::QuickCheck,
        PanelId::ModelInfo,
        PanelId::Export,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NewChat => "newchat",
            Self::Faq => "faq",
            Self::Categories => "categories",
            Self::QuickCheck => "quickcheck",
            Self::ModelInfo => "modelinfo",
            Self::Export => "export",
        }
    }

    pub const fn title(&self) -> &'static str {
        match self {
            Self::NewChat => "New chat",
            Self::Faq => "FAQ",
            Self::Categories => "Categories",
            Self::QuickCheck => "Quick URL check",
            Self::ModelInfo => "Model info",
            Self::Export => "Export",
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PanelError {
    #[snafu(display("unknown panel identifier '{raw}'"))]
    UnknownPanel { stage: &'static str, raw: String },
}

impl FromStr for PanelId {
    type Err = PanelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        PanelId::ALL
            .into_iter()
            .find(|panel| panel.as_str() == normalized)
            .ok_or_else(|| PanelError::UnknownPanel {
                stage: "parse-panel-id",
                raw: raw.to_string(),
            })
    }
}

/// What the host should do after a panel interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Opened(PanelId),
    Closed(PanelId),
    /// The "new conversation" entry was activated.
    StartConversation,
}

/// Keeps at most one sidebar panel open and ties panel visibility to the sidebar collapse state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelController {
    open: Option<PanelId>,
    collapsed: bool,
    pinned: bool,
}

impl PanelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_panel(&self) -> Option<PanelId> {
        self.open
    }

    pub fn is_open(&self, panel: PanelId) -> bool {
        self.open == Some(panel)
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Handles a click on a panel title: toggles that panel, closing every other one.
    ///
    /// A collapsed sidebar is expanded and pinned first so the content becomes visible.
    pub fn activate_title(&mut self, panel: PanelId) -> PanelAction {
        if panel == PanelId::NewChat {
            return PanelAction::StartConversation;
        }

        if self.collapsed {
            self.collapsed = false;
            self.pinned = true;
        }

        let will_open = !self.is_open(panel);
        self.close_all();
        if will_open {
            self.open = Some(panel);
            tracing::debug!(%panel, "panel opened");
            PanelAction::Opened(panel)
        } else {
            tracing::debug!(%panel, "panel closed");
            PanelAction::Closed(panel)
        }
    }

    /// Opens a panel from outside a title click. The collapse state is left as it is.
    pub fn open(&mut self, panel: PanelId) -> PanelAction {
        if panel == PanelId::NewChat {
            return PanelAction::StartConversation;
        }

        self.close_all();
        self.open = Some(panel);
        tracing::debug!(%panel, "panel opened");
        PanelAction::Opened(panel)
    }

    pub fn close_all(&mut self) {
        self.open = None;
    }

    /// Flips the pin. Pinning expands the sidebar, unpinning collapses it. Returns the new pin state.
    pub fn toggle_pin(&mut self) -> bool {
        self.pinned = !self.pinned;
        if self.pinned {
            self.expand();
        } else {
            self.collapse();
        }
        self.pinned
    }

    /// Collapses the sidebar, force-closing every panel.
    pub fn collapse(&mut self) {
        self.collapsed = true;
        self.close_all();
    }

    pub fn expand(&mut self) {
        self.collapsed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_ids_round_trip_through_strings() {
        for panel in PanelId::ALL {
            assert_eq!(panel.as_str().parse::<PanelId>().unwrap(), panel);
        }
        assert_eq!(" FAQ ".parse::<PanelId>().unwrap(), PanelId::Faq);
        assert!("sidebar".parse::<PanelId>().is_err());
    }

    #[test]
    fn activating_open_panel_closes_it() {
        let mut panels = PanelController::new();
        assert_eq!(panels.activate_title(PanelId::Faq), PanelAction::Opened(PanelId::Faq));
        assert_eq!(panels.activate_title(PanelId::Faq), PanelAction::Closed(PanelId::Faq));
        assert_eq!(panels.open_panel(), None);
    }

    #[test]
    fn new_chat_entry_never_opens() {
        let mut panels = PanelController::new();
        panels.activate_title(PanelId::QuickCheck);

        assert_eq!(panels.activate_title(PanelId::NewChat), PanelAction::StartConversation);
        assert_eq!(panels.open(PanelId::NewChat), PanelAction::StartConversation);
        assert_eq!(panels.open_panel(), Some(PanelId::QuickCheck));
    }

    #[test]
    fn title_click_while_collapsed_expands_and_pins() {
        let mut panels = PanelController::new();
        panels.collapse();
        assert!(panels.is_collapsed());

        panels.activate_title(PanelId::Categories);
        assert!(!panels.is_collapsed());
        assert!(panels.is_pinned());
        assert!(panels.is_open(PanelId::Categories));
    }

    #[test]
    fn pin_toggle_expands_without_opening() {
        let mut panels = PanelController::new();
        panels.activate_title(PanelId::Export);

        // Initial state is expanded and unpinned, so the first toggle pins.
        assert!(panels.toggle_pin());
        assert!(panels.is_open(PanelId::Export));

        assert!(!panels.toggle_pin());
        assert!(panels.is_collapsed());
        assert_eq!(panels.open_panel(), None);

        assert!(panels.toggle_pin());
        assert!(!panels.is_collapsed());
        assert_eq!(panels.open_panel(), None);
    }

    #[test]
    fn external_open_keeps_collapse_state() {
        let mut panels = PanelController::new();
        panels.collapse();
        panels.open(PanelId::ModelInfo);

        assert!(panels.is_collapsed());
        assert!(panels.is_open(PanelId::ModelInfo));
    }
}
