use astral_chat::{
    AdminPanel, CATEGORIES, ConversationId, ConversationStore, FAQ_ITEMS, PanelController, PanelId,
    QuickCheckPanel,
};
use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::{
    ActiveTheme, Icon, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputState},
    label::Label,
    list::ListItem,
    v_flex,
};

use crate::chat::events::SidebarEvent;

const SECTION_TITLE_HEIGHT: f32 = 34.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub id: ConversationId,
    pub title: String,
    pub active: bool,
}

/// Everything the sidebar shows, copied out of the chat view's state after each change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SidebarSnapshot {
    pub conversations: Vec<ConversationEntry>,
    pub open_panel: Option<PanelId>,
    pub collapsed: bool,
    pub pinned: bool,
    pub quick_check_output: String,
    pub model_info: String,
    pub reload_output: String,
    pub export_status: Option<String>,
}

impl SidebarSnapshot {
    pub fn capture(
        store: &ConversationStore,
        panels: &PanelController,
        quick_check: &QuickCheckPanel,
        admin: &AdminPanel,
        export_status: Option<String>,
    ) -> Self {
        let active = store.active_conversation().map(|conversation| conversation.id);
        Self {
            conversations: store
                .conversations()
                .iter()
                .map(|conversation| ConversationEntry {
                    id: conversation.id,
                    title: conversation.title.clone(),
                    active: active == Some(conversation.id),
                })
                .collect(),
            open_panel: panels.open_panel(),
            collapsed: panels.is_collapsed(),
            pinned: panels.is_pinned(),
            quick_check_output: quick_check.output.clone(),
            model_info: admin.model_info.clone(),
            reload_output: admin.reload_output.clone(),
            export_status,
        }
    }
}

pub struct ChatSidebar {
    snapshot: SidebarSnapshot,
    url_input: Entity<InputState>,
    token_input: Entity<InputState>,
}

impl EventEmitter<SidebarEvent> for ChatSidebar {}

impl ChatSidebar {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let url_input = cx.new(|cx| InputState::new(window, cx).placeholder("https://example.com"));
        let token_input = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("Admin token")
                .masked(true)
        });

        Self {
            snapshot: SidebarSnapshot::default(),
            url_input,
            token_input,
        }
    }

    pub fn snapshot(&self) -> &SidebarSnapshot {
        &self.snapshot
    }

    pub fn sync(&mut self, snapshot: SidebarSnapshot, cx: &mut Context<Self>) {
        if self.snapshot != snapshot {
            self.snapshot = snapshot;
            cx.notify();
        }
    }

    fn request_quick_check(&mut self, cx: &mut Context<Self>) {
        let url = self.url_input.read(cx).value().to_string();
        cx.emit(SidebarEvent::QuickCheckRequested(url));
    }

    fn clear_quick_check(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.url_input.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        cx.emit(SidebarEvent::QuickCheckCleared);
    }

    fn request_reload(&mut self, cx: &mut Context<Self>) {
        let token = self.token_input.read(cx).value().to_string();
        cx.emit(SidebarEvent::ReloadRequested(token));
    }

    fn render_header(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let pin_icon = if self.snapshot.pinned {
            IconName::PanelLeftClose
        } else {
            IconName::PanelLeftOpen
        };

        h_flex()
            .w_full()
            .items_center()
            .justify_between()
            .px_3()
            .py_2()
            .border_b_1()
            .border_color(theme.border)
            .child(
                Label::new("Astral")
                    .text_sm()
                    .font_weight(FontWeight::SEMIBOLD),
            )
            .child(
                Button::new("sidebar-pin")
                    .ghost()
                    .small()
                    .icon(pin_icon)
                    .on_click(cx.listener(|_, _, _, cx| {
                        cx.emit(SidebarEvent::PinToggled);
                    })),
            )
    }

    fn render_section(&self, panel: PanelId, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let is_open = self.snapshot.open_panel == Some(panel);
        let chevron = if is_open {
            IconName::ChevronDown
        } else {
            IconName::ChevronRight
        };

        let title = ListItem::new(("panel-title", panel_index(panel)))
            .w_full()
            .h(px(SECTION_TITLE_HEIGHT))
            .px_3()
            .rounded_md()
            .selected(is_open)
            .on_click(cx.listener(move |_, _event: &ClickEvent, _window, cx| {
                cx.emit(SidebarEvent::TitleActivated(panel));
            }))
            .child(
                h_flex()
                    .w_full()
                    .gap_2()
                    .items_center()
                    .child(Icon::new(panel_icon(panel)).size(px(14.)))
                    .child(div().flex_1().min_w_0().child(Label::new(panel.title()).text_sm()))
                    .when(panel != PanelId::NewChat, |row| {
                        row.child(
                            Icon::new(chevron)
                                .size(px(12.))
                                .text_color(theme.muted_foreground),
                        )
                    }),
            );

        v_flex()
            .w_full()
            .px_2()
            .child(title)
            .when(panel == PanelId::NewChat, |section| {
                section.child(self.render_conversation_list(cx))
            })
            .when(is_open, |section| {
                section.child(
                    div()
                        .w_full()
                        .px_3()
                        .py_2()
                        .child(self.render_panel_content(panel, cx)),
                )
            })
            .into_any_element()
    }

    fn render_conversation_list(&self, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        if self.snapshot.conversations.is_empty() {
            return div()
                .px_3()
                .py_1()
                .child(
                    Label::new("No conversations yet")
                        .text_xs()
                        .text_color(theme.muted_foreground),
                )
                .into_any_element();
        }

        v_flex()
            .w_full()
            .pl_4()
            .children(
                self.snapshot
                    .conversations
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| {
                        let conversation_id = entry.id;
                        ListItem::new(("conversation", index))
                            .w_full()
                            .px_3()
                            .py_1()
                            .rounded_md()
                            .selected(entry.active)
                            .on_click(cx.listener(move |_, _event: &ClickEvent, _window, cx| {
                                cx.emit(SidebarEvent::ConversationChosen(conversation_id));
                            }))
                            .child(
                                div()
                                    .min_w_0()
                                    .truncate()
                                    .child(Label::new(entry.title.clone()).text_sm()),
                            )
                    }),
            )
            .into_any_element()
    }

    fn render_panel_content(&self, panel: PanelId, cx: &Context<Self>) -> AnyElement {
        match panel {
            PanelId::NewChat => div().into_any_element(),
            PanelId::Faq => v_flex()
                .gap_1()
                .children(FAQ_ITEMS.iter().copied().enumerate().map(|(index, question)| {
                    Button::new(("faq-item", index))
                        .ghost()
                        .small()
                        .w_full()
                        .child(question)
                        .on_click(cx.listener(move |_, _, _, cx| {
                            cx.emit(SidebarEvent::FaqChosen(question));
                        }))
                }))
                .into_any_element(),
            PanelId::Categories => h_flex()
                .flex_wrap()
                .gap_1()
                .children(CATEGORIES.iter().copied().enumerate().map(|(index, category)| {
                    Button::new(("category-item", index))
                        .ghost()
                        .small()
                        .child(category)
                        .on_click(cx.listener(move |_, _, _, cx| {
                            cx.emit(SidebarEvent::CategoryChosen(category));
                        }))
                }))
                .into_any_element(),
            PanelId::QuickCheck => v_flex()
                .gap_2()
                .child(Input::new(&self.url_input).w_full().small())
                .child(
                    h_flex()
                        .gap_2()
                        .child(
                            Button::new("quick-check")
                                .primary()
                                .small()
                                .child("Check")
                                .on_click(cx.listener(|this, _, _, cx| {
                                    this.request_quick_check(cx);
                                })),
                        )
                        .child(
                            Button::new("quick-clear")
                                .ghost()
                                .small()
                                .child("Clear")
                                .on_click(cx.listener(|this, _, window, cx| {
                                    this.clear_quick_check(window, cx);
                                })),
                        ),
                )
                .child(self.render_output("quick-output", &self.snapshot.quick_check_output, cx))
                .into_any_element(),
            PanelId::ModelInfo => v_flex()
                .gap_2()
                .child(self.render_output("model-info", &self.snapshot.model_info, cx))
                .child(Input::new(&self.token_input).w_full().small())
                .child(
                    Button::new("reload-model")
                        .small()
                        .child("Reload model")
                        .on_click(cx.listener(|this, _, _, cx| {
                            this.request_reload(cx);
                        })),
                )
                .child(self.render_output("reload-output", &self.snapshot.reload_output, cx))
                .into_any_element(),
            PanelId::Export => v_flex()
                .gap_2()
                .child(
                    Button::new("export-chats")
                        .small()
                        .icon(IconName::ArrowDown)
                        .child("Download conversations")
                        .on_click(cx.listener(|_, _, _, cx| {
                            cx.emit(SidebarEvent::ExportRequested);
                        })),
                )
                .when_some(self.snapshot.export_status.clone(), |column, status| {
                    column.child(Label::new(status).text_xs())
                })
                .into_any_element(),
        }
    }

    fn render_output(&self, id: &'static str, text: &str, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        if text.is_empty() {
            return div().into_any_element();
        }

        div()
            .id(id)
            .w_full()
            .max_h(px(220.))
            .overflow_y_scroll()
            .p_2()
            .rounded_md()
            .bg(theme.muted)
            .text_xs()
            .font_family("monospace")
            .text_color(theme.foreground)
            .child(text.to_string())
            .into_any_element()
    }

    fn render_collapsed(&self, cx: &Context<Self>) -> AnyElement {
        v_flex()
            .id("collapsed-sidebar")
            .size_full()
            .items_center()
            .py_3()
            .gap_2()
            .child(
                Button::new("sidebar-pin-collapsed")
                    .ghost()
                    .small()
                    .icon(IconName::PanelLeftOpen)
                    .on_click(cx.listener(|_, _, _, cx| {
                        cx.emit(SidebarEvent::PinToggled);
                    })),
            )
            .children(PanelId::ALL.into_iter().map(|panel| {
                Button::new(("panel-icon", panel_index(panel)))
                    .ghost()
                    .small()
                    .icon(panel_icon(panel))
                    .on_click(cx.listener(move |_, _, _, cx| {
                        cx.emit(SidebarEvent::TitleActivated(panel));
                    }))
            }))
            .into_any_element()
    }
}

impl Render for ChatSidebar {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        if self.snapshot.collapsed {
            return div()
                .size_full()
                .bg(theme.background)
                .child(self.render_collapsed(cx));
        }

        let bg = theme.background;
        let sections = PanelId::ALL
            .into_iter()
            .map(|panel| self.render_section(panel, cx))
            .collect::<Vec<_>>();

        div().size_full().bg(bg).child(
            v_flex()
                .size_full()
                .min_w_0()
                .overflow_hidden()
                .child(self.render_header(cx))
                .child(
                    v_flex()
                        .id("sidebar-sections")
                        .flex_1()
                        .min_h_0()
                        .overflow_y_scroll()
                        .py_2()
                        .gap_1()
                        .children(sections),
                ),
        )
    }
}

fn panel_index(panel: PanelId) -> usize {
    PanelId::ALL
        .iter()
        .position(|candidate| *candidate == panel)
        .unwrap_or_default()
}

fn panel_icon(panel: PanelId) -> IconName {
    match panel {
        PanelId::NewChat => IconName::Plus,
        PanelId::Faq => IconName::Info,
        PanelId::Categories => IconName::Folder,
        PanelId::QuickCheck => IconName::Globe,
        PanelId::ModelInfo => IconName::Bot,
        PanelId::Export => IconName::ArrowDown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_lists_newest_conversation_first_and_marks_active() {
        let mut store = ConversationStore::default();
        store.start_conversation();
        let newest = store.start_conversation();
        let mut panels = PanelController::new();
        panels.activate_title(PanelId::QuickCheck);

        let snapshot = SidebarSnapshot::capture(
            &store,
            &panels,
            &QuickCheckPanel::new(),
            &AdminPanel::new(),
            None,
        );

        let titles = snapshot
            .conversations
            .iter()
            .map(|entry| entry.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Chat 2", "Chat 1"]);
        assert!(snapshot.conversations[0].active);
        assert_eq!(snapshot.conversations[0].id, newest.id);
        assert_eq!(snapshot.open_panel, Some(PanelId::QuickCheck));
        assert!(!snapshot.collapsed);
    }

    #[test]
    fn every_panel_has_a_distinct_index() {
        let mut indices = PanelId::ALL.map(panel_index).to_vec();
        indices.dedup();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }
}
