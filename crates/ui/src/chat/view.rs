use std::sync::Arc;

use astral_chat::{
    AdminPanel, ConversationStore, MessagePipeline, Outgoing, PanelAction, PanelController,
    QuickCheckPanel, ResponderError, render_transcript, write_export,
};
use astral_client::{Endpoints, Responders};
use gpui::*;
use gpui_component::{ActiveTheme, v_flex};
use gpui_tokio_bridge::Tokio;

use crate::chat::events::{SidebarEvent, Submit};
use crate::chat::{ChatSidebar, MessageInput, MessageList, SidebarSnapshot};
use crate::settings::{SettingsChanged, SettingsState, apply_theme};

/// Parent coordinator: owns the headless chat state and routes child events into it.
pub struct ChatView {
    sidebar: Entity<ChatSidebar>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    settings_state: Entity<SettingsState>,
    store: ConversationStore,
    pipeline: MessagePipeline,
    responders: Responders,
    endpoints: Endpoints,
    panels: PanelController,
    quick_check: QuickCheckPanel,
    admin: AdminPanel,
    export_status: Option<String>,
    pending_replies: usize,
    quick_check_task: Option<Task<()>>,
    model_info_task: Option<Task<()>>,
    reload_task: Option<Task<()>>,
}

impl ChatView {
    pub fn new(
        settings_state: Entity<SettingsState>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let sidebar = cx.new(|cx| ChatSidebar::new(window, cx));
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));
        let settings = settings_state.read(cx).settings();
        let responders = Responders::from_settings(&settings);

        let mut this = Self {
            sidebar: sidebar.clone(),
            message_list,
            message_input: message_input.clone(),
            settings_state: settings_state.clone(),
            store: ConversationStore::new(settings.store_config()),
            pipeline: MessagePipeline::new(responders.chat.clone()),
            responders,
            endpoints: Endpoints::from_settings(&settings),
            panels: PanelController::new(),
            quick_check: QuickCheckPanel::new(),
            admin: AdminPanel::new(),
            export_status: None,
            pending_replies: 0,
            quick_check_task: None,
            model_info_task: None,
            reload_task: None,
        };

        this.store.start_conversation();
        this.sync_views(cx);
        this.load_model_info(cx);

        cx.subscribe(&sidebar, |this, _, event: &SidebarEvent, cx| {
            this.handle_sidebar_event(event.clone(), cx);
        })
        .detach();

        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            this.dispatch(event.clone().into_outgoing(), cx);
        })
        .detach();

        cx.subscribe_in(
            &settings_state,
            window,
            |this, _, event: &SettingsChanged, window, cx| {
                this.handle_settings_changed(event, window, cx);
            },
        )
        .detach();

        this
    }

    pub fn sidebar(&self) -> &Entity<ChatSidebar> {
        &self.sidebar
    }

    pub fn panels(&self) -> &PanelController {
        &self.panels
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn start_conversation(&mut self, cx: &mut Context<Self>) {
        self.store.start_conversation();
        self.sync_views(cx);
    }

    pub fn toggle_pin(&mut self, cx: &mut Context<Self>) {
        let pinned = self.panels.toggle_pin();
        tracing::debug!(pinned, "sidebar pin toggled");
        self.sync_views(cx);
    }

    pub fn export_conversations(&mut self, cx: &mut Context<Self>) {
        let directory = self.settings_state.read(cx).settings().resolved_export_dir();
        self.export_status = Some(match write_export(&self.store, &directory) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "conversations exported");
                format!("Saved to {}", path.display())
            }
            Err(error) => {
                tracing::warn!(%error, "export failed");
                format!("Export failed: {error}")
            }
        });
        self.sync_views(cx);
    }

    fn handle_sidebar_event(&mut self, event: SidebarEvent, cx: &mut Context<Self>) {
        if let Some(outgoing) = event.outgoing() {
            self.dispatch(outgoing, cx);
            return;
        }

        match event {
            SidebarEvent::TitleActivated(panel) => {
                if let PanelAction::StartConversation = self.panels.activate_title(panel) {
                    self.store.start_conversation();
                }
                self.sync_views(cx);
            }
            SidebarEvent::ConversationChosen(conversation_id) => {
                if self.store.select_conversation(conversation_id).is_none() {
                    tracing::warn!(%conversation_id, "selected conversation no longer exists");
                }
                self.sync_views(cx);
            }
            SidebarEvent::QuickCheckRequested(url) => self.run_quick_check(&url, cx),
            SidebarEvent::QuickCheckCleared => {
                self.quick_check_task = None;
                self.quick_check.clear();
                self.sync_views(cx);
            }
            SidebarEvent::ReloadRequested(token) => self.reload_model(&token, cx),
            SidebarEvent::ExportRequested => self.export_conversations(cx),
            SidebarEvent::PinToggled => self.toggle_pin(cx),
            SidebarEvent::FaqChosen(_) | SidebarEvent::CategoryChosen(_) => {}
        }
    }

    /// Appends the user text and placeholder now, then settles the reply whenever it arrives.
    /// Each send runs on its own task, so overlapping sends are never serialized.
    fn dispatch(&mut self, outgoing: Outgoing, cx: &mut Context<Self>) {
        let Some(pending) = self.pipeline.begin(&mut self.store, outgoing) else {
            return;
        };
        self.pending_replies += 1;
        self.sync_views(cx);

        let reply = Tokio::spawn(cx, self.pipeline.request(&pending));
        cx.spawn(async move |this, cx| {
            let outcome = reply.await.unwrap_or_else(|error| {
                tracing::warn!(?error, "chat request task stopped");
                Err(ResponderError::Interrupted {
                    stage: "chat-request",
                })
            });

            let _ = this.update(cx, |this, cx| {
                let receipt = this.pipeline.resolve(&mut this.store, pending, outcome);
                this.pending_replies = this.pending_replies.saturating_sub(1);
                tracing::debug!(
                    request_id = receipt.request_id.0,
                    conversation_id = %receipt.conversation_id,
                    "send settled"
                );
                this.sync_views(cx);
            });
        })
        .detach();
    }

    fn run_quick_check(&mut self, url: &str, cx: &mut Context<Self>) {
        let request = self.quick_check.begin(url);
        self.sync_views(cx);
        let Some(request) = request else {
            return;
        };

        let checker = Arc::clone(&self.responders.url_check);
        let verdict = Tokio::spawn(cx, async move { checker.check(request).await });
        self.quick_check_task = Some(cx.spawn(async move |this, cx| {
            let outcome = verdict.await.unwrap_or_else(|error| {
                tracing::warn!(?error, "url check task stopped");
                Err(ResponderError::Interrupted {
                    stage: "url-check-request",
                })
            });

            let _ = this.update(cx, |this, cx| {
                this.quick_check.resolve(outcome);
                this.sync_views(cx);
            });
        }));
    }

    fn load_model_info(&mut self, cx: &mut Context<Self>) {
        let admin = Arc::clone(&self.responders.admin);
        let info = Tokio::spawn(cx, async move { admin.model_info().await });
        self.model_info_task = Some(cx.spawn(async move |this, cx| {
            let outcome = info.await.unwrap_or_else(|error| {
                tracing::warn!(?error, "model info task stopped");
                Err(ResponderError::Interrupted {
                    stage: "model-info-request",
                })
            });

            let _ = this.update(cx, |this, cx| {
                this.admin.apply_model_info(&mut this.panels, outcome);
                this.sync_views(cx);
            });
        }));
    }

    fn reload_model(&mut self, token: &str, cx: &mut Context<Self>) {
        let Some(token) = self.admin.begin_reload(token) else {
            return;
        };
        self.sync_views(cx);

        let admin = Arc::clone(&self.responders.admin);
        let reloaded = Tokio::spawn(cx, async move { admin.reload_model(token).await });
        self.reload_task = Some(cx.spawn(async move |this, cx| {
            let outcome = reloaded.await.unwrap_or_else(|error| {
                tracing::warn!(?error, "model reload task stopped");
                Err(ResponderError::Interrupted {
                    stage: "reload-model-request",
                })
            });

            let _ = this.update(cx, |this, cx| {
                if this.admin.resolve_reload(outcome) {
                    this.load_model_info(cx);
                }
                this.sync_views(cx);
            });
        }));
    }

    fn handle_settings_changed(
        &mut self,
        event: &SettingsChanged,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        apply_theme(&event.settings, Some(window), cx);
        let endpoints = Endpoints::from_settings(&event.settings);
        if endpoints != self.endpoints {
            tracing::info!(server_url = %event.settings.server_url, "rebuilding responders");
            self.responders = Responders::from_settings(&event.settings);
            self.pipeline.set_responder(self.responders.chat.clone());
            self.endpoints = endpoints;
        }
        cx.notify();
    }

    /// Copies store and panel state into the child views after a mutation.
    fn sync_views(&mut self, cx: &mut Context<Self>) {
        for event in self.store.take_events() {
            tracing::trace!(?event, "store committed");
        }

        let transcript = render_transcript(&self.store);
        self.message_list.update(cx, |list, cx| {
            list.set_transcript(transcript, cx);
        });

        let snapshot = SidebarSnapshot::capture(
            &self.store,
            &self.panels,
            &self.quick_check,
            &self.admin,
            self.export_status.clone(),
        );
        self.sidebar.update(cx, |sidebar, cx| {
            sidebar.sync(snapshot, cx);
        });

        let pending_replies = self.pending_replies;
        self.message_input.update(cx, |input, cx| {
            input.set_pending_replies(pending_replies, cx);
        });
        cx.notify();
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("chat-view")
            .relative()
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(
                div()
                    .id("chat-view-message-list")
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone()),
            )
            .child(
                div()
                    .id("chat-view-message-input")
                    .flex_shrink_0()
                    .w_full()
                    .border_t_1()
                    .border_color(theme.border)
                    .child(self.message_input.clone()),
            )
    }
}
