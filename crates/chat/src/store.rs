use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock, display_time};
use crate::message::{Conversation, ConversationId, Message, MessageStatus, Sender};

pub const DEFAULT_GREETING: &str = "New chat started. Ask about phishing or paste a URL to check.";
pub const CONVERSATION_TITLE_PREFIX: &str = "Chat";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Bot message emitted into every freshly started conversation.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
        }
    }
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

/// Handle to a conversation returned by store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationRef {
    pub id: ConversationId,
    pub index: usize,
}

/// Change notification committed with every render-producing mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ConversationStarted {
        conversation: ConversationRef,
    },
    ConversationSelected {
        conversation: ConversationRef,
    },
    MessageAppended {
        conversation_id: ConversationId,
        sender: Sender,
        status: MessageStatus,
    },
    TypingRefreshed {
        conversation_id: ConversationId,
    },
    TypingCleared {
        conversation_id: ConversationId,
        removed: usize,
    },
}

/// Owns every conversation of the session plus the active selection.
///
/// All conversation and message mutation goes through the operations below. Each operation is a
/// single synchronous mutation followed by a commit (one render), recorded as a [`StoreEvent`].
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active: Option<usize>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    last_id: u64,
    revision: u64,
    events: Vec<StoreEvent>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl ConversationStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            conversations: Vec::new(),
            active: None,
            config,
            clock,
            last_id: 0,
            revision: 0,
            events: Vec::new(),
        }
    }

    /// Conversations, newest first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active.and_then(|index| self.conversations.get(index))
    }

    pub fn conversation(&self, conversation_id: ConversationId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|conversation| conversation.id == conversation_id)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Number of renders committed so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drains change events committed since the previous call.
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    /// Prepends a fresh conversation, activates it and greets the user.
    pub fn start_conversation(&mut self) -> ConversationRef {
        let now = self.clock.now();
        let id = self.next_conversation_id(now.timestamp_millis());
        let title = format!(
            "{CONVERSATION_TITLE_PREFIX} {}",
            self.conversations.len() + 1
        );

        self.conversations.insert(0, Conversation::new(id, title));
        self.active = Some(0);

        let conversation = ConversationRef { id, index: 0 };
        tracing::info!(conversation_id = %id, total = self.conversations.len(), "started conversation");
        self.commit(StoreEvent::ConversationStarted { conversation });

        let greeting = self.config.greeting.clone();
        self.append_bot_message(greeting);
        conversation
    }

    /// Makes an existing conversation active. Unknown identifiers leave the store untouched.
    pub fn select_conversation(&mut self, conversation_id: ConversationId) -> Option<ConversationRef> {
        let index = self
            .conversations
            .iter()
            .position(|conversation| conversation.id == conversation_id)?;

        self.active = Some(index);
        let conversation = ConversationRef {
            id: conversation_id,
            index,
        };
        self.commit(StoreEvent::ConversationSelected { conversation });
        Some(conversation)
    }

    /// Appends a user message to the active conversation.
    ///
    /// Blank text is a no-op: callers are expected to reject it before calling, so nothing is
    /// created, appended or rendered and `None` is returned.
    pub fn append_user_message(&mut self, text: &str) -> Option<ConversationRef> {
        if text.trim().is_empty() {
            tracing::debug!("ignoring blank user message");
            return None;
        }

        let conversation = self.ensure_active();
        let timestamp = self.display_now();
        let target = &mut self.conversations[conversation.index];
        target.push_before_placeholder(Message::user(text, timestamp));

        self.commit(StoreEvent::MessageAppended {
            conversation_id: conversation.id,
            sender: Sender::User,
            status: MessageStatus::Sent,
        });
        Some(conversation)
    }

    /// Appends a sent bot message, dropping any pending placeholder first.
    pub fn append_bot_message(&mut self, text: impl Into<String>) -> ConversationRef {
        let conversation = self.ensure_active();
        let timestamp = self.display_now();
        let target = &mut self.conversations[conversation.index];

        let removed = target.remove_placeholders();
        if removed > 0 {
            tracing::debug!(conversation_id = %conversation.id, removed, "dropped placeholder before bot reply");
        }
        target.push(Message::bot(text, timestamp));

        self.commit(StoreEvent::MessageAppended {
            conversation_id: conversation.id,
            sender: Sender::Bot,
            status: MessageStatus::Sent,
        });
        conversation
    }

    /// Shows or clears the typing placeholder of the active conversation.
    ///
    /// Showing coalesces with an existing trailing placeholder by refreshing its timestamp;
    /// clearing removes every placeholder.
    pub fn set_typing(&mut self, on: bool) -> ConversationRef {
        let conversation = self.ensure_active();
        let timestamp = self.display_now();
        let target = &mut self.conversations[conversation.index];

        let event = if on {
            if target.refresh_placeholder(&timestamp) {
                StoreEvent::TypingRefreshed {
                    conversation_id: conversation.id,
                }
            } else {
                target.push(Message::typing(timestamp));
                StoreEvent::MessageAppended {
                    conversation_id: conversation.id,
                    sender: Sender::Bot,
                    status: MessageStatus::Typing,
                }
            }
        } else {
            StoreEvent::TypingCleared {
                conversation_id: conversation.id,
                removed: target.remove_placeholders(),
            }
        };

        tracing::debug!(conversation_id = %conversation.id, on, ?event, "typing state changed");
        self.commit(event);
        conversation
    }

    /// Removes every placeholder from one conversation, active or not.
    ///
    /// Commits only when something was removed. Unknown identifiers return `None`.
    pub fn clear_typing_in(&mut self, conversation_id: ConversationId) -> Option<ConversationRef> {
        let index = self
            .conversations
            .iter()
            .position(|conversation| conversation.id == conversation_id)?;

        let removed = self.conversations[index].remove_placeholders();
        if removed > 0 {
            tracing::debug!(%conversation_id, removed, "cleared placeholder in background conversation");
            self.commit(StoreEvent::TypingCleared {
                conversation_id,
                removed,
            });
        }
        Some(ConversationRef {
            id: conversation_id,
            index,
        })
    }

    fn ensure_active(&mut self) -> ConversationRef {
        let existing = self.active.and_then(|index| {
            self.conversations
                .get(index)
                .map(|conversation| ConversationRef {
                    id: conversation.id,
                    index,
                })
        });

        match existing {
            Some(conversation) => conversation,
            None => self.start_conversation(),
        }
    }

    fn next_conversation_id(&mut self, now_millis: i64) -> ConversationId {
        let now_millis = u64::try_from(now_millis).unwrap_or(0);
        let next = now_millis.max(self.last_id.saturating_add(1));
        self.last_id = next;
        ConversationId::new(next)
    }

    fn display_now(&self) -> String {
        display_time(self.clock.now())
    }

    fn commit(&mut self, event: StoreEvent) {
        self.revision = self.revision.saturating_add(1);
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::clock::ManualClock;

    fn store_at_fixed_time() -> (ConversationStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        ));
        let store = ConversationStore::with_clock(StoreConfig::default(), clock.clone());
        (store, clock)
    }

    #[test]
    fn start_conversation_prepends_and_greets() {
        let (mut store, clock) = store_at_fixed_time();
        let first = store.start_conversation();
        clock.advance(Duration::seconds(5));
        let second = store.start_conversation();

        assert_eq!(second.index, 0);
        assert_eq!(store.active_index(), Some(0));
        assert_eq!(store.conversations()[0].title, "Chat 2");
        assert_eq!(store.conversations()[1].title, "Chat 1");
        assert_eq!(store.conversations()[1].id, first.id);

        let active = store.active_conversation().unwrap();
        assert_eq!(active.messages.len(), 1);
        assert_eq!(active.messages[0].sender, Sender::Bot);
        assert_eq!(active.messages[0].text, DEFAULT_GREETING);
    }

    #[test]
    fn identifiers_stay_unique_within_one_millisecond() {
        let (mut store, _clock) = store_at_fixed_time();
        let a = store.start_conversation();
        let b = store.start_conversation();

        assert!(b.id > a.id);
        assert_eq!(
            a.id.as_millis(),
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
                .unwrap()
                .timestamp_millis() as u64
        );
    }

    #[test]
    fn every_mutation_commits_one_render() {
        let (mut store, _clock) = store_at_fixed_time();
        store.start_conversation();
        assert_eq!(store.revision(), 2);

        store.set_typing(false);
        assert_eq!(store.revision(), 3);

        let events = store.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StoreEvent::ConversationStarted { .. }));
        assert!(matches!(
            events[2],
            StoreEvent::TypingCleared { removed: 0, .. }
        ));
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn operations_auto_start_a_conversation() {
        let (mut store, _clock) = store_at_fixed_time();
        store.set_typing(true);

        let active = store.active_conversation().unwrap();
        assert_eq!(store.conversations().len(), 1);
        assert_eq!(active.messages.len(), 2);
        assert!(active.messages[1].is_typing());
    }

    #[test]
    fn typing_refresh_updates_timestamp_in_place() {
        let (mut store, clock) = store_at_fixed_time();
        store.start_conversation();
        store.set_typing(true);
        let before = store.active_conversation().unwrap().messages[1].timestamp.clone();

        clock.advance(Duration::minutes(3));
        store.set_typing(true);

        let active = store.active_conversation().unwrap();
        assert_eq!(active.typing_count(), 1);
        assert_eq!(active.messages.len(), 2);
        assert_ne!(active.messages[1].timestamp, before);
    }

    #[test]
    fn bot_message_replaces_placeholder() {
        let (mut store, _clock) = store_at_fixed_time();
        store.append_user_message("hello");
        store.set_typing(true);
        store.append_bot_message("hi there");

        let active = store.active_conversation().unwrap();
        assert_eq!(active.typing_count(), 0);
        assert_eq!(active.last_message().unwrap().text, "hi there");
        assert_eq!(active.last_message().unwrap().status, MessageStatus::Sent);
    }

    #[test]
    fn select_conversation_switches_active_transcript() {
        let (mut store, _clock) = store_at_fixed_time();
        let older = store.start_conversation();
        store.append_user_message("kept in the first chat");
        store.start_conversation();

        let selected = store.select_conversation(older.id).unwrap();
        assert_eq!(selected.index, 1);
        assert_eq!(
            store.active_conversation().unwrap().last_message().unwrap().text,
            "kept in the first chat"
        );

        let revision = store.revision();
        assert!(store.select_conversation(ConversationId::new(7)).is_none());
        assert_eq!(store.revision(), revision);
        assert_eq!(store.active_index(), Some(1));
    }

    #[test]
    fn clear_typing_in_reaches_background_conversations() {
        let (mut store, _clock) = store_at_fixed_time();
        let background = store.start_conversation();
        store.append_user_message("still waiting");
        store.set_typing(true);
        store.start_conversation();

        let revision = store.revision();
        let cleared = store.clear_typing_in(background.id).unwrap();
        assert_eq!(cleared.index, 1);
        assert_eq!(store.conversation(background.id).unwrap().typing_count(), 0);
        assert_eq!(store.revision(), revision + 1);
        assert_eq!(store.active_index(), Some(0));

        store.clear_typing_in(background.id);
        assert_eq!(store.revision(), revision + 1);
        assert!(store.clear_typing_in(ConversationId::new(7)).is_none());
    }
}
