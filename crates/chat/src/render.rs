use crate::message::{ConversationId, Message, MessageStatus, Sender};
use crate::store::ConversationStore;

/// One visual block of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBlock {
    User { text: String, timestamp: String },
    Bot { text: String, timestamp: String },
    /// Animated placeholder; carries no text.
    Typing { timestamp: String },
}

impl MessageBlock {
    pub fn from_message(message: &Message) -> Self {
        match (message.sender, message.status) {
            (Sender::Bot, MessageStatus::Typing) => Self::Typing {
                timestamp: message.timestamp.clone(),
            },
            (Sender::Bot, MessageStatus::Sent) => Self::Bot {
                text: message.text.clone(),
                timestamp: message.timestamp.clone(),
            },
            (Sender::User, _) => Self::User {
                text: message.text.clone(),
                timestamp: message.timestamp.clone(),
            },
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            Self::User { timestamp, .. } | Self::Bot { timestamp, .. } | Self::Typing { timestamp } => {
                timestamp
            }
        }
    }

    pub fn is_typing(&self) -> bool {
        matches!(self, Self::Typing { .. })
    }
}

/// View model for the active conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranscriptView {
    pub conversation_id: Option<ConversationId>,
    pub title: Option<String>,
    pub blocks: Vec<MessageBlock>,
    /// Index of the block the view must scroll to after rendering: always the newest one.
    pub scroll_to: Option<usize>,
}

impl TranscriptView {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Maps the store's active conversation to blocks, in order. No active conversation renders empty.
pub fn render_transcript(store: &ConversationStore) -> TranscriptView {
    let Some(conversation) = store.active_conversation() else {
        return TranscriptView::default();
    };

    let blocks = conversation
        .messages
        .iter()
        .map(MessageBlock::from_message)
        .collect::<Vec<_>>();
    let scroll_to = blocks.len().checked_sub(1);

    TranscriptView {
        conversation_id: Some(conversation.id),
        title: Some(conversation.title.clone()),
        blocks,
        scroll_to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_renders_nothing() {
        let store = ConversationStore::default();
        let view = render_transcript(&store);
        assert!(view.is_empty());
        assert_eq!(view.scroll_to, None);
        assert_eq!(view.conversation_id, None);
    }

    #[test]
    fn blocks_follow_message_order_and_scroll_to_newest() {
        let mut store = ConversationStore::default();
        store.append_user_message("hello");
        store.set_typing(true);

        let view = render_transcript(&store);
        assert_eq!(view.blocks.len(), 3);
        assert!(matches!(view.blocks[0], MessageBlock::Bot { .. }));
        assert!(matches!(&view.blocks[1], MessageBlock::User { text, .. } if text == "hello"));
        assert!(view.blocks[2].is_typing());
        assert_eq!(view.scroll_to, Some(2));
        assert_eq!(view.title.as_deref(), Some("Chat 1"));
    }
}
