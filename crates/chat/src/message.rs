use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for one conversation, derived from its creation time in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub u64);

impl ConversationId {
    /// Creates a typed conversation identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Chat speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Lifecycle status for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    /// Reply pending. Only valid on bot messages, and the text is empty.
    Typing,
}

/// One entry of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "from")]
    pub sender: Sender,
    pub text: String,
    /// Display-formatted local time (`HH:MM`).
    #[serde(rename = "time")]
    pub timestamp: String,
    pub status: MessageStatus,
}

impl Message {
    pub fn user(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            timestamp: timestamp.into(),
            status: MessageStatus::Sent,
        }
    }

    pub fn bot(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            timestamp: timestamp.into(),
            status: MessageStatus::Sent,
        }
    }

    /// Creates the transient "reply pending" placeholder.
    pub fn typing(timestamp: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: String::new(),
            timestamp: timestamp.into(),
            status: MessageStatus::Typing,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.sender == Sender::Bot && self.status == MessageStatus::Typing
    }
}

/// Session-scoped, ordered transcript.
///
/// Conversations are only ever mutated through [`crate::store::ConversationStore`], which
/// hands out shared references exclusively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new(id: ConversationId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            messages: Vec::new(),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn typing_count(&self) -> usize {
        self.messages.iter().filter(|message| message.is_typing()).count()
    }

    /// Returns true when the placeholder invariant holds: at most one typing entry, always last.
    pub fn typing_invariant_holds(&self) -> bool {
        match self.typing_count() {
            0 => true,
            1 => self.last_message().is_some_and(Message::is_typing),
            _ => false,
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends a user message, keeping a pending placeholder at the tail.
    pub(crate) fn push_before_placeholder(&mut self, message: Message) {
        match self.messages.last() {
            Some(last) if last.is_typing() => {
                let index = self.messages.len() - 1;
                self.messages.insert(index, message);
            }
            _ => self.messages.push(message),
        }
    }

    /// Refreshes the trailing placeholder in place, returning false when there is none.
    pub(crate) fn refresh_placeholder(&mut self, timestamp: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.is_typing() => {
                last.timestamp = timestamp.to_string();
                true
            }
            _ => false,
        }
    }

    /// Removes every typing placeholder, scanning from the tail. Returns how many were removed.
    pub(crate) fn remove_placeholders(&mut self) -> usize {
        let before = self.messages.len();
        // Exhaustive on purpose: a stray placeholder anywhere in the transcript is removed too.
        for index in (0..self.messages.len()).rev() {
            if self.messages[index].is_typing() {
                self.messages.remove(index);
            }
        }
        before - self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_removal_is_exhaustive() {
        let mut conversation = Conversation::new(ConversationId::new(1), "Chat 1");
        conversation.push(Message::typing("09:00"));
        conversation.push(Message::user("hi", "09:00"));
        conversation.push(Message::typing("09:01"));

        assert!(!conversation.typing_invariant_holds());
        assert_eq!(conversation.remove_placeholders(), 2);
        assert_eq!(conversation.messages, vec![Message::user("hi", "09:00")]);
        assert!(conversation.typing_invariant_holds());
    }

    #[test]
    fn user_message_lands_before_pending_placeholder() {
        let mut conversation = Conversation::new(ConversationId::new(1), "Chat 1");
        conversation.push(Message::user("first", "09:00"));
        conversation.push(Message::typing("09:00"));
        conversation.push_before_placeholder(Message::user("second", "09:01"));

        let texts = conversation
            .messages
            .iter()
            .map(|message| message.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["first", "second", ""]);
        assert!(conversation.typing_invariant_holds());
    }

    #[test]
    fn message_serializes_with_widget_field_names() {
        let value = serde_json::to_value(Message::user("hello", "10:42")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"from": "user", "text": "hello", "time": "10:42", "status": "sent"})
        );
    }
}
