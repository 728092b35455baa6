use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::catalog::Outgoing;
use crate::message::ConversationId;
use crate::responder::{BoxFuture, ChatReply, ChatRequest, ChatResponder, ResponderResult};
use crate::store::ConversationStore;

pub const ERROR_REPLY_PREFIX: &str = "Error contacting server: ";

/// Identifier of one send, unique per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// How a send settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendOutcome {
    Replied,
    Failed,
}

/// Per-request lifecycle: `Idle -> Sent -> AwaitingReply -> Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sent,
    AwaitingReply,
    Resolved(SendOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendTransition {
    UserAppended,
    TypingShown,
    Settled(SendOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendTransitionRejection {
    pub state: SendState,
    pub transition: SendTransition,
}

impl SendState {
    /// Applies one transition; anything but the next step in order is rejected.
    pub fn apply(self, transition: SendTransition) -> Result<SendState, SendTransitionRejection> {
        match (self, transition) {
            (Self::Idle, SendTransition::UserAppended) => Ok(Self::Sent),
            (Self::Sent, SendTransition::TypingShown) => Ok(Self::AwaitingReply),
            (Self::AwaitingReply, SendTransition::Settled(outcome)) => Ok(Self::Resolved(outcome)),
            (state, transition) => Err(SendTransitionRejection { state, transition }),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// A send suspended on the responder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub request_id: RequestId,
    pub conversation_id: ConversationId,
    pub request: ChatRequest,
    state: SendState,
}

impl PendingSend {
    pub fn state(&self) -> SendState {
        self.state
    }
}

/// Result of a settled send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub request_id: RequestId,
    /// Conversation that received the terminal bot message.
    pub conversation_id: ConversationId,
    pub state: SendState,
    pub bot_text: String,
}

impl SendReceipt {
    pub fn outcome(&self) -> Option<SendOutcome> {
        match self.state {
            SendState::Resolved(outcome) => Some(outcome),
            SendState::Idle | SendState::Sent | SendState::AwaitingReply => None,
        }
    }
}

/// Drives user text through the responder and back into the store.
///
/// The protocol is split around its single suspension point: [`MessagePipeline::begin`] appends
/// the user message and shows the placeholder, the caller awaits [`MessagePipeline::request`],
/// and [`MessagePipeline::resolve`] clears the placeholder before appending the terminal bot
/// message. Sends are neither queued nor serialized against each other.
pub struct MessagePipeline {
    responder: Arc<dyn ChatResponder>,
    next_request_id: AtomicU64,
}

impl MessagePipeline {
    pub fn new(responder: Arc<dyn ChatResponder>) -> Self {
        Self {
            responder,
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn responder(&self) -> &Arc<dyn ChatResponder> {
        &self.responder
    }

    /// Swaps the responder for later sends. Request ids keep counting, and sends already in
    /// flight finish against the responder they started with.
    pub fn set_responder(&mut self, responder: Arc<dyn ChatResponder>) {
        self.responder = responder;
    }

    /// Appends the user message and the typing placeholder. Blank input is declined silently.
    pub fn begin(&self, store: &mut ConversationStore, outgoing: Outgoing) -> Option<PendingSend> {
        if outgoing.is_blank() {
            tracing::debug!("declining to send blank input");
            return None;
        }

        let display_text = outgoing.display_text();
        let conversation = store.append_user_message(&display_text)?;
        let request_id = RequestId(self.next_request_id.fetch_add(1, Ordering::Relaxed));
        let mut pending = PendingSend {
            request_id,
            conversation_id: conversation.id,
            request: ChatRequest::new(outgoing.request_text()),
            state: SendState::Idle,
        };
        advance(&mut pending.state, request_id, SendTransition::UserAppended);

        store.set_typing(true);
        advance(&mut pending.state, request_id, SendTransition::TypingShown);

        tracing::debug!(
            request_id = request_id.0,
            conversation_id = %conversation.id,
            "awaiting responder reply"
        );
        Some(pending)
    }

    /// The responder call for a pending send. Issued exactly once per send.
    pub fn request(&self, pending: &PendingSend) -> BoxFuture<'static, ResponderResult<ChatReply>> {
        let responder = Arc::clone(&self.responder);
        let request = pending.request.clone();
        Box::pin(async move { responder.respond(request).await })
    }

    /// Clears the placeholder, then appends the reply or a describable error.
    pub fn resolve(
        &self,
        store: &mut ConversationStore,
        mut pending: PendingSend,
        outcome: ResponderResult<ChatReply>,
    ) -> SendReceipt {
        let (bot_text, send_outcome) = match outcome {
            Ok(reply) => (reply.into_text(), SendOutcome::Replied),
            Err(error) => {
                tracing::warn!(request_id = pending.request_id.0, %error, "responder call failed");
                (format!("{ERROR_REPLY_PREFIX}{error}"), SendOutcome::Failed)
            }
        };

        store.set_typing(false);
        // The reply lands in the active conversation; the one the send began in must not keep
        // its placeholder once the call has settled.
        if store.active_conversation().map(|active| active.id) != Some(pending.conversation_id) {
            store.clear_typing_in(pending.conversation_id);
        }
        let conversation = store.append_bot_message(bot_text.clone());
        advance(
            &mut pending.state,
            pending.request_id,
            SendTransition::Settled(send_outcome),
        );

        SendReceipt {
            request_id: pending.request_id,
            conversation_id: conversation.id,
            state: pending.state,
            bot_text,
        }
    }

    /// Runs the whole protocol for single-threaded hosts that own the store in a `RefCell`.
    ///
    /// The store is never borrowed across the await, so several sends may be in flight at once.
    pub async fn send(
        &self,
        store: &RefCell<ConversationStore>,
        outgoing: Outgoing,
    ) -> Option<SendReceipt> {
        let pending = self.begin(&mut store.borrow_mut(), outgoing)?;
        let outcome = self.request(&pending).await;
        Some(self.resolve(&mut store.borrow_mut(), pending, outcome))
    }
}

fn advance(state: &mut SendState, request_id: RequestId, transition: SendTransition) {
    match state.apply(transition) {
        Ok(next) => *state = next,
        Err(rejection) => {
            tracing::error!(request_id = request_id.0, ?rejection, "send state transition rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_state_only_moves_forward() {
        let state = SendState::Idle;
        let sent = state.apply(SendTransition::UserAppended).unwrap();
        let awaiting = sent.apply(SendTransition::TypingShown).unwrap();
        let resolved = awaiting
            .apply(SendTransition::Settled(SendOutcome::Failed))
            .unwrap();

        assert_eq!(resolved, SendState::Resolved(SendOutcome::Failed));
        assert!(resolved.is_resolved());
        assert_eq!(
            SendState::Idle.apply(SendTransition::Settled(SendOutcome::Replied)),
            Err(SendTransitionRejection {
                state: SendState::Idle,
                transition: SendTransition::Settled(SendOutcome::Replied),
            })
        );
        assert!(resolved.apply(SendTransition::TypingShown).is_err());
    }

    struct Echo(&'static str);

    impl ChatResponder for Echo {
        fn respond<'a>(&'a self, _request: ChatRequest) -> BoxFuture<'a, ResponderResult<ChatReply>> {
            Box::pin(async move { Ok(ChatReply::Reply(self.0.to_string())) })
        }
    }

    #[test]
    fn request_ids_survive_a_responder_swap() {
        let mut pipeline = MessagePipeline::new(Arc::new(Echo("old")));
        let mut store = ConversationStore::default();

        let first = pipeline.begin(&mut store, Outgoing::composer("one")).unwrap();
        let in_flight = pipeline.request(&first);
        pipeline.set_responder(Arc::new(Echo("new")));
        let second = pipeline.begin(&mut store, Outgoing::composer("two")).unwrap();

        assert!(second.request_id > first.request_id);
        let outcome = futures::executor::block_on(in_flight);
        assert_eq!(outcome.unwrap(), ChatReply::Reply("old".to_string()));
        let outcome = futures::executor::block_on(pipeline.request(&second));
        assert_eq!(outcome.unwrap(), ChatReply::Reply("new".to_string()));
    }
}
