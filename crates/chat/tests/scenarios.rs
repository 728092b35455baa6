use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use astral_chat::{
    BoxFuture, ChatReply, ChatRequest, ChatResponder, ConversationStore, DEFAULT_GREETING,
    ERROR_REPLY_PREFIX, MessagePipeline, MessageStatus, Outgoing, PanelController, PanelId,
    ResponderError, ResponderResult, Sender, SendOutcome, SendState,
};
use serde_json::json;
use tokio::sync::oneshot;

/// Replies with a fixed JSON payload and records every request.
struct FixedResponder {
    payload: serde_json::Value,
    seen: Mutex<Vec<String>>,
}

impl FixedResponder {
    fn new(payload: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            payload,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl ChatResponder for FixedResponder {
    fn respond<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ResponderResult<ChatReply>> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(request.message);
            Ok(ChatReply::from_json(&self.payload))
        })
    }
}

struct OfflineResponder;

impl ChatResponder for OfflineResponder {
    fn respond<'a>(&'a self, _request: ChatRequest) -> BoxFuture<'a, ResponderResult<ChatReply>> {
        Box::pin(async move {
            Err(ResponderError::Transport {
                stage: "send-chat-request",
                source: "network unreachable".into(),
            })
        })
    }
}

/// Holds each reply until the test releases it, so settle order is under test control.
struct GatedResponder {
    gates: Mutex<HashMap<String, oneshot::Receiver<String>>>,
}

impl GatedResponder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gates: Mutex::new(HashMap::new()),
        })
    }

    fn gate(&self, message: &str) -> oneshot::Sender<String> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(message.to_string(), rx);
        tx
    }
}

impl ChatResponder for GatedResponder {
    fn respond<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ResponderResult<ChatReply>> {
        let gate = self.gates.lock().unwrap().remove(&request.message);
        Box::pin(async move {
            let Some(gate) = gate else {
                return Err(ResponderError::Interrupted { stage: "gated" });
            };
            match gate.await {
                Ok(text) => Ok(ChatReply::Reply(text)),
                Err(_) => Err(ResponderError::Interrupted { stage: "gated" }),
            }
        })
    }
}

fn transcript(store: &ConversationStore) -> Vec<(Sender, String)> {
    store
        .active_conversation()
        .map(|conversation| {
            conversation
                .messages
                .iter()
                .map(|message| (message.sender, message.text.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn assert_placeholder_invariant(store: &ConversationStore) {
    for conversation in store.conversations() {
        assert!(
            conversation.typing_invariant_holds(),
            "placeholder invariant broken in {}: {:?}",
            conversation.title,
            conversation.messages
        );
    }
}

#[test]
fn start_conversation_activates_index_zero_with_one_greeting() {
    let mut store = ConversationStore::default();
    for _ in 0..3 {
        let started = store.start_conversation();
        assert_eq!(started.index, 0);
        assert_eq!(store.active_index(), Some(0));

        let messages = &store.conversations()[0].messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Bot);
        assert_eq!(messages[0].status, MessageStatus::Sent);
    }
}

enum Step {
    User(&'static str),
    Bot(&'static str),
    ShowTyping,
    ClearTyping,
    NewConversation,
}

#[test]
fn placeholder_invariant_holds_across_mixed_operations() {
    let mut store = ConversationStore::default();
    let steps = [
        Step::ShowTyping,
        Step::User("one"),
        Step::ShowTyping,
        Step::User("two"),
        Step::ShowTyping,
        Step::Bot("reply"),
        Step::ClearTyping,
        Step::ShowTyping,
        Step::NewConversation,
    ];

    for step in steps {
        match step {
            Step::User(text) => {
                store.append_user_message(text);
            }
            Step::Bot(text) => {
                store.append_bot_message(text);
            }
            Step::ShowTyping => {
                store.set_typing(true);
            }
            Step::ClearTyping => {
                store.set_typing(false);
            }
            Step::NewConversation => {
                store.start_conversation();
            }
        }
        assert_placeholder_invariant(&store);
    }
}

#[test]
fn repeated_show_typing_yields_one_placeholder() {
    let mut store = ConversationStore::default();
    store.start_conversation();
    store.set_typing(true);
    store.set_typing(true);

    let active = store.active_conversation().unwrap();
    assert_eq!(active.typing_count(), 1);
    assert_eq!(active.messages.len(), 2);
}

#[test]
fn blank_user_messages_change_nothing() {
    let mut store = ConversationStore::default();
    assert!(store.append_user_message("").is_none());
    assert!(store.append_user_message("   ").is_none());
    assert!(store.conversations().is_empty());
    assert_eq!(store.revision(), 0);

    store.start_conversation();
    let before = store.conversations()[0].messages.len();
    store.append_user_message("");
    store.append_user_message("   ");
    assert_eq!(store.conversations()[0].messages.len(), before);
}

#[test]
fn show_show_clear_nets_zero_placeholders() {
    let mut store = ConversationStore::default();
    store.start_conversation();
    let before = store.active_conversation().unwrap().messages.clone();

    store.set_typing(true);
    store.set_typing(true);
    store.set_typing(false);

    assert_eq!(store.active_conversation().unwrap().messages, before);
}

#[tokio::test]
async fn fresh_session_send_receives_reply() {
    let responder = FixedResponder::new(json!({"reply": "hi there"}));
    let pipeline = MessagePipeline::new(responder.clone());
    let store = RefCell::new(ConversationStore::default());

    let receipt = pipeline
        .send(&store, Outgoing::composer("hello"))
        .await
        .unwrap();

    assert_eq!(receipt.state, SendState::Resolved(SendOutcome::Replied));
    assert_eq!(responder.seen(), vec!["hello".to_string()]);
    assert_eq!(
        transcript(&store.borrow()),
        vec![
            (Sender::Bot, DEFAULT_GREETING.to_string()),
            (Sender::User, "hello".to_string()),
            (Sender::Bot, "hi there".to_string()),
        ]
    );
    assert_eq!(store.borrow().active_conversation().unwrap().typing_count(), 0);
}

#[tokio::test]
async fn network_failure_becomes_error_message() {
    let pipeline = MessagePipeline::new(Arc::new(OfflineResponder));
    let store = RefCell::new(ConversationStore::default());

    let receipt = pipeline
        .send(&store, Outgoing::composer("ping"))
        .await
        .unwrap();

    assert_eq!(receipt.outcome(), Some(SendOutcome::Failed));
    let store = store.borrow();
    let last = store.active_conversation().unwrap().last_message().unwrap();
    assert_eq!(last.sender, Sender::Bot);
    assert_eq!(last.status, MessageStatus::Sent);
    assert!(last.text.starts_with("Error contacting server:"));
    assert!(last.text.starts_with(ERROR_REPLY_PREFIX));
    assert!(last.text.contains("network unreachable"));
    assert_eq!(store.active_conversation().unwrap().typing_count(), 0);
}

#[tokio::test]
async fn unknown_reply_shape_is_shown_verbatim() {
    let pipeline = MessagePipeline::new(FixedResponder::new(json!({"answer": 1})));
    let store = RefCell::new(ConversationStore::default());

    let receipt = pipeline
        .send(&store, Outgoing::faq("What is phishing?"))
        .await
        .unwrap();

    assert_eq!(receipt.bot_text, r#"{"answer":1}"#);
}

#[tokio::test]
async fn quick_category_shows_and_requests_different_text() {
    let responder = FixedResponder::new(json!({"result": "see the training hub"}));
    let pipeline = MessagePipeline::new(responder.clone());
    let store = RefCell::new(ConversationStore::default());

    pipeline
        .send(&store, Outgoing::category("Training"))
        .await
        .unwrap();

    assert_eq!(responder.seen(), vec!["Resources for Training".to_string()]);
    let transcript = transcript(&store.borrow());
    assert_eq!(transcript[1], (Sender::User, "Show resources for Training".to_string()));
    assert_eq!(transcript[2], (Sender::Bot, "see the training hub".to_string()));
}

#[tokio::test]
async fn blank_composer_input_is_declined_without_a_call() {
    let responder = FixedResponder::new(json!({"reply": "unused"}));
    let pipeline = MessagePipeline::new(responder.clone());
    let store = RefCell::new(ConversationStore::default());

    assert!(pipeline.send(&store, Outgoing::composer("  ")).await.is_none());
    assert!(responder.seen().is_empty());
    assert!(store.borrow().conversations().is_empty());
}

#[tokio::test]
async fn overlapping_sends_settle_in_completion_order() {
    let responder = GatedResponder::new();
    let first_gate = responder.gate("first");
    let second_gate = responder.gate("second");
    let pipeline = MessagePipeline::new(responder);
    let store = RefCell::new(ConversationStore::default());

    let release = async {
        tokio::task::yield_now().await;
        {
            let store = store.borrow();
            let active = store.active_conversation().unwrap();
            assert_eq!(active.typing_count(), 1);
            assert!(active.typing_invariant_holds());
        }
        second_gate.send("second reply".to_string()).unwrap();
        tokio::task::yield_now().await;
        first_gate.send("first reply".to_string()).unwrap();
    };

    let (first, second, ()) = tokio::join!(
        pipeline.send(&store, Outgoing::composer("first")),
        pipeline.send(&store, Outgoing::composer("second")),
        release
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert!(first.request_id < second.request_id);
    assert_eq!(
        transcript(&store.borrow()),
        vec![
            (Sender::Bot, DEFAULT_GREETING.to_string()),
            (Sender::User, "first".to_string()),
            (Sender::User, "second".to_string()),
            (Sender::Bot, "second reply".to_string()),
            (Sender::Bot, "first reply".to_string()),
        ]
    );
    assert_eq!(store.borrow().active_conversation().unwrap().typing_count(), 0);
}

#[tokio::test]
async fn split_phases_never_show_placeholder_with_reply() {
    let pipeline = MessagePipeline::new(FixedResponder::new(json!({"reply": "done"})));
    let mut store = ConversationStore::default();

    let pending = pipeline.begin(&mut store, Outgoing::composer("hi")).unwrap();
    assert_eq!(pending.state(), SendState::AwaitingReply);
    assert!(store.active_conversation().unwrap().last_message().unwrap().is_typing());
    store.take_events();

    let outcome = pipeline.request(&pending).await;
    pipeline.resolve(&mut store, pending, outcome);

    let active = store.active_conversation().unwrap();
    assert_eq!(active.typing_count(), 0);
    assert_eq!(active.last_message().unwrap().text, "done");
    assert_eq!(store.take_events().len(), 2);
}

#[tokio::test]
async fn reply_after_new_chat_clears_placeholder_in_origin_conversation() {
    let pipeline = MessagePipeline::new(FixedResponder::new(json!({"reply": "late answer"})));
    let mut store = ConversationStore::default();

    let pending = pipeline.begin(&mut store, Outgoing::composer("hello")).unwrap();
    let origin = pending.conversation_id;
    let fresh = store.start_conversation();

    let outcome = pipeline.request(&pending).await;
    let receipt = pipeline.resolve(&mut store, pending, outcome);
    assert_eq!(receipt.conversation_id, fresh.id);
    assert_placeholder_invariant(&store);

    store.select_conversation(origin).unwrap();
    assert_eq!(
        transcript(&store),
        vec![
            (Sender::Bot, DEFAULT_GREETING.to_string()),
            (Sender::User, "hello".to_string()),
        ]
    );
    assert!(
        store
            .conversations()
            .iter()
            .all(|conversation| conversation.typing_count() == 0)
    );
}

#[tokio::test]
async fn overlapping_sends_across_conversation_switches_leave_no_placeholder() {
    let responder = GatedResponder::new();
    let first_gate = responder.gate("first");
    let second_gate = responder.gate("second");
    let pipeline = MessagePipeline::new(responder);
    let mut store = ConversationStore::default();

    let first = pipeline.begin(&mut store, Outgoing::composer("first")).unwrap();
    let first_conversation = first.conversation_id;
    let first_reply = pipeline.request(&first);

    let second_conversation = store.start_conversation().id;
    let second = pipeline.begin(&mut store, Outgoing::composer("second")).unwrap();
    assert_eq!(second.conversation_id, second_conversation);
    let second_reply = pipeline.request(&second);

    store.select_conversation(first_conversation).unwrap();
    assert_placeholder_invariant(&store);
    assert!(
        store
            .conversations()
            .iter()
            .all(|conversation| conversation.typing_count() == 1)
    );

    second_gate.send("second reply".to_string()).unwrap();
    let outcome = second_reply.await;
    pipeline.resolve(&mut store, second, outcome);
    assert_placeholder_invariant(&store);
    assert_eq!(
        store.conversation(second_conversation).unwrap().typing_count(),
        0
    );

    store.start_conversation();
    first_gate.send("first reply".to_string()).unwrap();
    let outcome = first_reply.await;
    pipeline.resolve(&mut store, first, outcome);

    assert_placeholder_invariant(&store);
    for conversation in store.conversations() {
        assert_eq!(conversation.typing_count(), 0, "{}", conversation.title);
    }
    assert_eq!(
        store.active_conversation().unwrap().last_message().unwrap().text,
        "first reply"
    );
}

#[test]
fn opening_a_panel_closes_the_previous_one() {
    let mut panels = PanelController::new();
    panels.activate_title("faq".parse::<PanelId>().unwrap());
    panels.activate_title("categories".parse::<PanelId>().unwrap());

    assert!(panels.is_open(PanelId::Categories));
    assert!(!panels.is_open(PanelId::Faq));
    assert_eq!(panels.open_panel(), Some(PanelId::Categories));
}

#[test]
fn collapsing_sidebar_closes_every_panel() {
    let mut panels = PanelController::new();
    panels.activate_title(PanelId::Categories);
    panels.collapse();

    assert_eq!(panels.open_panel(), None);
    assert!(PanelId::ALL.iter().all(|panel| !panels.is_open(*panel)));
}
