#![deny(unsafe_code)]

//! Headless state machine of the astral chat widget.
//!
//! The [`store::ConversationStore`] owns session conversations, the [`pipeline::MessagePipeline`]
//! moves text through an external responder, and [`panels::PanelController`] keeps sidebar panels
//! mutually exclusive. Rendering is a pure mapping from store state, see [`render`].

pub mod admin;
pub mod catalog;
pub mod clock;
pub mod export;
pub mod message;
pub mod panels;
pub mod pipeline;
pub mod quick_check;
pub mod render;
pub mod responder;
pub mod store;

pub use admin::AdminPanel;
pub use catalog::{CATEGORIES, FAQ_ITEMS, Outgoing};
pub use clock::{Clock, ManualClock, SystemClock};
pub use export::{ExportDocument, ExportError, ExportResult, write_export};
pub use message::{Conversation, ConversationId, Message, MessageStatus, Sender};
pub use panels::{PanelAction, PanelController, PanelError, PanelId};
pub use pipeline::{
    ERROR_REPLY_PREFIX, MessagePipeline, PendingSend, RequestId, SendOutcome, SendReceipt,
    SendState,
};
pub use quick_check::QuickCheckPanel;
pub use render::{MessageBlock, TranscriptView, render_transcript};
pub use responder::{
    AdminService, BoxFuture, ChatReply, ChatRequest, ChatResponder, ModelInfo, ResponderError,
    ResponderResult, UrlCheckRequest, UrlChecker, UrlVerdict,
};
pub use store::{ConversationRef, ConversationStore, DEFAULT_GREETING, StoreConfig, StoreEvent};
