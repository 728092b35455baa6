#![deny(unsafe_code)]

/// Desktop shell of the astral phishing-awareness chat widget.
///
/// Headless conversation state lives in `astral-chat`; this crate renders it with GPUI and
/// gpui-component and wires it to the HTTP responders from `astral-client`.
pub mod app;
/// Chat view, transcript, composer and sidebar.
pub mod chat;
pub mod settings;
