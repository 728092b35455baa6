use astral_chat::Outgoing;
use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    label::Label,
    v_flex,
};

use crate::chat::events::Submit;

/// Composer text ready to send, or `None` when it is blank and must not reach the pipeline.
pub fn composer_submission(raw: &str) -> Option<Submit> {
    let raw = raw.strip_suffix('\n').unwrap_or(raw);
    if Outgoing::composer(raw).is_blank() {
        return None;
    }
    Some(Submit::new(raw))
}

/// Hint shown while replies are outstanding.
pub fn pending_hint(pending_replies: usize) -> Option<String> {
    match pending_replies {
        0 => None,
        1 => Some("Waiting for 1 reply".to_string()),
        count => Some(format!("Waiting for {count} replies")),
    }
}

/// Composer for questions and pasted links.
///
/// Never disabled: sending while earlier replies are outstanding starts another send.
pub struct MessageInput {
    input_state: Entity<InputState>,
    shift_enter_pending: bool,
    pending_replies: usize,
}

impl EventEmitter<Submit> for MessageInput {}

impl MessageInput {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input_state = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("Ask about phishing or paste a suspicious link...")
                .clean_on_escape()
                .auto_grow(1, 6)
        });

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, event: &InputEvent, window, cx| {
                let InputEvent::PressEnter { secondary } = event else {
                    return;
                };
                // Shift+Enter inserts its own newline before PressEnter arrives.
                if *secondary || std::mem::take(&mut this.shift_enter_pending) {
                    return;
                }
                this.submit(window, cx);
            },
        )
        .detach();

        Self {
            input_state,
            shift_enter_pending: false,
            pending_replies: 0,
        }
    }

    pub fn set_pending_replies(&mut self, pending_replies: usize, cx: &mut Context<Self>) {
        if self.pending_replies != pending_replies {
            self.pending_replies = pending_replies;
            cx.notify();
        }
    }

    fn insert_newline(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.shift_enter_pending = true;
        self.input_state.update(cx, |state, cx| {
            state.insert("\n", window, cx);
        });
    }

    /// Blank text stays in the composer untouched and emits nothing.
    fn submit(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let raw = self.input_state.read(cx).value().to_string();
        let Some(submit) = composer_submission(&raw) else {
            tracing::debug!("composer submit ignored for blank text");
            return;
        };

        cx.emit(submit);
        self.input_state.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        self.shift_enter_pending = false;
    }
}

impl Render for MessageInput {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .bg(theme.background)
            .gap_2()
            .p_3()
            .child(
                div()
                    .w_full()
                    .px_3()
                    .py_2()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .on_key_down(cx.listener(|this, event: &KeyDownEvent, window, cx| {
                        if event.keystroke.key == "enter" && event.keystroke.modifiers.shift {
                            this.insert_newline(window, cx);
                        }
                    }))
                    .child(Input::new(&self.input_state).w_full()),
            )
            .child(
                h_flex()
                    .w_full()
                    .items_center()
                    .justify_between()
                    .child(div().when_some(pending_hint(self.pending_replies), |hint, text| {
                        hint.child(
                            Label::new(text)
                                .text_xs()
                                .text_color(theme.muted_foreground),
                        )
                    }))
                    .child(
                        Button::new("send")
                            .small()
                            .primary()
                            .icon(IconName::ArrowUp)
                            .child("Send")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.submit(window, cx);
                            })),
                    ),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_composer_text_is_not_submitted() {
        assert_eq!(composer_submission(""), None);
        assert_eq!(composer_submission("  \n"), None);
        assert_eq!(
            composer_submission("is bit.ly/x safe?\n"),
            Some(Submit::new("is bit.ly/x safe?"))
        );
    }

    #[test]
    fn pending_hint_counts_outstanding_replies() {
        assert_eq!(pending_hint(0), None);
        assert_eq!(pending_hint(1).as_deref(), Some("Waiting for 1 reply"));
        assert_eq!(pending_hint(3).as_deref(), Some("Waiting for 3 replies"));
    }
}
