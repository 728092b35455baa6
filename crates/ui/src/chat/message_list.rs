use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;

use astral_chat::{MessageBlock, TranscriptView};
use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex, v_virtual_list};

use crate::chat::scroll_manager::ScrollManager;

const DEFAULT_CONTENT_WIDTH: Pixels = px(680.);
const LIST_HORIZONTAL_PADDING: Pixels = px(16.);
const CONTENT_WIDTH_CHANGE_EPSILON: f32 = 1.0;
const BUBBLE_MAX_WIDTH: Pixels = px(540.);
const BUBBLE_PADDING_X: Pixels = px(14.);
const BUBBLE_PADDING_Y: Pixels = px(10.);
const META_HEIGHT: Pixels = px(14.);
const META_GAP: Pixels = px(4.);
const TYPING_DOTS_HEIGHT: Pixels = px(18.);
const TYPING_DOT_SIZE: Pixels = px(6.);
const TYPING_PULSE: Duration = Duration::from_millis(900);
const TYPING_DOT_STAGGER_MS: u64 = 150;
const ESTIMATED_TEXT_LINE_HEIGHT: Pixels = px(18.);
const ESTIMATED_CHAR_WIDTH: f32 = 7.0;

struct RowSize {
    layout_hash: u64,
    height: Pixels,
    measured: bool,
}

/// Transcript of the active conversation, one row per message block.
pub struct MessageList {
    transcript: TranscriptView,
    rows: Vec<RowSize>,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll_manager: ScrollManager,
    content_width: Option<Pixels>,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            transcript: TranscriptView::default(),
            rows: Vec::new(),
            item_sizes: Rc::new(Vec::new()),
            scroll_manager: ScrollManager::new(),
            content_width: None,
        }
    }

    pub fn transcript(&self) -> &TranscriptView {
        &self.transcript
    }

    /// Replaces the rendered blocks and scrolls to the newest one.
    pub fn set_transcript(&mut self, transcript: TranscriptView, cx: &mut Context<Self>) {
        if self.transcript.conversation_id != transcript.conversation_id {
            self.rows.clear();
            self.scroll_manager.reset();
        }

        self.transcript = transcript;
        self.rebuild_item_sizes();
        self.scroll_manager.request_scroll_to(self.transcript.scroll_to);
        cx.notify();
    }

    fn update_content_width(&mut self, cx: &mut Context<Self>) {
        let list_width = self.scroll_manager.bounds().size.width;
        if list_width <= Pixels::ZERO {
            return;
        }

        let next_content_width = max_pixels(px(1.), list_width - LIST_HORIZONTAL_PADDING * 2);
        let width_changed = self.content_width.is_none_or(|current| {
            (f32::from(current) - f32::from(next_content_width)).abs()
                > CONTENT_WIDTH_CHANGE_EPSILON
        });

        if width_changed {
            self.content_width = Some(next_content_width);
            for row in &mut self.rows {
                row.measured = false;
            }
            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn rebuild_item_sizes(&mut self) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        self.rows.truncate(self.transcript.blocks.len());

        for (index, block) in self.transcript.blocks.iter().enumerate() {
            let next_hash = layout_hash(block);
            let estimated_height = estimate_block_height(block, content_width);

            match self.rows.get_mut(index) {
                Some(row) if row.layout_hash == next_hash => {
                    if !row.measured {
                        row.height = estimated_height;
                    }
                }
                Some(row) => {
                    *row = RowSize {
                        layout_hash: next_hash,
                        height: estimated_height,
                        measured: false,
                    };
                }
                None => self.rows.push(RowSize {
                    layout_hash: next_hash,
                    height: estimated_height,
                    measured: false,
                }),
            }
        }

        self.item_sizes = Rc::new(
            self.rows
                .iter()
                .map(|row| size(px(0.), row.height))
                .collect(),
        );
    }

    fn measure_visible_items(
        &mut self,
        visible_range: Range<usize>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let available_space = size(
            AvailableSpace::Definite(content_width),
            AvailableSpace::MinContent,
        );
        let mut updated = false;

        for index in visible_range {
            let Some(block) = self.transcript.blocks.get(index).cloned() else {
                continue;
            };

            let mut row = self.render_block_row(&block, index, cx);
            let measured_height = row.layout_as_root(available_space, window, cx).height;
            let Some(entry) = self.rows.get_mut(index) else {
                continue;
            };
            if !entry.measured || pixels_changed(entry.height, measured_height) {
                entry.height = measured_height;
                updated = true;
            }
            entry.measured = true;
        }

        if updated {
            self.item_sizes = Rc::new(
                self.rows
                    .iter()
                    .map(|row| size(px(0.), row.height))
                    .collect(),
            );
            cx.notify();
        }
    }

    fn render_block_row(&self, block: &MessageBlock, index: usize, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let meta = Label::new(block.timestamp().to_string())
            .text_xs()
            .text_color(theme.foreground.opacity(0.5));

        match block {
            MessageBlock::User { text, .. } => v_flex()
                .w_full()
                .items_end()
                .gap(META_GAP)
                .child(
                    div()
                        .max_w(BUBBLE_MAX_WIDTH)
                        .px(BUBBLE_PADDING_X)
                        .py(BUBBLE_PADDING_Y)
                        .rounded_lg()
                        .bg(theme.accent)
                        .text_color(theme.accent_foreground)
                        .child(Label::new(non_empty(text)).text_sm()),
                )
                .child(meta)
                .into_any_element(),
            MessageBlock::Bot { text, .. } => v_flex()
                .w_full()
                .items_start()
                .gap(META_GAP)
                .child(
                    div()
                        .max_w(BUBBLE_MAX_WIDTH)
                        .px(BUBBLE_PADDING_X)
                        .py(BUBBLE_PADDING_Y)
                        .rounded_lg()
                        .bg(theme.muted)
                        .text_color(theme.foreground)
                        .child(Label::new(non_empty(text)).text_sm()),
                )
                .child(meta)
                .into_any_element(),
            MessageBlock::Typing { .. } => v_flex()
                .w_full()
                .items_start()
                .gap(META_GAP)
                .child(
                    div()
                        .px(BUBBLE_PADDING_X)
                        .py(BUBBLE_PADDING_Y)
                        .rounded_lg()
                        .bg(theme.muted)
                        .child(typing_dots(index, theme.muted_foreground)),
                )
                .child(meta)
                .into_any_element(),
        }
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.update_content_width(cx);
        if self.scroll_manager.apply_pending_scroll() && self.scroll_manager.pending_target().is_some() {
            cx.notify();
        }

        v_flex().size_full().min_h_0().child(
            v_virtual_list(
                cx.entity().clone(),
                "message-list",
                self.item_sizes.clone(),
                |this, visible_range, window, cx| {
                    this.update_content_width(cx);
                    this.measure_visible_items(visible_range.clone(), window, cx);
                    visible_range
                        .filter_map(|index| {
                            this.transcript
                                .blocks
                                .get(index)
                                .cloned()
                                .map(|block| this.render_block_row(&block, index, cx))
                        })
                        .collect::<Vec<_>>()
                },
            )
            .size_full()
            .px_4()
            .py_3()
            .gap_4()
            .track_scroll(self.scroll_manager.handle()),
        )
    }
}

/// Three dots pulsing out of phase.
fn typing_dots(row: usize, color: Hsla) -> impl IntoElement {
    h_flex()
        .id(("typing-dots", row))
        .h(TYPING_DOTS_HEIGHT)
        .items_center()
        .gap_1()
        .children((0..3u64).map(move |dot| {
            div()
                .size(TYPING_DOT_SIZE)
                .rounded_full()
                .bg(color)
                .with_animation(
                    ("typing-dot", dot as usize),
                    Animation::new(TYPING_PULSE + Duration::from_millis(dot * TYPING_DOT_STAGGER_MS))
                        .repeat()
                        .with_easing(pulsating_between(0.25, 1.0)),
                    |dot, delta| dot.opacity(delta),
                )
        }))
}

fn non_empty(text: &str) -> String {
    if text.is_empty() {
        " ".to_string()
    } else {
        text.to_string()
    }
}

fn layout_hash(block: &MessageBlock) -> u64 {
    let mut hasher = DefaultHasher::new();
    match block {
        MessageBlock::User { text, timestamp } => {
            hasher.write_u8(0);
            text.hash(&mut hasher);
            timestamp.hash(&mut hasher);
        }
        MessageBlock::Bot { text, timestamp } => {
            hasher.write_u8(1);
            text.hash(&mut hasher);
            timestamp.hash(&mut hasher);
        }
        MessageBlock::Typing { timestamp } => {
            hasher.write_u8(2);
            timestamp.hash(&mut hasher);
        }
    }
    hasher.finish()
}

fn estimate_block_height(block: &MessageBlock, content_width: Pixels) -> Pixels {
    let body_height = match block {
        MessageBlock::User { text, .. } | MessageBlock::Bot { text, .. } => {
            let bubble_width = min_pixels(content_width, BUBBLE_MAX_WIDTH);
            let text_width = max_pixels(px(1.), bubble_width - BUBBLE_PADDING_X * 2);
            estimate_text_height(text, text_width)
        }
        MessageBlock::Typing { .. } => TYPING_DOTS_HEIGHT,
    };

    body_height + BUBBLE_PADDING_Y * 2 + META_GAP + META_HEIGHT
}

fn estimate_text_height(content: &str, width: Pixels) -> Pixels {
    if content.is_empty() {
        return ESTIMATED_TEXT_LINE_HEIGHT;
    }

    let chars_per_line = (f32::from(width) / ESTIMATED_CHAR_WIDTH).floor().max(1.0) as usize;
    let mut line_count = 0usize;
    for line in content.lines() {
        line_count += line.chars().count().max(1).div_ceil(chars_per_line);
    }
    if content.ends_with('\n') {
        line_count += 1;
    }

    ESTIMATED_TEXT_LINE_HEIGHT * line_count.max(1)
}

fn max_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) >= f32::from(b) { a } else { b }
}

fn min_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) <= f32::from(b) { a } else { b }
}

fn pixels_changed(a: Pixels, b: Pixels) -> bool {
    (f32::from(a) - f32::from(b)).abs() > 0.5
}
