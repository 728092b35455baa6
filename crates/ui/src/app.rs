use std::path::PathBuf;

use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::notification::NotificationList;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};

use crate::chat::ChatView;
use crate::settings::SettingsState;

pub fn default_themes_path() -> PathBuf {
    PathBuf::from("./themes")
}

pub const SIDEBAR_DEFAULT_WIDTH: f32 = 280.0;
pub const SIDEBAR_MIN_WIDTH: f32 = 220.0;
pub const SIDEBAR_MAX_WIDTH: f32 = 420.0;
pub const SIDEBAR_COLLAPSED_WIDTH: f32 = 56.0;
#[cfg(target_os = "macos")]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 78.0;
#[cfg(not(target_os = "macos"))]
const WINDOW_TOOLBAR_LEFT_SAFE_PADDING: f32 = 16.0;
#[cfg(target_os = "windows")]
const WINDOW_TOOLBAR_RIGHT_SAFE_PADDING: f32 = 120.0;
#[cfg(not(target_os = "windows"))]
const WINDOW_TOOLBAR_RIGHT_SAFE_PADDING: f32 = 16.0;
const _: () = {
    assert!(SIDEBAR_COLLAPSED_WIDTH > 0.0);
    assert!(SIDEBAR_MIN_WIDTH < SIDEBAR_DEFAULT_WIDTH);
    assert!(SIDEBAR_DEFAULT_WIDTH < SIDEBAR_MAX_WIDTH);
};

fn window_toolbar_height(window: &Window) -> Pixels {
    (1.75 * window.rem_size()).max(px(34.0))
}

/// Clamps a drag position to the allowed expanded sidebar width.
pub fn compute_sidebar_width(drag_x: f32) -> f32 {
    drag_x.clamp(SIDEBAR_MIN_WIDTH, SIDEBAR_MAX_WIDTH)
}

/// Width the sidebar container takes for the current collapse state.
pub fn effective_sidebar_width(collapsed: bool, expanded_width: f32) -> f32 {
    if collapsed {
        SIDEBAR_COLLAPSED_WIDTH
    } else {
        compute_sidebar_width(expanded_width)
    }
}

gpui::actions!(shell, [NewChat, ToggleSidebar, ExportChats, ToggleTheme, Quit]);

#[derive(Clone)]
struct SidebarResizeDrag;

struct EmptyDragView;

impl Render for EmptyDragView {
    fn render(&mut self, _: &mut Window, _: &mut Context<Self>) -> impl IntoElement {
        div()
    }
}

/// Root layout: sidebar, resize handle, chat view, title bar and toasts.
///
/// Collapse state belongs to the chat view's panel controller; the shell only reads it to size
/// the sidebar container.
pub struct AstralShell {
    notification_list: Entity<NotificationList>,
    settings_state: Entity<SettingsState>,
    chat_view: Entity<ChatView>,
    sidebar_width: f32,
    title_bar_should_move: bool,
}

impl AstralShell {
    pub fn new(
        notification_list: Entity<NotificationList>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let settings_state = SettingsState::new(cx);
        let chat_view = cx.new(|cx| ChatView::new(settings_state.clone(), window, cx));

        Self {
            notification_list,
            settings_state,
            chat_view,
            sidebar_width: SIDEBAR_DEFAULT_WIDTH,
            title_bar_should_move: false,
        }
    }

    fn sidebar_collapsed(&self, cx: &App) -> bool {
        self.chat_view.read(cx).panels().is_collapsed()
    }

    fn resize_sidebar(&mut self, new_width: f32, cx: &mut Context<Self>) {
        self.sidebar_width = compute_sidebar_width(new_width);
        cx.notify();
    }

    fn new_chat(&mut self, cx: &mut Context<Self>) {
        self.chat_view
            .update(cx, |chat_view, cx| chat_view.start_conversation(cx));
    }

    fn toggle_pin(&mut self, cx: &mut Context<Self>) {
        self.chat_view
            .update(cx, |chat_view, cx| chat_view.toggle_pin(cx));
        cx.notify();
    }

    fn export_chats(&mut self, cx: &mut Context<Self>) {
        self.chat_view
            .update(cx, |chat_view, cx| chat_view.export_conversations(cx));
    }

    fn toggle_theme(&mut self, cx: &mut Context<Self>) {
        let result = self
            .settings_state
            .update(cx, |settings, cx| settings.toggle_theme(cx));
        if let Err(error) = result {
            tracing::warn!(%error, "failed to persist theme preference");
        }
    }
}

impl Render for AstralShell {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let toolbar_height = window_toolbar_height(window);
        let collapsed = self.sidebar_collapsed(cx);

        div()
            .id("astral-shell")
            .size_full()
            .relative()
            .bg(theme.background)
            .on_action(cx.listener(|this, _: &NewChat, _, cx| this.new_chat(cx)))
            .on_action(cx.listener(|this, _: &ToggleSidebar, _, cx| this.toggle_pin(cx)))
            .on_action(cx.listener(|this, _: &ExportChats, _, cx| this.export_chats(cx)))
            .on_action(cx.listener(|this, _: &ToggleTheme, _, cx| this.toggle_theme(cx)))
            .child(
                v_flex()
                    .size_full()
                    .child(
                        h_flex()
                            .id("app-shell-body")
                            .flex_1()
                            .min_w_0()
                            .min_h_0()
                            .pt(toolbar_height)
                            .overflow_hidden()
                            .child(self.render_sidebar(collapsed, cx))
                            .when(!collapsed, |el| el.child(self.render_resize_handle(cx)))
                            .child(
                                v_flex()
                                    .id("main-content")
                                    .flex_1()
                                    .h_full()
                                    .min_w_0()
                                    .min_h_0()
                                    .overflow_hidden()
                                    .child(self.chat_view.clone()),
                            ),
                    )
                    .child(self.render_bottom_bar(collapsed, cx)),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .left_0()
                    .right_0()
                    .child(self.render_top_bar(window, toolbar_height, cx)),
            )
            .child(self.notification_list.clone())
    }
}

impl AstralShell {
    fn render_top_bar(
        &self,
        window: &Window,
        toolbar_height: Pixels,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        let theme = cx.theme();
        let title = self
            .chat_view
            .read(cx)
            .store()
            .active_conversation()
            .map(|conversation| conversation.title.clone())
            .unwrap_or_default();
        let theme_icon = if theme.is_dark() {
            IconName::Sun
        } else {
            IconName::Moon
        };

        h_flex()
            .id("app-top-bar")
            .window_control_area(WindowControlArea::Drag)
            .on_mouse_down_out(cx.listener(|this, _, _window, _cx| {
                this.title_bar_should_move = false;
            }))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = false;
                }),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _, _window, _cx| {
                    this.title_bar_should_move = true;
                }),
            )
            .on_mouse_move(cx.listener(|this, _, window, _cx| {
                if this.title_bar_should_move {
                    this.title_bar_should_move = false;
                    window.start_window_move();
                }
            }))
            .w_full()
            .h(toolbar_height)
            .flex_shrink_0()
            .pl(px(WINDOW_TOOLBAR_LEFT_SAFE_PADDING))
            .pr(px(WINDOW_TOOLBAR_RIGHT_SAFE_PADDING))
            .items_center()
            .justify_between()
            .bg(theme.background)
            .border_b_1()
            .border_color(theme.border)
            .child(
                div()
                    .id("active-conversation-title")
                    .text_sm()
                    .text_color(theme.muted_foreground)
                    .child(title),
            )
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(
                        Button::new("theme-toggle")
                            .ghost()
                            .small()
                            .icon(theme_icon)
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.toggle_theme(cx);
                            })),
                    )
                    .child(self.render_linux_window_controls(window, cx)),
            )
            .when(
                cfg!(target_os = "linux") && window.window_controls().window_menu,
                |title_bar| {
                    title_bar.on_mouse_down(MouseButton::Right, |event, window, _| {
                        window.show_window_menu(event.position);
                    })
                },
            )
    }

    fn render_linux_window_controls(&self, window: &Window, cx: &Context<Self>) -> AnyElement {
        #[cfg(target_os = "linux")]
        {
            let maximize_icon = if window.is_maximized() {
                IconName::WindowRestore
            } else {
                IconName::WindowMaximize
            };

            h_flex()
                .id("linux-window-controls")
                .items_center()
                // Window controls must not start a title bar drag.
                .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
                .on_mouse_down(MouseButton::Right, |_, _, cx| cx.stop_propagation())
                .gap_2()
                .child(
                    Button::new("linux-window-minimize")
                        .ghost()
                        .small()
                        .icon(IconName::WindowMinimize)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.minimize_window();
                        })),
                )
                .child(
                    Button::new("linux-window-maximize")
                        .ghost()
                        .small()
                        .icon(maximize_icon)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.zoom_window();
                        })),
                )
                .child(
                    Button::new("linux-window-close")
                        .ghost()
                        .small()
                        .icon(IconName::WindowClose)
                        .on_click(cx.listener(|_, _, window, _| {
                            window.remove_window();
                        })),
                )
                .into_any_element()
        }

        #[cfg(not(target_os = "linux"))]
        {
            let _ = (window, cx);
            div().into_any_element()
        }
    }

    fn render_bottom_bar(&self, collapsed: bool, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let pin_icon = if collapsed {
            IconName::PanelLeftOpen
        } else {
            IconName::PanelLeftClose
        };

        h_flex()
            .id("app-bottom-bar")
            .w_full()
            .flex_shrink_0()
            .items_center()
            .gap_1()
            .px_3()
            .py_1()
            .border_t_1()
            .border_color(theme.border)
            .child(
                Button::new("sidebar-pin-toggle")
                    .ghost()
                    .small()
                    .icon(pin_icon)
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.toggle_pin(cx);
                    })),
            )
            .child(
                Button::new("export-chats")
                    .ghost()
                    .small()
                    .icon(IconName::ArrowDown)
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.export_chats(cx);
                    })),
            )
            .child(div().id("app-bottom-main-spacer").flex_1().min_w_0())
    }

    fn render_sidebar(&self, collapsed: bool, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let sidebar = self.chat_view.read(cx).sidebar().clone();

        div()
            .id("sidebar-container")
            .h_full()
            .min_w_0()
            .flex_shrink_0()
            .w(px(effective_sidebar_width(collapsed, self.sidebar_width)))
            .overflow_hidden()
            .bg(theme.background)
            .border_r_1()
            .border_color(theme.border)
            .child(sidebar)
    }

    fn render_resize_handle(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        div()
            .id("sidebar-resize-handle")
            .w(px(1.0))
            .h_full()
            .flex_shrink_0()
            .cursor(CursorStyle::ResizeLeftRight)
            .bg(theme.border)
            .hover(|el| el.bg(theme.primary))
            .on_drag(SidebarResizeDrag, |_, _, _, cx| cx.new(|_| EmptyDragView))
            .on_drag_move::<SidebarResizeDrag>(cx.listener(
                |this, event: &DragMoveEvent<SidebarResizeDrag>, _window, cx| {
                    let new_width: f32 = event.event.position.x.into();
                    this.resize_sidebar(new_width, cx);
                },
            ))
    }
}
