use astral::app::{AstralShell, ExportChats, NewChat, Quit, ToggleSidebar, ToggleTheme, default_themes_path};
use astral::settings::apply_theme;
use astral_client::SettingsStore;
use gpui::*;
use gpui_component::notification::NotificationList;
use gpui_component::{Root, ThemeRegistry};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "astral=info,astral_chat=info,astral_client=info";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(|cx| {
        gpui_tokio_bridge::init(cx);
        // Must run before any Root is created.
        gpui_component::init(cx);

        // A missing themes directory falls back to the built-in themes.
        if let Err(err) = ThemeRegistry::watch_dir(default_themes_path(), cx, |cx| {
            apply_theme(&SettingsStore::load().settings(), None, cx);
            tracing::info!("theme directory watch initialized");
        }) {
            tracing::warn!(%err, "failed to watch themes directory, using default themes");
            apply_theme(&SettingsStore::load().settings(), None, cx);
        }

        cx.on_action(|_: &Quit, cx| {
            cx.quit();
        });

        cx.bind_keys([
            KeyBinding::new("cmd-q", Quit, None),
            KeyBinding::new("cmd-n", NewChat, None),
            KeyBinding::new("cmd-b", ToggleSidebar, None),
            KeyBinding::new("cmd-e", ExportChats, None),
            KeyBinding::new("cmd-shift-t", ToggleTheme, None),
        ]);

        cx.spawn(async move |cx| {
            cx.update(|cx| {
                let options = WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                        None,
                        size(px(1100.), px(760.)),
                        cx,
                    ))),
                    titlebar: Some(TitlebarOptions {
                        appears_transparent: true,
                        traffic_light_position: Some(point(px(9.), px(9.))),
                        ..Default::default()
                    }),
                    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
                    window_decorations: Some(WindowDecorations::Client),
                    #[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
                    window_decorations: None,
                    ..Default::default()
                };

                let opened = cx.open_window(options, |window, cx| {
                    let notification_list = cx.new(|cx| NotificationList::new(window, cx));
                    let shell = cx.new(|cx| AstralShell::new(notification_list, window, cx));
                    cx.new(|cx| Root::new(shell, window, cx))
                });

                match opened {
                    Ok(_) => cx.activate(true),
                    Err(error) => {
                        tracing::error!(%error, "failed to open main window");
                        cx.quit();
                    }
                }
            })
        })
        .detach();
    });
}
