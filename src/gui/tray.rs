// tray.rs — 系统托盘图标
// 窗口隐藏（最小化）后可以从托盘恢复。Linux 上托盘依赖 gtk 事件循环，不启用，只能从任务栏恢复。

use std::sync::mpsc::Sender;

use eframe::egui;

use super::app::AppEvent;

/// 托盘发给窗口的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(any(target_os = "windows", target_os = "macos")), allow(dead_code))]
pub enum TrayAction {
    Restore,
    FetchNow,
    Quit,
}

pub use imp::{Tray, create};

#[cfg(any(target_os = "windows", target_os = "macos"))]
mod imp {
    use super::*;
    use rust_i18n::t;
    use tray_icon::menu::{Menu, MenuEvent, MenuItem};
    use tray_icon::{Icon, TrayIcon, TrayIconBuilder, TrayIconEvent};

    pub struct Tray {
        _icon: TrayIcon,
    }

    /// 创建托盘图标；事件转发到窗口的事件通道并唤醒界面
    pub fn create(ctx: &egui::Context, events: Sender<AppEvent>) -> Option<Tray> {
        let icon = default_icon()?;

        let show = MenuItem::new(t!("tray_show").to_string(), true, None);
        let fetch = MenuItem::new(t!("tray_fetch_now").to_string(), true, None);
        let quit = MenuItem::new(t!("tray_quit").to_string(), true, None);
        let menu = Menu::new();
        menu.append(&show).ok()?;
        menu.append(&fetch).ok()?;
        menu.append(&quit).ok()?;

        let tray = TrayIconBuilder::new()
            .with_tooltip(t!("window_title").to_string())
            .with_icon(icon)
            .with_menu(Box::new(menu))
            .build()
            .ok()?;

        let (show_id, fetch_id, quit_id) = (show.id().clone(), fetch.id().clone(), quit.id().clone());
        let menu_events = events.clone();
        let menu_ctx = ctx.clone();
        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            let action = if event.id == show_id {
                TrayAction::Restore
            } else if event.id == fetch_id {
                TrayAction::FetchNow
            } else if event.id == quit_id {
                TrayAction::Quit
            } else {
                return;
            };
            let _ = menu_events.send(AppEvent::Tray(action));
            menu_ctx.request_repaint();
        }));

        let click_ctx = ctx.clone();
        TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
            if matches!(event, TrayIconEvent::DoubleClick { .. }) {
                let _ = events.send(AppEvent::Tray(TrayAction::Restore));
                click_ctx.request_repaint();
            }
        }));

        Some(Tray { _icon: tray })
    }

    /// 程序自带的简单图标：深蓝底色加一颗白色"星星"
    fn default_icon() -> Option<Icon> {
        let size = 16u32;
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let star = ((x == 7 || x == 8) && (4..12).contains(&y))
                    || ((y == 7 || y == 8) && (4..12).contains(&x));
                let (r, g, b) = if star { (255, 255, 255) } else { (20, 30, 80) };
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
        }
        Icon::from_rgba(rgba, size, size).ok()
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
mod imp {
    use super::*;

    pub struct Tray;

    pub fn create(_ctx: &egui::Context, _events: Sender<AppEvent>) -> Option<Tray> {
        None
    }
}
