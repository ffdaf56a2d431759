// app.rs — 主窗口
// 界面线程独占所有界面状态；定时器、后台任务和托盘都只通过事件通道和它通信。

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveTime};
use eframe::CreationContext;
use eframe::egui::{self, RichText};
use rust_i18n::t;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::tray::{self, Tray, TrayAction};
use super::window::WindowState;
use super::worker::Worker;
use crate::config::AppConfig;
use crate::date::{self, PickMode};
use crate::error::ApodError;
use crate::refresh::Refreshed;
use crate::schedule;
use crate::source::PictureSource;

/// 发给界面线程的事件
pub enum AppEvent {
    /// 开始获取某一天的图片
    Started(NaiveDate),
    /// 定时器到点时正忙，已排队
    Queued,
    /// 图片已获取、解码并保存
    Fetched(Result<Loaded, ApodError>),
    /// 壁纸设置完成，携带所用的图片路径
    Applied(Result<PathBuf, ApodError>),
    Tray(TrayAction),
}

/// 后台任务产出的、可直接显示的图片
pub struct Loaded {
    pub refreshed: Refreshed,
    pub preview: egui::ColorImage,
}

/// 当前显示的图片，同一时刻只有一张
struct Shown {
    refreshed: Refreshed,
    texture: egui::TextureHandle,
}

pub struct ApodApp {
    worker: Worker,
    runtime: Handle,
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
    /// 日期模式，由界面上的选择框修改并同步给 worker
    mode: PickMode,
    schedule_time: NaiveTime,
    auto_refresh: bool,
    scheduler: Option<JoinHandle<()>>,
    date_input: String,
    shown: Option<Shown>,
    /// 最近一次保存的图片，"设为壁纸"显式使用这个路径
    last_saved: Option<PathBuf>,
    status: String,
    error: Option<String>,
    window: WindowState,
    /// 上一帧的最小化状态，只在它变化时同步窗口状态
    last_minimized: Option<bool>,
    // 持有托盘图标，释放即消失
    _tray: Option<Tray>,
    quitting: bool,
}

impl ApodApp {
    pub fn new(
        cc: &CreationContext<'_>,
        config: AppConfig,
        source: Arc<dyn PictureSource>,
        runtime: Handle,
    ) -> Self {
        let mut app = Self::with_context(&cc.egui_ctx, config, source, runtime);
        app._tray = tray::create(&cc.egui_ctx, app.events_tx.clone());
        app
    }

    /// 不依赖窗口系统的构造，托盘为空
    pub fn with_context(
        ctx: &egui::Context,
        config: AppConfig,
        source: Arc<dyn PictureSource>,
        runtime: Handle,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let worker = Worker::new(&config, source, runtime.clone(), events_tx.clone(), ctx.clone());
        Self::with_worker(config, worker, runtime, events_tx, events_rx)
    }

    fn with_worker(
        config: AppConfig,
        worker: Worker,
        runtime: Handle,
        events_tx: Sender<AppEvent>,
        events_rx: Receiver<AppEvent>,
    ) -> Self {
        let mut app = Self {
            worker,
            runtime,
            events_tx,
            events_rx,
            mode: config.mode,
            schedule_time: config.schedule_time,
            auto_refresh: config.schedule_enabled,
            scheduler: None,
            date_input: String::new(),
            shown: None,
            last_saved: None,
            status: t!("status_idle").to_string(),
            error: None,
            window: WindowState::default(),
            last_minimized: None,
            _tray: None,
            quitting: false,
        };
        if app.auto_refresh {
            app.start_scheduler();
        }
        app
    }

    /// 定时器直接把触发交给 worker，不经过界面刷新
    fn start_scheduler(&mut self) {
        self.stop_scheduler();
        let worker = self.worker.clone();
        let handle = self.runtime.spawn(schedule::run(self.schedule_time, move || {
            worker.on_scheduled();
            true
        }));
        self.scheduler = Some(handle);
    }

    fn stop_scheduler(&mut self) {
        if let Some(handle) = self.scheduler.take() {
            handle.abort();
        }
    }

    /// 处理所有待处理的事件，只在界面线程调用
    pub fn handle_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(ctx, event);
        }
    }

    fn handle_event(&mut self, ctx: &egui::Context, event: AppEvent) {
        match event {
            AppEvent::Started(date) => {
                self.status = t!("status_fetching", date => date.format("%Y-%m-%d")).to_string();
            }
            AppEvent::Queued => self.status = t!("status_scheduled_queued").to_string(),
            AppEvent::Fetched(Ok(loaded)) => self.show(ctx, loaded),
            AppEvent::Fetched(Err(err)) | AppEvent::Applied(Err(err)) => self.fail(err),
            AppEvent::Applied(Ok(path)) => {
                self.status = t!("status_applied", path => path.display()).to_string();
            }
            AppEvent::Tray(TrayAction::Restore) => self.restore(ctx),
            AppEvent::Tray(TrayAction::FetchNow) => self.request_fetch(date::pick_date(self.mode)),
            AppEvent::Tray(TrayAction::Quit) => self.quit(ctx),
        }
    }

    /// 手动获取：忙时忽略
    pub fn request_fetch(&mut self, date: NaiveDate) {
        self.worker.request_fetch(date);
    }

    /// 手动设置壁纸：使用最近一次保存的图片
    pub fn request_apply(&mut self) {
        let Some(path) = self.last_saved.clone() else {
            self.error = Some(t!("error_nothing_saved").to_string());
            return;
        };
        if self.worker.request_apply(path) {
            self.status = t!("setting_wallpaper").to_string();
        }
    }

    fn show(&mut self, ctx: &egui::Context, loaded: Loaded) {
        let texture = ctx.load_texture("apod-picture", loaded.preview, egui::TextureOptions::LINEAR);
        self.status = t!(
            "status_saved",
            path => loaded.refreshed.saved_path.display()
        )
        .to_string();
        self.last_saved = Some(loaded.refreshed.saved_path.clone());
        // 新图片整体替换旧图片
        self.shown = Some(Shown {
            refreshed: loaded.refreshed,
            texture,
        });
    }

    fn fail(&mut self, err: ApodError) {
        self.status = t!("status_failed").to_string();
        self.error = Some(err.to_string());
    }

    fn fetch_typed_date(&mut self) {
        match date::parse_date(&self.date_input) {
            Ok(date) => self.request_fetch(date),
            Err(_) => {
                self.error = Some(t!("error_bad_date", date => self.date_input.trim()).to_string());
            }
        }
    }

    /// 关闭按钮和最小化都会隐藏窗口，只有明确的退出操作才真正关闭
    fn handle_window(&mut self, ctx: &egui::Context) {
        let (close_requested, minimized) =
            ctx.input(|i| (i.viewport().close_requested(), i.viewport().minimized));

        if close_requested && !self.quitting {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.hide(ctx);
        }

        if minimized != self.last_minimized {
            self.last_minimized = minimized;
            match minimized {
                Some(true) => {
                    self.window.hide();
                }
                // 用户从任务栏恢复
                Some(false) => {
                    self.window.restore();
                }
                None => {}
            }
        }
    }

    /// 隐藏即最小化：窗口仍在任务栏里，事件循环照常运行，托盘和任务栏都能恢复它
    fn hide(&mut self, ctx: &egui::Context) {
        if self.window.hide() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true));
        }
    }

    fn restore(&mut self, ctx: &egui::Context) {
        self.window.restore();
        ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(false));
        ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
    }

    fn quit(&mut self, ctx: &egui::Context) {
        self.quitting = true;
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn ui(&mut self, ctx: &egui::Context) {
        let idle = !self.worker.is_busy();
        // 错误对话框打开时，背后的控件全部禁用
        let unlocked = self.error.is_none();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_enabled_ui(unlocked, |ui| {
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(idle, egui::Button::new(t!("button_get_image").to_string()))
                        .clicked()
                    {
                        self.request_fetch(date::pick_date(self.mode));
                    }
                    if ui
                        .add_enabled(
                            idle && self.last_saved.is_some(),
                            egui::Button::new(t!("button_set_wallpaper").to_string()),
                        )
                        .clicked()
                    {
                        self.request_apply();
                    }

                    ui.separator();
                    ui.label(t!("label_mode").to_string());
                    let before = self.mode;
                    egui::ComboBox::from_id_source("pick_mode")
                        .selected_text(mode_label(self.mode))
                        .show_ui(ui, |ui| {
                            for mode in PickMode::ALL {
                                ui.selectable_value(&mut self.mode, mode, mode_label(mode));
                            }
                        });
                    if self.mode != before {
                        self.worker.set_mode(self.mode);
                    }

                    ui.separator();
                    ui.add(
                        egui::TextEdit::singleline(&mut self.date_input)
                            .hint_text("YYYY-MM-DD")
                            .desired_width(96.0),
                    );
                    if ui
                        .add_enabled(idle, egui::Button::new(t!("button_fetch_date").to_string()))
                        .clicked()
                    {
                        self.fetch_typed_date();
                    }
                });
                ui.horizontal(|ui| {
                    let label = t!(
                        "label_auto_refresh",
                        time => self.schedule_time.format("%H:%M")
                    )
                    .to_string();
                    if ui.checkbox(&mut self.auto_refresh, label).changed() {
                        if self.auto_refresh {
                            self.start_scheduler();
                        } else {
                            self.stop_scheduler();
                        }
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(t!("button_quit").to_string()).clicked() {
                            self.quit(ctx);
                        }
                        if ui.button(t!("button_hide").to_string()).clicked() {
                            self.hide(ctx);
                        }
                    });
                });
                ui.add_space(2.0);
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if !idle {
                    ui.spinner();
                }
                ui.label(&self.status);
                if self.worker.has_pending() {
                    ui.label(RichText::new(t!("status_pending").to_string()).weak());
                }
                if self.auto_refresh {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let next = schedule::next_fire(Local::now().naive_local(), self.schedule_time);
                        ui.label(
                            t!("status_next_run", time => next.format("%Y-%m-%d %H:%M")).to_string(),
                        );
                    });
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(unlocked, |ui| match &self.shown {
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.label(t!("placeholder").to_string());
                    });
                }
                Some(shown) => {
                    let record = &shown.refreshed.record;
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .show(ui, |ui| {
                            ui.heading(RichText::new(&record.title).strong());
                            ui.horizontal(|ui| {
                                ui.label(record.date.format("%Y-%m-%d").to_string());
                                ui.hyperlink_to(t!("label_original").to_string(), &record.image_url);
                            });
                            if let Some(copyright) = &record.copyright {
                                ui.label(t!("label_copyright", who => copyright).to_string());
                            }
                            ui.add_space(6.0);
                            ui.add(
                                egui::Image::new(egui::load::SizedTexture::from_handle(&shown.texture))
                                    .max_width(ui.available_width())
                                    .maintain_aspect_ratio(true),
                            );
                            ui.add_space(6.0);
                            ui.label(&record.caption);
                        });
                }
            });
        });

        self.error_dialog(ctx);
    }

    /// 所有错误都用同一个对话框提示，关闭后程序照常可用
    fn error_dialog(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error.clone() else {
            return;
        };
        let mut open = true;
        egui::Window::new(t!("error_title").to_string())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(6.0);
                if ui.button("OK").clicked() {
                    open = false;
                }
            });
        if !open {
            self.error = None;
        }
    }
}

fn mode_label(mode: PickMode) -> String {
    match mode {
        PickMode::Current => t!("mode_current").to_string(),
        PickMode::Random => t!("mode_random").to_string(),
    }
}

impl Drop for ApodApp {
    fn drop(&mut self) {
        self.stop_scheduler();
    }
}

impl eframe::App for ApodApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_events(ctx);
        self.handle_window(ctx);
        self.ui(ctx);
        // 状态栏里的下次运行时间需要偶尔刷新
        ctx.request_repaint_after(Duration::from_secs(30));
    }
}
