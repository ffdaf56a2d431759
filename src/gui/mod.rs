// gui/mod.rs — 图形界面入口

mod app;
mod jobs;
mod preview;
mod tray;
mod window;
mod worker;

use crate::config::AppConfig;
use crate::source::PictureSource;
use crate::source::apod::ApodClient;
use app::ApodApp;
use eframe::egui;
use rust_i18n::t;
use std::sync::Arc;

/// 打开主窗口，阻塞直到窗口真正退出
///
/// 必须在 tokio 运行时内调用：网络请求和定时器都跑在这个运行时上
pub fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Handle::current();
    let source: Arc<dyn PictureSource> = Arc::new(ApodClient::new(
        config.base_url.clone(),
        config.api_key().to_string(),
    ));

    let title = t!("window_title").to_string();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title.clone())
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        native_options,
        Box::new(move |cc| Box::new(ApodApp::new(cc, config, source, runtime))),
    )?;
    Ok(())
}
