// worker.rs — 在 tokio 运行时上执行获取/设置壁纸的任务
// 任务本身不依赖界面刷新：窗口最小化或没有重绘时，定时任务照样保存并设置壁纸，
// 结果以事件发回界面线程，界面下次刷新时再显示。

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use eframe::egui;
use tokio::runtime::Handle;

use super::app::{AppEvent, Loaded};
use super::jobs::JobGate;
use super::preview::decode_preview;
use crate::config::AppConfig;
use crate::date::{self, PickMode};
use crate::error::ApodError;
use crate::refresh::Refreshed;
use crate::setter::{self, FitMode};
use crate::source::PictureSource;

/// 设置壁纸的系统调用
pub type SetWallpaper = fn(&Path, Option<FitMode>) -> Result<(), ApodError>;

enum Job {
    /// 获取、解码、保存；`apply` 为真时随后设为壁纸
    Fetch { date: NaiveDate, apply: bool },
    /// 把已保存的图片设为壁纸
    Apply(PathBuf),
}

/// 后台任务的执行者，可以在任意线程克隆和调用
#[derive(Clone)]
pub struct Worker {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn PictureSource>,
    runtime: Handle,
    image_path: PathBuf,
    fit: Option<FitMode>,
    set_wallpaper: SetWallpaper,
    events: Sender<AppEvent>,
    ctx: egui::Context,
    gate: Mutex<JobGate>,
    /// 定时任务的日期模式，每次触发时读取
    mode: Mutex<PickMode>,
}

/// 锁被毒化只说明别的线程 panic 过，里面的两个布尔值仍然可用
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Worker {
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn PictureSource>,
        runtime: Handle,
        events: Sender<AppEvent>,
        ctx: egui::Context,
    ) -> Self {
        Self::with_setter(config, source, runtime, events, ctx, setter::set_from_path)
    }

    pub fn with_setter(
        config: &AppConfig,
        source: Arc<dyn PictureSource>,
        runtime: Handle,
        events: Sender<AppEvent>,
        ctx: egui::Context,
        set_wallpaper: SetWallpaper,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                runtime,
                image_path: config.image_path.clone(),
                fit: config.wallpaper_mode,
                set_wallpaper,
                events,
                ctx,
                gate: Mutex::new(JobGate::default()),
                mode: Mutex::new(config.mode),
            }),
        }
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.inner.gate).is_busy()
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.inner.gate).has_pending()
    }

    pub fn set_mode(&self, mode: PickMode) {
        *lock(&self.inner.mode) = mode;
    }

    /// 手动获取；忙时返回 false，什么也不做
    pub fn request_fetch(&self, date: NaiveDate) -> bool {
        if !lock(&self.inner.gate).try_start() {
            return false;
        }
        self.spawn(Job::Fetch { date, apply: false });
        true
    }

    /// 手动设置壁纸；忙时返回 false
    pub fn request_apply(&self, path: PathBuf) -> bool {
        if !lock(&self.inner.gate).try_start() {
            return false;
        }
        self.spawn(Job::Apply(path));
        true
    }

    /// 定时触发：空闲时立即获取并设为壁纸，忙时排队，等当前任务结束后执行
    pub fn on_scheduled(&self) -> bool {
        let started = lock(&self.inner.gate).on_scheduled();
        if started {
            self.spawn(self.scheduled_job());
        } else {
            self.send(AppEvent::Queued);
        }
        started
    }

    fn scheduled_job(&self) -> Job {
        let mode = *lock(&self.inner.mode);
        Job::Fetch {
            date: date::pick_date(mode),
            apply: true,
        }
    }

    /// 调用前必须已占用 gate；任务结束时若有排队的定时触发，接着执行
    fn spawn(&self, job: Job) {
        let worker = self.clone();
        self.inner.runtime.spawn(async move {
            let mut job = job;
            loop {
                worker.run(job).await;
                let pending = lock(&worker.inner.gate).finish();
                if !pending {
                    break;
                }
                job = worker.scheduled_job();
            }
            worker.inner.ctx.request_repaint();
        });
    }

    async fn run(&self, job: Job) {
        match job {
            Job::Fetch { date, apply } => {
                self.send(AppEvent::Started(date));
                let fetched = load(self.inner.source.as_ref(), date, &self.inner.image_path).await;
                let saved = fetched.is_ok();
                self.send(AppEvent::Fetched(fetched));
                if apply && saved {
                    self.apply(self.inner.image_path.clone()).await;
                }
            }
            Job::Apply(path) => self.apply(path).await,
        }
    }

    /// 系统调用可能阻塞，放到阻塞线程池执行
    async fn apply(&self, path: PathBuf) {
        let set_wallpaper = self.inner.set_wallpaper;
        let fit = self.inner.fit;
        let applied = tokio::task::spawn_blocking(move || set_wallpaper(&path, fit).map(|()| path))
            .await
            .map_err(|e| ApodError::WallpaperApply(e.to_string()))
            .and_then(|r| r);
        self.send(AppEvent::Applied(applied));
    }

    fn send(&self, event: AppEvent) {
        let _ = self.inner.events.send(event);
        self.inner.ctx.request_repaint();
    }
}

/// 获取并解码成功后才覆盖磁盘上的文件，保证窗口里显示的和文件里的是同一张图
async fn load(source: &dyn PictureSource, date: NaiveDate, path: &Path) -> Result<Loaded, ApodError> {
    let record = source.fetch_picture(date).await?;
    let (record, preview) = tokio::task::spawn_blocking(move || {
        let preview = decode_preview(&record.image_bytes);
        (record, preview)
    })
    .await
    .map_err(|e| ApodError::Decode(e.to_string()))?;
    let preview = preview?;

    setter::save_image(path, &record.image_bytes)?;
    Ok(Loaded {
        refreshed: Refreshed {
            record,
            saved_path: path.to_path_buf(),
            applied: false,
        },
        preview,
    })
}
