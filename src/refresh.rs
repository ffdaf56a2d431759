// refresh.rs — 获取、保存、设置壁纸的组合操作
// 定时器、CLI 和 GUI 都通过这里完成一次完整的刷新

use crate::error::ApodError;
use crate::setter::{self, FitMode};
use crate::source::{PictureRecord, PictureSource};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// 一次刷新的结果
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub record: PictureRecord,
    /// 图片保存的位置，也就是下一次"设为壁纸"要用的路径
    pub saved_path: PathBuf,
    pub applied: bool,
}

/// 获取指定日期的图片并保存到 `image_path`
///
/// `apply` 为真时随后设置为系统壁纸，`fit` 是可选的填充方式
pub async fn refresh(
    source: &dyn PictureSource,
    date: NaiveDate,
    image_path: &Path,
    apply: bool,
    fit: Option<FitMode>,
) -> Result<Refreshed, ApodError> {
    let record = source.fetch_picture(date).await?;
    setter::save_image(image_path, &record.image_bytes)?;

    if apply {
        apply_saved(image_path, fit).await?;
    }

    Ok(Refreshed {
        record,
        saved_path: image_path.to_path_buf(),
        applied: apply,
    })
}

/// 将已保存的图片设为壁纸
///
/// 系统调用可能阻塞（部分桌面环境要启动子进程），放到阻塞线程池执行
pub async fn apply_saved(path: &Path, fit: Option<FitMode>) -> Result<(), ApodError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || setter::set_from_path(&path, fit))
        .await
        .map_err(|e| ApodError::WallpaperApply(e.to_string()))?
}
