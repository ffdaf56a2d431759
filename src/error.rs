// error.rs — 统一错误类型
// 获取、保存、设置壁纸过程中可能出现的所有错误

use chrono::NaiveDate;
use thiserror::Error;

/// 本程序的错误类型
///
/// GUI 对所有错误一视同仁：弹出对话框提示，不重试，程序继续可用。
/// CLI 则通过 `?` 把错误交给 `main` 打印。
#[derive(Debug, Error)]
pub enum ApodError {
    /// 网络失败或服务端返回非成功状态码
    #[error("request failed: {0}")]
    Transport(String),

    /// 当天发布的不是图片（通常是视频）
    #[error("the picture of the day for {date} is not an image (media type: {media_type})")]
    NotAnImage { date: NaiveDate, media_type: String },

    /// 系统壁纸设置失败
    #[error("failed to set wallpaper: {0}")]
    WallpaperApply(String),

    /// 图片文件读写失败
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// 图片数据无法解码（仅 GUI 预览时使用）
    #[error("failed to decode image: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApodError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApodError::Transport(format!("HTTP {status}")),
            None => ApodError::Transport(err.to_string()),
        }
    }
}

impl From<image::ImageError> for ApodError {
    fn from(err: image::ImageError) -> Self {
        ApodError::Decode(err.to_string())
    }
}
