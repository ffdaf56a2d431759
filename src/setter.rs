// setter.rs — 图片落盘与系统壁纸设置模块

use crate::error::ApodError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// 壁纸填充方式，对应 wallpaper crate 的 Mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    Center,
    Crop,
    Fit,
    Span,
    Stretch,
    Tile,
}

impl FitMode {
    fn to_wallpaper_mode(self) -> wallpaper::Mode {
        match self {
            FitMode::Center => wallpaper::Mode::Center,
            FitMode::Crop => wallpaper::Mode::Crop,
            FitMode::Fit => wallpaper::Mode::Fit,
            FitMode::Span => wallpaper::Mode::Span,
            FitMode::Stretch => wallpaper::Mode::Stretch,
            FitMode::Tile => wallpaper::Mode::Tile,
        }
    }
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" => Ok(FitMode::Center),
            "crop" => Ok(FitMode::Crop),
            "fit" => Ok(FitMode::Fit),
            "span" => Ok(FitMode::Span),
            "stretch" => Ok(FitMode::Stretch),
            "tile" => Ok(FitMode::Tile),
            other => Err(format!("unknown wallpaper mode `{other}`")),
        }
    }
}

/// 把图片字节写到固定路径，覆盖旧文件
///
/// 目录不存在时自动创建。没有并发写保护，同一时刻最多只有一次写入。
pub fn save_image(path: &Path, bytes: &[u8]) -> Result<(), ApodError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// 将指定路径的图片设置为系统壁纸
///
/// # 参数
/// - `path`: 图片的绝对路径
/// - `fit`: 可选的填充方式，在壁纸设置之后应用
pub fn set_from_path(path: &Path, fit: Option<FitMode>) -> Result<(), ApodError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ApodError::WallpaperApply(format!("path is not valid UTF-8: {}", path.display())))?;

    if !path.is_file() {
        return Err(ApodError::WallpaperApply(format!(
            "image file does not exist: {}",
            path.display()
        )));
    }

    // 这个库会自动识别操作系统和桌面环境并调用相应的 API
    wallpaper::set_from_path(path_str).map_err(|e| ApodError::WallpaperApply(e.to_string()))?;

    if let Some(fit) = fit {
        wallpaper::set_mode(fit.to_wallpaper_mode())
            .map_err(|e| ApodError::WallpaperApply(e.to_string()))?;
    }

    Ok(())
}
