// source/mod.rs — 图片源抽象
// 定义每日图片的数据结构和所有图片源必须实现的 Trait

pub mod apod;

use crate::error::ApodError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// 媒体类型
///
/// APOD 偶尔发布视频；除 image 以外的值一律视为"不是图片"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
    Other(String),
}

impl MediaType {
    pub fn parse(s: &str) -> Self {
        match s {
            "image" => MediaType::Image,
            "video" => MediaType::Video,
            other => MediaType::Other(other.to_string()),
        }
    }
}

/// 某一天的图片记录
///
/// 每次获取新建一个，构造后不再修改；渲染或保存后即丢弃。
#[derive(Debug, Clone)]
pub struct PictureRecord {
    pub date: NaiveDate,
    pub title: String,
    /// 图片说明（APOD 的 explanation 字段）
    pub caption: String,
    pub image_bytes: Vec<u8>,
    /// 能构造出记录的一定是图片，保留该字段便于调试输出
    #[allow(dead_code)]
    pub media_type: MediaType,
    /// 实际下载图片所用的 URL
    pub image_url: String,
    /// 版权信息，公有领域的图片没有这一项
    pub copyright: Option<String>,
}

/// 图片源 Trait
///
/// 刷新流程和 GUI 只依赖这个接口，测试时可以替换成假的实现。
#[async_trait]
pub trait PictureSource: Send + Sync {
    /// 获取指定日期的图片和元数据
    async fn fetch_picture(&self, date: NaiveDate) -> Result<PictureRecord, ApodError>;
}
