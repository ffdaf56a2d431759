// config.rs — 配置管理模块
// 遵循 Unix 风格：优先从 ~/.config/apodwall/config.toml 读取配置

use crate::date::PickMode;
use crate::schedule::parse_time_of_day;
use crate::setter::FitMode;
use crate::source::apod::{DEFAULT_BASE_URL, DEMO_API_KEY};
use chrono::NaiveTime;
use rust_i18n::t;
use schemars::JsonSchema; // 引入用于生成 JSON Schema 的 trait
use serde::{Deserialize, Serialize}; // 引入序列化与反序列化 trait
use shellexpand::tilde; // 用于展开 ~ 和环境变量
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// 保存图片时使用的固定文件名
pub const IMAGE_FILE_NAME: &str = "apodwall-apod.jpg";

/// 默认每日触发时间
pub const DEFAULT_SCHEDULE_TIME: &str = "09:00";

/// 展开路径中的 ~ 和环境变量 ($HOME, $XDG_CONFIG_HOME 等)
fn expand_path(path_str: &str) -> PathBuf {
    let expanded = tilde(path_str).into_owned();
    PathBuf::from(expanded)
}

/// 映射 config.toml 文件内容的嵌套结构体
#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ConfigFile {
    #[serde(default)]
    common: CommonConfig,
    #[serde(default)]
    source: SourceConfigs,
    #[serde(default)]
    schedule: ScheduleConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct CommonConfig {
    /// 下载图片的保存路径 (支持 ~、$HOME 等环境变量)，默认在系统临时目录
    #[serde(default)]
    image_path: Option<String>,
    /// 定时刷新时获取哪天的图片：current（今天）或 random（随机历史日期）
    #[serde(default)]
    mode: PickMode,
    /// 壁纸填充方式 (center/crop/fit/span/stretch/tile)，不配置则沿用系统设置
    #[serde(default)]
    wallpaper_mode: Option<FitMode>,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct SourceConfigs {
    #[serde(default)]
    apod: ApodConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ApodConfig {
    /// NASA API Key，不配置则使用 DEMO_KEY
    api_key: Option<String>,
    /// 接口地址，默认 https://api.nasa.gov
    base_url: Option<String>,
}

/// 定时任务配置
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct ScheduleConfig {
    /// 每天触发的时间，HH:MM 格式
    #[serde(default = "default_schedule_time")]
    time: String,
    /// GUI 是否启用每日自动刷新
    #[serde(default = "default_enabled")]
    enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time: default_schedule_time(),
            enabled: default_enabled(),
        }
    }
}

fn default_schedule_time() -> String {
    DEFAULT_SCHEDULE_TIME.to_string()
}
fn default_enabled() -> bool {
    true
}

/// 应用全局配置项
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 配置文件中的 API Key
    pub api_key: Option<String>,
    /// 环境变量 NASA_API_KEY 中的 API Key，优先于配置文件，且不会被写回文件
    pub api_key_override: Option<String>,
    /// APOD 接口地址
    pub base_url: String,
    /// 图片保存路径（唯一的一份图片文件）
    pub image_path: PathBuf,
    /// 日期选择模式
    pub mode: PickMode,
    /// 壁纸填充方式
    pub wallpaper_mode: Option<FitMode>,
    /// 每日触发时间
    pub schedule_time: NaiveTime,
    /// GUI 是否启用定时刷新
    pub schedule_enabled: bool,
    /// 配置文件所在路径
    pub config_path: PathBuf,
}

impl AppConfig {
    /// 初始化配置
    pub fn new() -> Self {
        let home = env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let config_path = home.join(".config").join("apodwall").join("config.toml");
        let env_key = env::var("NASA_API_KEY").ok().filter(|k| !k.is_empty());
        Self::load_from(config_path, env_key)
    }

    /// 从指定的配置文件路径加载，`env_key` 是环境变量中的 API Key
    pub fn load_from(config_path: PathBuf, env_key: Option<String>) -> Self {
        let config_file = Self::load_config_from_file(&config_path).unwrap_or_default();

        let image_path = config_file
            .common
            .image_path
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(default_image_path);

        let schedule_time = match parse_time_of_day(&config_file.schedule.time) {
            Ok(time) => time,
            Err(_) => {
                eprintln!(
                    "{}",
                    t!("config_bad_time", time => config_file.schedule.time, default => DEFAULT_SCHEDULE_TIME)
                );
                default_time()
            }
        };

        Self {
            api_key: config_file.source.apod.api_key,
            api_key_override: env_key,
            base_url: config_file
                .source
                .apod
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            image_path,
            mode: config_file.common.mode,
            wallpaper_mode: config_file.common.wallpaper_mode,
            schedule_time,
            schedule_enabled: config_file.schedule.enabled,
            config_path,
        }
    }

    /// 实际使用的 API Key (优先级：ENV > TOML > DEMO_KEY)
    pub fn api_key(&self) -> &str {
        self.api_key_override
            .as_deref()
            .or(self.api_key.as_deref())
            .unwrap_or(DEMO_API_KEY)
    }

    /// 辅助函数：解析 TOML 配置文件
    fn load_config_from_file(path: &Path) -> Option<ConfigFile> {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
    }

    /// 确保配置目录和图片目录存在
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(parent) = self.image_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn to_config_file(&self) -> ConfigFile {
        ConfigFile {
            common: CommonConfig {
                image_path: Some(self.image_path.to_string_lossy().to_string()),
                mode: self.mode,
                wallpaper_mode: self.wallpaper_mode,
            },
            source: SourceConfigs {
                apod: ApodConfig {
                    api_key: self.api_key.clone(),
                    base_url: Some(self.base_url.clone()),
                },
            },
            schedule: ScheduleConfig {
                time: self.schedule_time.format("%H:%M").to_string(),
                enabled: self.schedule_enabled,
            },
        }
    }

    /// 将配置保存回文件
    pub fn save(&self) -> std::io::Result<()> {
        let toml_str = toml::to_string_pretty(&self.to_config_file())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, toml_str)
    }

    /// 修改单个配置项，值在写入前校验
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "mode" => self.mode = value.parse()?,
            "time" | "schedule_time" => {
                self.schedule_time = parse_time_of_day(value).map_err(|e| e.to_string())?
            }
            "enabled" | "schedule_enabled" => {
                self.schedule_enabled = value.parse().map_err(|_| format!("expected true or false, got `{value}`"))?
            }
            "image_path" | "path" => self.image_path = expand_path(value),
            "api_key" | "key" => self.api_key = Some(value.to_string()),
            "base_url" => self.base_url = value.trim_end_matches('/').to_string(),
            "wallpaper_mode" | "fit" => self.wallpaper_mode = Some(value.parse()?),
            _ => return Err(t!("config_error_unknown_key", key => key).to_string()),
        }
        Ok(())
    }

    /// 获取配置文件的 JSON Schema
    pub fn get_schema() -> String {
        let schema = schemars::schema_for!(ConfigFile);
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }

    /// 将当前配置转换为 TOML 字符串
    pub fn to_toml(&self) -> String {
        let toml_str = toml::to_string_pretty(&self.to_config_file())
            .unwrap_or_else(|_| "# Error serializing config".to_string());

        // toml 库不支持带注释序列化，所以手动插入
        toml_str.replace(
            "[source.apod]",
            "# 环境变量 NASA_API_KEY 优先于这里的 api_key\n# 申请地址: https://api.nasa.gov\n[source.apod]",
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 默认图片路径：系统临时目录下的固定文件名
pub fn default_image_path() -> PathBuf {
    env::temp_dir().join(IMAGE_FILE_NAME)
}

fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("config.toml"), None);

        assert_eq!(config.api_key(), DEMO_API_KEY);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.mode, PickMode::Current);
        assert_eq!(config.schedule_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(config.schedule_enabled);
        assert_eq!(config.image_path, default_image_path());
        assert_eq!(config.wallpaper_mode, None);
    }

    #[test]
    fn reads_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[common]
image_path = "/var/tmp/apod.jpg"
mode = "random"
wallpaper_mode = "fit"

[source.apod]
api_key = "FILE_KEY"

[schedule]
time = "16:30"
enabled = false
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(path, None);

        assert_eq!(config.api_key(), "FILE_KEY");
        assert_eq!(config.mode, PickMode::Random);
        assert_eq!(config.wallpaper_mode, Some(FitMode::Fit));
        assert_eq!(config.image_path, PathBuf::from("/var/tmp/apod.jpg"));
        assert_eq!(config.schedule_time, NaiveTime::from_hms_opt(16, 30, 0).unwrap());
        assert!(!config.schedule_enabled);
    }

    #[test]
    fn env_key_wins_and_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[source.apod]\napi_key = \"FILE_KEY\"\n").unwrap();

        let config = AppConfig::load_from(path.clone(), Some("ENV_KEY".to_string()));
        assert_eq!(config.api_key(), "ENV_KEY");

        config.save().unwrap();
        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("FILE_KEY"));
        assert!(!saved.contains("ENV_KEY"));
    }

    #[test]
    fn invalid_time_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[schedule]\ntime = \"late\"\n").unwrap();

        let config = AppConfig::load_from(path, None);
        assert_eq!(config.schedule_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn set_validates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let mut config = AppConfig::load_from(path.clone(), None);

        config.set("mode", "random").unwrap();
        config.set("time", "16:30").unwrap();
        assert!(config.set("time", "4pm").is_err());
        assert!(config.set("mode", "weekly").is_err());
        assert!(config.set("colour", "blue").is_err());
        config.save().unwrap();

        let reloaded = AppConfig::load_from(path, None);
        assert_eq!(reloaded.mode, PickMode::Random);
        assert_eq!(reloaded.schedule_time, NaiveTime::from_hms_opt(16, 30, 0).unwrap());
    }

    #[test]
    fn schema_mentions_sections() {
        let schema = AppConfig::get_schema();
        assert!(schema.contains("schedule"));
        assert!(schema.contains("apod"));
    }
}
