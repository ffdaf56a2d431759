// cli.rs — 命令行接口定义模块
// 使用 clap 的 derive 模式定义所有子命令和参数

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// NASA 每日天文图片壁纸工具
///
/// 获取 NASA 的 Astronomy Picture of the Day，在窗口中显示，
/// 并可按计划每天设置为桌面壁纸。不带子命令时打开图形界面。
#[derive(Parser)]
#[command(name = "apodwall")]
#[command(version)]
#[command(author)]
#[command(about = "NASA 每日天文图片壁纸工具 — 获取 APOD，显示并设置为桌面壁纸")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// 选择日期的参数：指定日期、随机，或默认今天
#[derive(Args, Debug, Clone, Default)]
pub struct DateArgs {
    /// 指定日期，格式 YYYY-MM-DD（最早 1995-06-16）
    #[arg(short, long, conflicts_with = "random")]
    pub date: Option<String>,

    /// 从 1995-06-16 到今天之间随机选一天
    #[arg(short, long)]
    pub random: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 打开图形界面（默认）
    Gui,

    /// 获取某天的图片并保存，不设置壁纸
    ///
    /// 用法示例:
    ///   apodwall fetch
    ///   apodwall fetch --date 2025-06-01
    ///   apodwall fetch --random -o ~/Pictures/apod.jpg
    Fetch {
        #[command(flatten)]
        date: DateArgs,

        /// 保存路径（不指定则使用配置中的 image_path）
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 一键更换：获取图片并设置为系统壁纸
    ///
    /// 用法示例:
    ///   apodwall set
    ///   apodwall set --random
    Set {
        #[command(flatten)]
        date: DateArgs,
    },

    /// 将本地指定的图片设置为系统壁纸
    ///
    /// 用法示例:
    ///   apodwall apply image.jpg
    Apply {
        /// 图片的本地路径
        image: String,
    },

    /// 常驻后台：每天在指定时间获取图片并设置为壁纸
    ///
    /// 用法示例:
    ///   apodwall daemon
    ///   apodwall daemon --time 16:30 --mode random
    Daemon {
        /// 每日触发时间 HH:MM（不指定则使用配置中的 schedule.time）
        #[arg(short, long)]
        time: Option<String>,

        /// 日期选择模式 current / random（不指定则使用配置中的 mode）
        #[arg(short, long)]
        mode: Option<String>,

        /// 启动时先立即刷新一次
        #[arg(long)]
        now: bool,
    },

    /// 显示下一次定时刷新的时间
    Next,

    /// 生成 shell 补全脚本（支持 bash, zsh, fish, elvish, powershell）
    ///
    /// 用法示例：
    ///   apodwall completions zsh > ~/.zsh/completions/_apodwall
    Completions {
        /// 目标 shell 类型
        shell: Shell,
    },

    /// 配置管理操作
    ///
    /// 用法示例:
    ///   apodwall config show
    ///   apodwall config set mode random
    ///   apodwall config set time 16:30
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// 删除已下载的图片文件
    Clean,
}

/// 配置管理操作
#[derive(Subcommand)]
pub enum ConfigAction {
    /// 查看当前所有配置简报
    Show,
    /// 生成配置文件对应的 JSON Schema
    Schema,
    /// 以 TOML 格式打印当前完整配置内容
    Dump,
    /// 设置配置项的值 (支持: mode, time, enabled, image_path, api_key, base_url, wallpaper_mode)
    Set {
        /// 要设置的键
        key: String,
        /// 要设置的值
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_gui() {
        let cli = Cli::try_parse_from(["apodwall"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn date_and_random_conflict() {
        assert!(Cli::try_parse_from(["apodwall", "set", "--date", "2025-06-01", "--random"]).is_err());
    }

    #[test]
    fn parses_daemon_options() {
        let cli = Cli::try_parse_from(["apodwall", "daemon", "-t", "16:30", "-m", "random"]).unwrap();
        match cli.command {
            Some(Commands::Daemon { time, mode, now }) => {
                assert_eq!(time.as_deref(), Some("16:30"));
                assert_eq!(mode.as_deref(), Some("random"));
                assert!(!now);
            }
            _ => panic!("expected daemon"),
        }
    }
}
