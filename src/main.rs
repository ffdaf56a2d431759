// main.rs — 程序入口
// 负责初始化异步运行时、解析命令行参数、分发子命令

mod cli;
mod config;
mod date;
mod error;
mod gui;
mod refresh;
mod schedule;
mod setter;
mod source;

// 初始化多语言支持，嵌入 locales 目录下的所有翻译
rust_i18n::i18n!("locales");

use chrono::{Local, NaiveDate, NaiveTime};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands, DateArgs};
use config::AppConfig;
use date::PickMode;
use refresh::Refreshed;
use rust_i18n::t;
use source::apod::ApodClient;
use std::path::{Path, PathBuf};

/// `#[tokio::main]` 宏将 async main 转换为同步 main + tokio 运行时
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 自动检测系统语言并设置
    let locale = std::env::var("LANG").unwrap_or_else(|_| "en".to_string());
    if locale.starts_with("zh") {
        rust_i18n::set_locale("zh-CN");
    } else {
        rust_i18n::set_locale("en");
    }

    let cli = Cli::parse();

    // 创建应用配置（读取环境变量和配置文件）
    let mut config = AppConfig::new();

    match cli.command.unwrap_or(Commands::Gui) {
        Commands::Gui => {
            config.ensure_dirs()?;
            gui::run(config)?;
        }

        Commands::Fetch { date, output } => {
            let path = output
                .as_deref()
                .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
                .unwrap_or_else(|| config.image_path.clone());
            let date = resolve_date(&date)?;
            handle_fetch(&config, date, &path, false).await?;
        }

        Commands::Set { date } => {
            config.ensure_dirs()?;
            let date = resolve_date(&date)?;
            let image_path = config.image_path.clone();
            handle_fetch(&config, date, &image_path, true).await?;
        }

        Commands::Apply { image } => {
            let path = PathBuf::from(shellexpand::tilde(&image).into_owned());
            let path = std::fs::canonicalize(&path).unwrap_or(path);
            println!("{}", t!("setting_wallpaper"));
            println!("  -> {}", path.display());
            refresh::apply_saved(&path, config.wallpaper_mode).await?;
            println!("{}", t!("set_done"));
        }

        Commands::Daemon { time, mode, now } => {
            config.ensure_dirs()?;
            let at = match time.as_deref() {
                Some(s) => schedule::parse_time_of_day(s)
                    .map_err(|_| t!("error_bad_time", time => s).to_string())?,
                None => config.schedule_time,
            };
            let mode = match mode.as_deref() {
                Some(m) => m.parse::<PickMode>()?,
                None => config.mode,
            };
            handle_daemon(&config, at, mode, now).await?;
        }

        Commands::Next => {
            let now = Local::now().naive_local();
            let next = schedule::next_fire(now, config.schedule_time);
            let delay = schedule::delay_until_next(now, config.schedule_time);
            println!(
                "{}",
                t!(
                    "next_run",
                    time => next.format("%Y-%m-%d %H:%M"),
                    hours => delay.as_secs() / 3600,
                    minutes => delay.as_secs() % 3600 / 60
                )
            );
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "apodwall", &mut std::io::stdout());
        }

        Commands::Config { action } => {
            handle_config(&mut config, &action)?;
        }

        Commands::Clean => {
            handle_clean(&config)?;
        }
    }

    Ok(())
}

/// 根据命令行参数决定日期：指定日期 > 随机 > 今天
fn resolve_date(args: &DateArgs) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    if let Some(d) = args.date.as_deref() {
        return Ok(date::parse_date(d).map_err(|_| t!("error_bad_date", date => d).to_string())?);
    }
    let mode = if args.random {
        PickMode::Random
    } else {
        PickMode::Current
    };
    Ok(date::pick_date(mode))
}

fn api_client(config: &AppConfig) -> ApodClient {
    ApodClient::new(config.base_url.clone(), config.api_key().to_string())
}

/// 处理 fetch / set 子命令：获取图片、保存，按需设置为壁纸
async fn handle_fetch(
    config: &AppConfig,
    date: NaiveDate,
    path: &Path,
    apply: bool,
) -> Result<Refreshed, Box<dyn std::error::Error>> {
    let client = api_client(config);

    println!("{}", t!("fetch_start", date => date.format("%Y-%m-%d")));
    let refreshed = refresh::refresh(&client, date, path, apply, config.wallpaper_mode).await?;
    print_record(&refreshed);

    if refreshed.applied {
        println!("{}", t!("set_done"));
    }
    Ok(refreshed)
}

fn print_record(refreshed: &Refreshed) {
    let record = &refreshed.record;
    println!(
        "{}",
        t!("picture_info", date => record.date.format("%Y-%m-%d"), title => record.title)
    );
    if let Some(copyright) = &record.copyright {
        println!("{}", t!("picture_copyright", who => copyright));
    }
    println!("{}", t!("save_path", path => refreshed.saved_path.display()));
}

/// 处理 daemon 子命令：常驻后台，每天到点获取并设置壁纸
///
/// 单次失败只打印错误，不影响第二天的运行；Ctrl-C 退出
async fn handle_daemon(
    config: &AppConfig,
    at: NaiveTime,
    mode: PickMode,
    now: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();
    let timer = tokio::spawn(schedule::run(at, move || tx.send(()).is_ok()));

    println!("{}", t!("daemon_start", time => at.format("%H:%M"), mode => mode));

    if now {
        run_scheduled(config, mode).await;
    }

    loop {
        let next = schedule::next_fire(Local::now().naive_local(), at);
        println!("{}", t!("daemon_next", time => next.format("%Y-%m-%d %H:%M")));

        tokio::select! {
            fired = rx.recv() => {
                if fired.is_none() {
                    break;
                }
                run_scheduled(config, mode).await;
            }
            _ = tokio::signal::ctrl_c() => {
                println!("{}", t!("daemon_stop"));
                break;
            }
        }
    }

    timer.abort();
    Ok(())
}

/// 一次定时刷新；模式在每次触发时重新决定日期
async fn run_scheduled(config: &AppConfig, mode: PickMode) {
    let date = date::pick_date(mode);
    if let Err(e) = handle_fetch(config, date, &config.image_path, true).await {
        eprintln!("{}", t!("error_prefix", reason => e));
    }
}

/// 处理 config 子命令：查看或修改配置
fn handle_config(
    config: &mut AppConfig,
    action: &cli::ConfigAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        cli::ConfigAction::Show => {
            println!("{}", t!("config_title"));
            println!("{}", t!("config_path", path => config.config_path.display()));
            println!("{}", t!("config_image_path", path => config.image_path.display()));
            println!("{}", t!("config_mode", mode => config.mode));
            println!(
                "{}",
                t!(
                    "config_schedule",
                    time => config.schedule_time.format("%H:%M"),
                    enabled => config.schedule_enabled
                )
            );
            let key_source = if config.api_key_override.is_some() {
                "NASA_API_KEY"
            } else if config.api_key.is_some() {
                "config.toml"
            } else {
                "DEMO_KEY"
            };
            println!("{}", t!("config_api_key", source => key_source));
        }
        cli::ConfigAction::Schema => {
            println!("{}", AppConfig::get_schema());
        }
        cli::ConfigAction::Dump => {
            println!("{}", config.to_toml());
        }
        cli::ConfigAction::Set { key, value } => {
            config.set(key, value)?;
            config.save()?;
            println!("{}", t!("config_updated", key => key, value => value));
        }
    }
    Ok(())
}

/// 处理 clean 子命令：删除下载的图片文件
fn handle_clean(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let path = &config.image_path;
    if path.is_file() {
        std::fs::remove_file(path)?;
        println!("{}", t!("deleted", path => path.display()));
    } else {
        println!("{}", t!("nothing_to_clean"));
    }
    Ok(())
}
