// schedule.rs — 每日定时器
// 只有这一种定时机制：算出距离下一次触发时间的延迟，睡眠，触发，再为第二天重新计时。
// 错过的触发（比如系统休眠）不会补跑，上次运行时间也不持久化。

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use std::time::Duration;

/// 解析 HH:MM 格式的每日触发时间
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
}

/// 计算 `at` 的下一次出现时刻
///
/// 今天的 `at` 还没到就是今天；已经过去（或恰好是现在）则顺延到明天。
pub fn next_fire(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + TimeDelta::days(1)
    }
}

/// 距离下一次触发还要等多久
pub fn delay_until_next(now: NaiveDateTime, at: NaiveTime) -> Duration {
    (next_fire(now, at) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// 定时器主循环
///
/// 每次到点调用 `on_fire`。`on_fire` 返回 `false` 表示接收方已经不在了，循环结束。
/// `on_fire` 只负责发消息，真正的获取/设置工作由接收方所在线程执行。
pub async fn run<F>(at: NaiveTime, mut on_fire: F)
where
    F: FnMut() -> bool + Send,
{
    loop {
        let delay = delay_until_next(Local::now().naive_local(), at);
        tokio::time::sleep(delay).await;
        if !on_fire() {
            break;
        }
    }
}
