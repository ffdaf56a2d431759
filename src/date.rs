// date.rs — 日期选择
// 决定每次要获取哪一天的 APOD：今天，或者历史上随机的一天

use chrono::{Days, Local, NaiveDate};
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// APOD 发布的第一天
pub const FIRST_APOD: NaiveDate = match NaiveDate::from_ymd_opt(1995, 6, 16) {
    Some(date) => date,
    None => panic!("invalid first APOD date"),
};

/// 日期选择模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PickMode {
    /// 今天的图片
    #[default]
    Current,
    /// 从 1995-06-16 到今天之间均匀随机选一天
    Random,
}

impl PickMode {
    pub const ALL: [PickMode; 2] = [PickMode::Current, PickMode::Random];

    pub fn as_str(&self) -> &'static str {
        match self {
            PickMode::Current => "current",
            PickMode::Random => "random",
        }
    }
}

impl fmt::Display for PickMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" | "today" => Ok(PickMode::Current),
            "random" => Ok(PickMode::Random),
            other => Err(format!("unknown mode `{other}` (expected current or random)")),
        }
    }
}

/// 按本地时钟选择日期
pub fn pick_date(mode: PickMode) -> NaiveDate {
    pick_date_with(mode, Local::now().date_naive(), &mut rand::thread_rng())
}

/// 选择日期，`today` 和随机数发生器由调用方提供
///
/// 随机模式的范围是闭区间 [FIRST_APOD, today]。
/// 如果 `today` 早于第一张 APOD（时钟不对），直接返回 FIRST_APOD。
pub fn pick_date_with<R: Rng + ?Sized>(mode: PickMode, today: NaiveDate, rng: &mut R) -> NaiveDate {
    match mode {
        PickMode::Current => today,
        PickMode::Random => {
            let span = (today - FIRST_APOD).num_days();
            if span <= 0 {
                return FIRST_APOD;
            }
            let offset = rng.gen_range(0..=span as u64);
            FIRST_APOD
                .checked_add_days(Days::new(offset))
                .unwrap_or(today)
        }
    }
}

/// 解析 YYYY-MM-DD 格式的日期
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn current_mode_returns_today() {
        let today = ymd(2025, 6, 1);
        let picked = pick_date_with(PickMode::Current, today, &mut rand::thread_rng());
        assert_eq!(picked, today);
        assert_eq!(picked.format("%Y-%m-%d").to_string(), "2025-06-01");
    }

    #[test]
    fn random_mode_stays_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for today in [ymd(1995, 6, 17), ymd(2001, 1, 1), ymd(2025, 6, 1)] {
            for _ in 0..500 {
                let picked = pick_date_with(PickMode::Random, today, &mut rng);
                assert!(picked >= FIRST_APOD && picked <= today, "{picked} out of range");
            }
        }
    }

    #[test]
    fn random_mode_reaches_both_ends_of_a_short_range() {
        let today = ymd(1995, 6, 17);
        let mut rng = StdRng::seed_from_u64(1);
        let picks: Vec<_> = (0..200)
            .map(|_| pick_date_with(PickMode::Random, today, &mut rng))
            .collect();
        assert!(picks.contains(&FIRST_APOD));
        assert!(picks.contains(&today));
    }

    #[test]
    fn random_mode_before_first_apod_falls_back() {
        let picked = pick_date_with(PickMode::Random, ymd(1990, 1, 1), &mut rand::thread_rng());
        assert_eq!(picked, FIRST_APOD);
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("random".parse::<PickMode>(), Ok(PickMode::Random));
        assert_eq!(" Current ".parse::<PickMode>(), Ok(PickMode::Current));
        assert!("weekly".parse::<PickMode>().is_err());
    }

    #[test]
    fn parses_dates() {
        assert_eq!(parse_date("2025-06-01").unwrap(), ymd(2025, 6, 1));
        assert!(parse_date("06/01/2025").is_err());
    }
}
