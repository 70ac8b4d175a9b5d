// ==========================================
// 礼物交换抽签系统 - 定时抽签
// ==========================================
// 抽签日: 每年十一月第四个星期四
// ==========================================

use chrono::{Datelike, NaiveDate, Weekday};

/// 某年的抽签日（十一月第四个星期四）
pub fn draw_day(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Thu, 4)
}

/// 今天是否应执行定时抽签
///
/// # 参数
/// - today: 当前日期
/// - force: 强制执行（忽略日期）
pub fn should_run_scheduled(today: NaiveDate, force: bool) -> bool {
    force || draw_day(today.year()) == Some(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_draw_day() {
        assert_eq!(draw_day(2024), Some(date(2024, 11, 28)));
        assert_eq!(draw_day(2025), Some(date(2025, 11, 27)));
        // 十一月一日即星期四
        assert_eq!(draw_day(2029), Some(date(2029, 11, 22)));
    }

    #[test]
    fn test_should_run_scheduled() {
        assert!(should_run_scheduled(date(2025, 11, 27), false));
        assert!(!should_run_scheduled(date(2025, 11, 26), false));
        assert!(should_run_scheduled(date(2025, 3, 1), true));
    }
}
