//! 通用工具函数

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_CASE_STAMP: AtomicI64 = AtomicI64::new(0);
static LAST_STAFF_STAMP: AtomicI64 = AtomicI64::new(0);

/// 取一个严格递增的毫秒时间戳，同一毫秒内的连续调用顺延到下一个值
fn next_stamp(last: &AtomicI64) -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut prev = last.load(Ordering::Relaxed);
    loop {
        let next = if now > prev { now } else { prev + 1 };
        match last.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// 生成病例业务编号 `CASE-<毫秒时间戳>`
pub fn generate_case_id() -> String {
    format!("CASE-{}", next_stamp(&LAST_CASE_STAMP))
}

/// 生成员工编号 `STAFF-<毫秒时间戳>`
pub fn generate_staff_id() -> String {
    format!("STAFF-{}", next_stamp(&LAST_STAFF_STAMP))
}

/// 校验FDI牙位编号（恒牙 11-18, 21-28, 31-38, 41-48）
pub fn is_valid_fdi_tooth(tooth: u8) -> bool {
    let quadrant = tooth / 10;
    let position = tooth % 10;
    (1..=4).contains(&quadrant) && (1..=8).contains(&position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_case_id_format() {
        let id = generate_case_id();
        let stamp = id.strip_prefix("CASE-").expect("prefix");
        assert!(stamp.parse::<i64>().is_ok());
    }

    #[test]
    fn test_case_ids_unique_under_rapid_calls() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_case_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_case_ids_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..250).map(|_| generate_case_id()).collect::<Vec<_>>()))
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_staff_id_prefix() {
        assert!(generate_staff_id().starts_with("STAFF-"));
    }

    #[test]
    fn test_is_valid_fdi_tooth() {
        assert!(is_valid_fdi_tooth(11));
        assert!(is_valid_fdi_tooth(48));
        assert!(!is_valid_fdi_tooth(10));
        assert!(!is_valid_fdi_tooth(19));
        assert!(!is_valid_fdi_tooth(51));
        assert!(!is_valid_fdi_tooth(0));
    }
}
