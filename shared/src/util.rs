use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 毫秒时间戳转 RFC 3339 字符串
pub fn millis_to_rfc3339(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => String::new(),
    }
}

pub fn opt_millis_to_rfc3339(millis: Option<i64>) -> Option<String> {
    millis.map(millis_to_rfc3339)
}

/// Order number prefix
pub const ORDER_NO_PREFIX: &str = "WO";

/// Generate a human-readable order number.
///
/// Layout: `WO` + `%Y%m%d%H%M%S` (UTC) + 6 random digits, e.g.
/// `WO20240301123045004211`. Uniqueness is enforced by the storage layer.
pub fn generate_order_no(at: DateTime<Utc>) -> String {
    use rand::Rng;
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}{}{:06}", ORDER_NO_PREFIX, at.format("%Y%m%d%H%M%S"), suffix)
}

/// Generate a numeric verification code with `len` digits
pub fn generate_numeric_code(len: u32) -> String {
    use rand::Rng;
    let low = 10u32.pow(len.saturating_sub(1));
    let high = 10u32.pow(len);
    rand::thread_rng().gen_range(low..high).to_string()
}
