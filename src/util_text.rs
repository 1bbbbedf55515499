//! Display helpers for addresses, timestamps and token amounts.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{ExplorerError, Result};

/// Decimal places of the native MOVE coin.
pub const MOVE_DECIMALS: u32 = 8;

/// Shorten a long address to `head...tail`.
///
/// Strings no longer than `head + tail + 3` are returned unchanged, since the
/// ellipsis would not save anything.
/// Examples: "0xaaaa...aaaa", "0x12"
pub fn truncate_address(address: &str, head: usize, tail: usize) -> String {
    let len = address.chars().count();
    if len <= head + tail + 3 {
        return address.to_string();
    }
    let start: String = address.chars().take(head).collect();
    let end: String = address.chars().skip(len - tail).collect();
    format!("{start}...{end}")
}

/// `truncate_address` with the 6/4 split used in transaction tables.
pub fn truncate_address_default(address: &str) -> String {
    truncate_address(address, 6, 4)
}

/// Parse an indexer timestamp. The indexer stores UTC without a zone suffix.
pub fn parse_utc_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    let ts = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&format!("{ts}Z")) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Relative age of an indexer timestamp ("42s ago", "3h ago", ...).
pub fn format_relative_time(timestamp: &str) -> String {
    format_relative_time_at(timestamp, Utc::now())
}

/// Same as [`format_relative_time`] against an explicit `now`.
///
/// Timestamps in the future yield negative counts ("-5s ago"); callers that
/// care about clock skew should clamp before formatting.
pub fn format_relative_time_at(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(date) = parse_utc_timestamp(timestamp) else {
        return timestamp.to_string();
    };

    let diff_ms = (now - date).num_milliseconds();
    let seconds = diff_ms.div_euclid(1000);
    let minutes = seconds.div_euclid(60);
    let hours = minutes.div_euclid(60);
    let days = hours.div_euclid(24);

    if seconds < 60 {
        format!("{seconds}s ago")
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 30 {
        format!("{days}d ago")
    } else {
        date.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}

/// Full local date and time for detail views.
pub fn format_local_datetime(timestamp: &str) -> String {
    match parse_utc_timestamp(timestamp) {
        Some(dt) => dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => timestamp.to_string(),
    }
}

/// Insert `,` every three digits from the right.
pub fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format an unsigned base-unit amount of any size with `decimals` places.
///
/// Integer part is grouped with thousands separators, the fraction is cut to
/// four digits and trailing zeros are dropped. Division by `10^decimals` is a
/// split of the digit string, so there is no width limit.
/// Examples: "123456789" -> "1.2345", "100000000" -> "1"
pub fn format_fixed_point(raw_amount: &str, decimals: u32) -> Result<String> {
    let raw = raw_amount.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExplorerError::InvalidAmount(raw_amount.to_string()));
    }
    Ok(fixed_point_digits(raw, decimals as usize))
}

fn fixed_point_digits(digits: &str, decimals: usize) -> String {
    let significant = digits.trim_start_matches('0');
    let (int_part, frac_part) = if significant.len() > decimals {
        let split = significant.len() - decimals;
        (
            significant[..split].to_string(),
            significant[split..].to_string(),
        )
    } else {
        (
            "0".to_string(),
            format!("{:0>width$}", significant, width = decimals),
        )
    };

    let frac: String = frac_part.chars().take(4).collect();
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        group_thousands(&int_part)
    } else {
        format!("{}.{}", group_thousands(&int_part), frac)
    }
}

/// Format a MOVE amount in octas, e.g. "1.5 MOVE".
pub fn format_move(raw_amount: &str) -> Result<String> {
    Ok(format!("{} MOVE", format_fixed_point(raw_amount, MOVE_DECIMALS)?))
}

/// Total gas cost `gas_used * gas_unit_price` in MOVE units (no suffix).
///
/// The product of two u64 always fits in u128.
/// Example: (1000, 100) -> "0.001"
pub fn format_gas_cost(gas_used: u64, gas_unit_price: u64) -> String {
    let total = gas_used as u128 * gas_unit_price as u128;
    fixed_point_digits(&total.to_string(), MOVE_DECIMALS as usize)
}

/// Module and function halves of an entry function id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFunctionRef {
    /// `address::module`
    pub module: String,
    pub function: String,
}

/// Split `0x1::coin::transfer` into module and function.
///
/// Returns `None` for fewer than three `::` parts; anything past the third
/// part (generic instantiations glued on by some indexers) is ignored.
pub fn parse_entry_function_id(id: Option<&str>) -> Option<EntryFunctionRef> {
    let id = id?;
    if id.is_empty() {
        return None;
    }
    let parts: Vec<&str> = id.split("::").collect();
    if parts.len() < 3 {
        return None;
    }
    Some(EntryFunctionRef {
        module: format!("{}::{}", parts[0], parts[1]),
        function: parts[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_long_address() {
        let addr = format!("0x{}", "a".repeat(64));
        assert_eq!(truncate_address(&addr, 6, 4), "0xaaaa...aaaa");
        assert_eq!(truncate_address_default(&addr), "0xaaaa...aaaa");
    }

    #[test]
    fn test_truncate_short_address() {
        assert_eq!(truncate_address("0x12", 6, 4), "0x12");
        assert_eq!(truncate_address("", 6, 4), "");
        // exactly head + tail + 3 stays as is
        assert_eq!(truncate_address("0123456789abc", 6, 4), "0123456789abc");
        assert_eq!(truncate_address("0123456789abcd", 6, 4), "012345...abcd");
    }

    #[test]
    fn test_fixed_point() {
        assert_eq!(format_fixed_point("123456789", 8).unwrap(), "1.2345");
        assert_eq!(format_fixed_point("100000000", 8).unwrap(), "1");
        assert_eq!(format_fixed_point("0", 8).unwrap(), "0");
        assert_eq!(format_fixed_point("5", 8).unwrap(), "0");
        assert_eq!(format_fixed_point("50000", 8).unwrap(), "0.0005");
        assert_eq!(format_fixed_point("120000000", 8).unwrap(), "1.2");
        assert_eq!(format_fixed_point("1234", 0).unwrap(), "1,234");
    }

    #[test]
    fn test_fixed_point_groups_large_values() {
        assert_eq!(
            format_fixed_point("123456789012345678901234567890", 8).unwrap(),
            "1,234,567,890,123,456,789,012.3456"
        );
        assert_eq!(format_fixed_point("000100000000", 8).unwrap(), "1");
    }

    #[test]
    fn test_fixed_point_rejects_garbage() {
        assert!(format_fixed_point("", 8).is_err());
        assert!(format_fixed_point("-1", 8).is_err());
        assert!(format_fixed_point("1.5", 8).is_err());
    }

    #[test]
    fn test_gas_cost() {
        assert_eq!(format_gas_cost(1000, 100), "0.001");
        assert_eq!(format_gas_cost(1000, 100), format_fixed_point("100000", 8).unwrap());
        assert!(format_gas_cost(u64::MAX, u64::MAX).len() > 20);
        assert_eq!(format_move("250000000").unwrap(), "2.5 MOVE");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("123456"), "123,456");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }

    #[test]
    fn test_entry_function_id() {
        assert_eq!(
            parse_entry_function_id(Some("0x1::coin::transfer")),
            Some(EntryFunctionRef {
                module: "0x1::coin".to_string(),
                function: "transfer".to_string(),
            })
        );
        assert_eq!(parse_entry_function_id(Some("bad")), None);
        assert_eq!(parse_entry_function_id(Some("0x1::coin")), None);
        assert_eq!(parse_entry_function_id(None), None);
        let extra = parse_entry_function_id(Some("0x1::a::b::c")).unwrap();
        assert_eq!(extra.function, "b");
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time_at("2024-05-10T11:59:30", now), "30s ago");
        assert_eq!(format_relative_time_at("2024-05-10T11:15:00", now), "45m ago");
        assert_eq!(format_relative_time_at("2024-05-10T02:00:00Z", now), "10h ago");
        assert_eq!(format_relative_time_at("2024-05-01T12:00:00.123456", now), "8d ago");
    }

    #[test]
    fn test_relative_time_old_and_future() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let old = format_relative_time_at("2024-01-01T00:00:00", now);
        assert!(!old.ends_with("ago"));
        assert_eq!(format_relative_time_at("2024-05-10T12:00:05", now), "-5s ago");
        assert_eq!(format_relative_time_at("yesterday", now), "yesterday");
    }
}
