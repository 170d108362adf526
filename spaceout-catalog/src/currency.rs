//! Display helpers. Nothing here feeds back into stored amounts.

/// Minor units per base-currency unit.
pub const MINOR_PER_UNIT: i64 = 100;

/// Base-currency units per Nitcoin (1 unit = 0.01 NTC).
pub const UNITS_PER_NTC: i64 = 100;

/// `48_200_890_000` minor -> `"4820089.00 NTC"`.
pub fn format_ntc(amount_minor: i64) -> String {
    // hundredths of an NTC
    let cents = round_div(amount_minor, MINOR_PER_UNIT * UNITS_PER_NTC / 100);
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}{}.{:02} NTC", sign, cents / 100, cents % 100)
}

/// Base currency rounded to whole units with Indian digit grouping,
/// e.g. `₹48,20,08,900`.
pub fn format_base(amount_minor: i64) -> String {
    let units = round_div(amount_minor, MINOR_PER_UNIT);
    let sign = if units < 0 { "-" } else { "" };
    format!("{}₹{}", sign, group_indian(units.unsigned_abs()))
}

fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Integer division rounding halves away from zero. Defined for every
/// `i64`, including the extremes.
fn round_div(value: i64, divisor: i64) -> i64 {
    let quotient = value / divisor;
    let remainder = (value % divisor).unsigned_abs();
    if remainder * 2 >= divisor.unsigned_abs() {
        quotient + value.signum()
    } else {
        quotient
    }
}
