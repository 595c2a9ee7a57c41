/// Whole-dollar USD amount with thousands separators, e.g. `$1,234`.
pub fn format_currency(amount: f64) -> String {
    let digits = group_thousands(&format!("{:.0}", amount.abs().round()));
    if amount < 0.0 {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

/// Thousands separators and at most three fraction digits, trailing zeros
/// dropped. Halves round away from zero.
pub fn format_number(n: f64) -> String {
    let fixed = format!("{:.3}", (n.abs() * 1000.0).round() / 1000.0);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    if n < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Whole-percent change from `previous` to `current`. With no previous
/// value this is 100 for any growth and 0 otherwise. Halves round up.
pub fn percent_change(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }
    let ratio = (current - previous) / previous * 100.0;
    (ratio + 0.5).floor() as i64
}

/// `"2m 5s"` from a minute up, `"45s"` below.
pub fn format_session_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds >= 60.0 {
        let minutes = (seconds / 60.0).floor();
        format!("{}m {}s", minutes, format_number(seconds % 60.0))
    } else {
        format!("{}s", format_number(seconds))
    }
}

pub fn format_multiplier(multiplier: f64) -> String {
    format!("{multiplier:.1}x")
}
