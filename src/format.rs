//! Number formatting for insight descriptions and table cells.

/// Format a USD amount with an `M`/`K` suffix: `$1.25M`, `$3.40K`, `$12.00`.
///
/// The suffix is picked after rounding, so `999_999.0` renders as `$1.00M`.
pub fn format_currency(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    let (scaled, suffix) = if round_cents(abs / 1_000.0) >= 1_000.0 {
        (abs / 1_000_000.0, "M")
    } else if round_cents(abs) >= 1_000.0 {
        (abs / 1_000.0, "K")
    } else {
        (abs, "")
    };
    format!("{}${:.2}{}", sign, scaled, suffix)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a fraction as a percentage with one decimal: `0.4001` -> `"40.0%"`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Like [`format_percent`] with an explicit sign: `0.052` -> `"+5.2%"`.
pub fn format_signed_percent(fraction: f64) -> String {
    let pct = fraction * 100.0;
    if pct >= 0.0 {
        format!("+{:.1}%", pct)
    } else {
        format!("{:.1}%", pct)
    }
}

/// Format a count with thousands separators: `12345` -> `"12,345"`.
pub fn format_count(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
