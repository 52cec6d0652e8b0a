/// Formats a number for labels and categorical values: integers without a
/// fractional part, everything else with at most two decimals and no trailing zeros.
pub fn fmt_number(v: f64) -> String {
    fmt_number_to(v, 2)
}

/// Like [`fmt_number`] with up to `max_decimals` decimals.
pub fn fmt_number_to(v: f64, max_decimals: usize) -> String {
    if !v.is_finite() {
        return "—".to_owned();
    }
    if v == 0.0 {
        return "0".to_owned();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        return format!("{v:.0}");
    }
    let text = format!("{v:.max_decimals$}");
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };
    if text == "-0" {
        "0".to_owned()
    } else {
        text.to_owned()
    }
}
