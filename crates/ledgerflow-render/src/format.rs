//! Number and text formatting shared by the SVG surface and the label renderer.

use ledgerflow_core::Unit;

/// Attribute number formatting: whole numbers print without a fraction, float noise is dropped.
pub fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }

    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

/// Path command formatting with at most 3 fractional digits.
pub fn fmt_path(v: f64) -> String {
    if !v.is_finite() || v.abs() < 0.0005 {
        return "0".to_string();
    }

    let r = (v * 1000.0 + 0.5).floor() / 1000.0;
    let mut s = format!("{r:.3}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" { "0".to_string() } else { s }
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// `1234567.25` with `Unit::Millions` and prefix `$` becomes `$1,234,567.3M`.
pub fn format_value(value: f64, unit: Unit, prefix: &str, suffix: &str) -> String {
    let tenths = (value.abs() * 10.0).round() as u64;
    let (int, frac) = (tenths / 10, tenths % 10);

    let digits = int.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if frac > 0 {
        grouped.push('.');
        grouped.push_str(&frac.to_string());
    }

    let sign = if value < 0.0 && tenths > 0 { "-" } else { "" };
    format!("{sign}{prefix}{grouped}{}{suffix}", unit.suffix())
}

pub fn format_percent(pct: f64) -> String {
    format!("{:.1}%", if pct.is_finite() { pct } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_numbers_drop_noise() {
        assert_eq!(fmt(10.0), "10");
        assert_eq!(fmt(-0.0), "0");
        assert_eq!(fmt(2.5), "2.5");
        assert_eq!(fmt(3.0000000001), "3");
        assert_eq!(fmt_path(1.23456), "1.235");
        assert_eq!(fmt_path(7.1), "7.1");
        assert_eq!(fmt_path(f64::NAN), "0");
    }

    #[test]
    fn values_are_grouped_with_unit_suffix() {
        assert_eq!(format_value(1000.0, Unit::Units, "$", ""), "$1,000");
        assert_eq!(format_value(1234567.25, Unit::Millions, "$", ""), "$1,234,567.3M");
        assert_eq!(format_value(12.0, Unit::Billions, "", " USD"), "12B USD");
        assert_eq!(format_value(-950.0, Unit::Thousands, "$", ""), "-$950K");
        assert_eq!(format_percent(60.0), "60.0%");
    }

    #[test]
    fn xml_is_escaped() {
        assert_eq!(escape_xml(r#"Taxes & "Other""#), "Taxes &amp; &quot;Other&quot;");
    }
}
