//! Utilities for output naming, size display and numeric input parsing.

#[cfg(test)]
pub(crate) mod fixtures;

/// File extension appended to output names.
pub const PDF_EXTENSION: &str = ".pdf";

/// Append the `.pdf` extension unless `name` already ends with it.
///
/// The check is case-sensitive: `"Report.PDF"` becomes `"Report.PDF.pdf"`.
pub fn ensure_pdf_extension(name: &str) -> String {
    if name.ends_with(PDF_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{PDF_EXTENSION}")
    }
}

/// Format a byte count for display, e.g. `"1.5 MB"`.
///
/// Uses base 1024 and at most two decimals with trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", UNITS[unit])
}

/// Parse the leading integer of `text` the way form inputs are read.
///
/// Leading whitespace and one sign are accepted, then as many digits as
/// follow; anything after the digits is ignored. Returns `None` when no
/// digit is found. Values beyond `i64` saturate.
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits: &str = {
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        &digits[..end]
    };
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.bytes().fold(0i64, |acc, digit| {
        acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}
