//! Raw capture-log adapters
//!
//! This module provides adapters that parse the raw capture logs and map them
//! to typed rows. All structural errors (missing columns, malformed rows,
//! unparsable timestamps) surface at this boundary; nothing downstream sees
//! raw text or sentinel values.

mod biometric;
mod interaction;
mod recorder;

pub use biometric::{BiometricLogAdapter, RawBiometricRow};
pub use interaction::{InteractionLogAdapter, RawInteractionRow};
pub use recorder::{PointerEvent, RawInputRecorder, RecorderLogAdapter};

/// Split one delimited line into fields, honoring double-quoted fields.
///
/// Quoted fields may contain the delimiter; doubled quotes inside a quoted
/// field unescape to a single quote.
pub(crate) fn split_delimited(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(current.trim().to_string());
            current = String::new();
        } else {
            current.push(c);
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Normalize a header cell for lookup: lowercase, alphanumerics only.
pub(crate) fn normalize_header(cell: &str) -> String {
    cell.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Locate a column by normalized name.
///
/// A header cell matches when its normalized form equals the key or ends with
/// it (tolerates vendor prefixes such as `ET_GazeRightX` for `gazerightx`).
pub(crate) fn find_column(headers: &[String], key: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| {
            let normalized = normalize_header(h);
            normalized == key || normalized.ends_with(key)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_delimited_plain() {
        let fields = split_delimited("a,b,c", ',');
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_delimited_quoted_comma() {
        let fields = split_delimited(r#"2024-01-15,"https://example.com/search?q=a,b",42"#, ',');
        assert_eq!(fields[1], "https://example.com/search?q=a,b");
        assert_eq!(fields[2], "42");
    }

    #[test]
    fn test_split_delimited_escaped_quote() {
        let fields = split_delimited(r#""say ""hi""",x"#, ',');
        assert_eq!(fields[0], r#"say "hi""#);
    }

    #[test]
    fn test_find_column_with_vendor_prefix() {
        let headers = vec![
            "Timestamp".to_string(),
            "ET_GazeRightX".to_string(),
            "Scroll Percentage".to_string(),
        ];
        assert_eq!(find_column(&headers, "gazerightx"), Some(1));
        assert_eq!(find_column(&headers, "scrollpercentage"), Some(2));
        assert_eq!(find_column(&headers, "gazelefty"), None);
    }
}
