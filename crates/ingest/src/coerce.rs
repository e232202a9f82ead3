//! Cell type coercion at the ingestion boundary.

use cac_core::FieldValue;

/// True for an optional sign, at least one digit, and an optional
/// fractional part: `12`, `-3.5`, `+0.25`, `.5`.
pub fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };
    let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    match frac_part {
        Some(f) => digits(int_part) && digits(f) && !(int_part.is_empty() && f.is_empty()),
        None => !int_part.is_empty() && digits(int_part),
    }
}

/// Convert a trimmed cell to a number when it matches the numeric pattern;
/// other non-empty cells stay text. Empty cells yield `None`.
pub fn coerce_cell(raw: &str) -> Option<FieldValue> {
    let cell = raw.trim();
    if cell.is_empty() {
        return None;
    }
    if looks_numeric(cell) {
        if let Ok(n) = cell.parse::<f64>() {
            return Some(FieldValue::Number(n));
        }
    }
    Some(FieldValue::Text(cell.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_pattern() {
        for s in ["0", "12", "-3.5", "+0.25", ".5", "7."] {
            assert!(looks_numeric(s), "{s} should be numeric");
        }
        for s in ["", ".", "-", "1e5", "1,000", "$12", "2024-01-01", "12abc", "NaN"] {
            assert!(!looks_numeric(s), "{s} should not be numeric");
        }
    }

    #[test]
    fn test_coerce_cell() {
        assert_eq!(coerce_cell(" 42 "), Some(FieldValue::Number(42.0)));
        assert_eq!(coerce_cell("$1,000"), Some(FieldValue::Text("$1,000".into())));
        assert_eq!(coerce_cell("   "), None);
    }
}
