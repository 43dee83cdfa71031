use crate::domain::Phone;

/// Coerce raw phone text to a number.
///
/// Apostrophes (spreadsheet text markers) are removed and surrounding
/// whitespace trimmed before parsing. Anything that does not parse to a
/// finite number is `None`.
pub fn parse_phone(raw: &str) -> Option<Phone> {
    let cleaned = raw.replace('\'', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().and_then(Phone::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_quoted_numbers_parse() {
        assert_eq!(parse_phone("15551234567").map(|p| p.value()), Some(15551234567.0));
        assert_eq!(parse_phone("'15551234567").map(|p| p.value()), Some(15551234567.0));
        assert_eq!(parse_phone(" +4930123456 ").map(|p| p.value()), Some(4930123456.0));
        assert_eq!(parse_phone("5551234.0").map(|p| p.value()), Some(5551234.0));
    }

    #[test]
    fn test_formatted_numbers_are_rejected() {
        assert!(parse_phone("+1 (555) 123-4567").is_none());
        assert!(parse_phone("call us").is_none());
        assert!(parse_phone("''").is_none());
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        assert!(parse_phone("nan").is_none());
        assert!(parse_phone("inf").is_none());
    }
}
