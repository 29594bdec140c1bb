//! Phone number normalization (spec.md §6.1 Design Notes, supplemented from
//! the original `backend/schemas.py::normalize_phone`).

use crate::error::CoreError;

/// Normalizes a phone number to a loose E.164 form: strips spaces, dashes
/// and parentheses, rewrites a leading `00` to `+`, then requires 10..=15
/// digits (with an optional leading `+` preserved).
///
/// # Errors
/// Returns `CoreError::InvalidPhone` if the input is empty, contains
/// non-digit characters after stripping, or the digit count falls outside
/// 10..=15.
pub fn normalize_phone(phone_input: &str) -> Result<String, CoreError> {
    let trimmed = phone_input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidPhone("phone is required".to_owned()));
    }

    let stripped: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let rewritten = if let Some(rest) = stripped.strip_prefix("00") {
        format!("+{rest}")
    } else {
        stripped
    };

    if let Some(digits) = rewritten.strip_prefix('+') {
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidPhone(phone_input.to_owned()));
        }
        if !(10..=15).contains(&digits.len()) {
            return Err(CoreError::InvalidPhone(phone_input.to_owned()));
        }
        return Ok(format!("+{digits}"));
    }

    if rewritten.is_empty() || !rewritten.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::InvalidPhone(phone_input.to_owned()));
    }
    if !(10..=15).contains(&rewritten.len()) {
        return Err(CoreError::InvalidPhone(phone_input.to_owned()));
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::normalize_phone;

    #[test]
    fn strips_separators_and_accepts_plain_digits() {
        assert_eq!(normalize_phone("(555) 123-4567"), Ok("5551234567".to_owned()));
    }

    #[test]
    fn rewrites_leading_00_to_plus() {
        assert_eq!(normalize_phone("0049 151 2345678"), Ok("+491512345678".to_owned()));
    }

    #[test]
    fn keeps_leading_plus() {
        assert_eq!(normalize_phone("+14155552671"), Ok("+14155552671".to_owned()));
    }

    #[test]
    fn rejects_empty() {
        assert!(normalize_phone("   ").is_err());
    }

    #[test]
    fn rejects_non_digits() {
        assert!(normalize_phone("555-CALL-NOW").is_err());
    }

    #[test]
    fn rejects_too_short() {
        assert!(normalize_phone("12345").is_err());
    }

    #[test]
    fn rejects_too_long() {
        assert!(normalize_phone("+1234567890123456").is_err());
    }
}
