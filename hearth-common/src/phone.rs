//! Phone number validation
//!
//! Numbers are stored in E.164 form: a leading `+` followed by up to 15 digits.
//! Spaces, dashes, dots and parentheses are accepted on input and stripped.

use crate::{Error, Result};

/// Marker every stored number must begin with
pub const INTERNATIONAL_PREFIX: char = '+';

const MAX_DIGITS: usize = 15;

/// Validate and normalize an optional phone number
///
/// Blank input clears the number (`Ok(None)`).
pub fn normalize_phone(input: &str) -> Result<Option<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let Some(rest) = trimmed.strip_prefix(INTERNATIONAL_PREFIX) else {
        return Err(Error::InvalidInput(
            "Phone number must start with + and country code (e.g., +1234567890)".to_string(),
        ));
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => {
                return Err(Error::InvalidInput(format!(
                    "Phone number contains invalid character '{}'",
                    c
                )))
            }
        }
    }

    if digits.is_empty() || digits.len() > MAX_DIGITS {
        return Err(Error::InvalidInput(format!(
            "Phone number must have between 1 and {} digits",
            MAX_DIGITS
        )));
    }

    Ok(Some(format!("{}{}", INTERNATIONAL_PREFIX, digits)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_e164() {
        assert_eq!(
            normalize_phone("+15551234567").unwrap(),
            Some("+15551234567".to_string())
        );
    }

    #[test]
    fn test_strips_formatting() {
        assert_eq!(
            normalize_phone(" +1 (555) 123-4567 ").unwrap(),
            Some("+15551234567".to_string())
        );
    }

    #[test]
    fn test_blank_clears() {
        assert_eq!(normalize_phone("").unwrap(), None);
        assert_eq!(normalize_phone("   ").unwrap(), None);
    }

    #[test]
    fn test_missing_prefix_rejected() {
        assert!(normalize_phone("5551234567").is_err());
        assert!(normalize_phone("0044 20 7946 0000").is_err());
    }

    #[test]
    fn test_letters_rejected() {
        assert!(normalize_phone("+1555CALLNOW").is_err());
    }

    #[test]
    fn test_length_bounds() {
        assert!(normalize_phone("+").is_err());
        assert!(normalize_phone("+1234567890123456").is_err());
        assert!(normalize_phone("+123456789012345").is_ok());
    }
}
