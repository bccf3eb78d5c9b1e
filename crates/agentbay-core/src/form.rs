// Validation errors shared by every form in the storefront.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be a number, got `{value}`")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("bid must be at least {minimum}")]
    BelowMinimum { minimum: String },

    #[error("enter a valid email address")]
    InvalidEmail,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("you must agree to the Terms of Service and Privacy Policy")]
    TermsNotAccepted,

    #[error("unknown category `{0}`")]
    UnknownCategory(String),

    #[error("{0}")]
    Invalid(String),
}

/// Trimmed value, or `None` when blank.
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Parse a typed dollar amount. Accepts a leading `$`.
pub(crate) fn parse_amount(field: &'static str, raw: &str) -> Result<f64, FormError> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    let value: f64 = cleaned.parse().map_err(|_| FormError::NotANumber {
        field,
        value: raw.trim().to_string(),
    })?;
    if !value.is_finite() {
        return Err(FormError::NotANumber {
            field,
            value: raw.trim().to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_accepts_dollar_sign_and_commas() {
        assert_eq!(parse_amount("amount", "$1,250.50"), Ok(1250.5));
        assert_eq!(parse_amount("amount", " 12 "), Ok(12.0));
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert!(matches!(
            parse_amount("amount", "twelve"),
            Err(FormError::NotANumber { field: "amount", .. })
        ));
        assert!(parse_amount("amount", "inf").is_err());
    }

    #[test]
    fn missing_fields_message_matches_dialog_text() {
        assert_eq!(FormError::MissingFields.to_string(), "Please fill in all fields");
    }
}
