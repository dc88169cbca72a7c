//! Reusable field validators
//!
//! Used through `#[validate(custom(function = "..."))]` on request payloads.

use std::borrow::Cow;
use validator::ValidationError;

/// Validator: string has at least one non-whitespace character
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message(Cow::Borrowed("must not be empty")))
    } else {
        Ok(())
    }
}

/// Validator: amount is a finite number and not negative
pub fn valid_amount(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        Err(ValidationError::new("not_finite").with_message(Cow::Borrowed("must be a finite number")))
    } else if value < 0.0 {
        Err(ValidationError::new("negative").with_message(Cow::Borrowed("must not be negative")))
    } else {
        Ok(())
    }
}
