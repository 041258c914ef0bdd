/// Input validators for request payloads
/// Features:
/// 1. DoS Protection: Input length limits
/// 2. Email format validation
/// 3. Order line and review content checks
///
/// Validators return the normalized (trimmed) value so handlers store exactly
/// what was checked.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;
const MIN_REVIEW_MESSAGE_LENGTH: usize = 3;
const MAX_REVIEW_MESSAGE_LENGTH: usize = 2000;
const MAX_TITLE_LENGTH: usize = 512;
const MIN_RATING: i32 = 1;
const MAX_RATING: i32 = 5;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

fn field(name: &str) -> String {
    name.to_string()
}

/// Validates email address
/// - Checks format using RFC 5322 simplified regex
/// - Verifies length constraints
///
/// Case is preserved; lookups are case-sensitive.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field("email")));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort(field("email"), MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong(field("email"), MAX_EMAIL_LENGTH));
    }

    // local part over 64 chars is not deliverable
    let local_too_long = trimmed.split('@').next().map_or(false, |local| local.len() > 64);
    if local_too_long || !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat(field("email")));
    }

    Ok(trimmed.to_string())
}

/// Validates a display name: non-empty once trimmed, bounded, no control characters
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field("name")));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field("name"), MAX_NAME_LENGTH));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat(field("name")));
    }

    Ok(trimmed.to_string())
}

/// Passwords are checked for length only and are never trimmed
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if length == 0 {
        return Err(ValidationError::EmptyField(field("password")));
    }
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(field("password"), MIN_PASSWORD_LENGTH));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(field("password"), MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

pub fn validate_rating(rating: i32) -> Result<i32, ValidationError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(ValidationError::OutOfRange(field("rating")))
    }
}

pub fn validate_review_message(message: &str) -> Result<String, ValidationError> {
    let trimmed = message.trim();
    let length = trimmed.chars().count();

    if length == 0 {
        return Err(ValidationError::EmptyField(field("message")));
    }
    if length < MIN_REVIEW_MESSAGE_LENGTH {
        return Err(ValidationError::TooShort(field("message"), MIN_REVIEW_MESSAGE_LENGTH));
    }
    if length > MAX_REVIEW_MESSAGE_LENGTH {
        return Err(ValidationError::TooLong(field("message"), MAX_REVIEW_MESSAGE_LENGTH));
    }

    Ok(trimmed.to_string())
}

/// Checks one order line. Prices are client-supplied and only sanity-checked,
/// there is no catalog to compare against.
pub fn validate_order_item(title: &str, price: f64, quantity: i32) -> Result<String, ValidationError> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field("title")));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong(field("title"), MAX_TITLE_LENGTH));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::OutOfRange(field("price")));
    }
    if quantity < 1 {
        return Err(ValidationError::OutOfRange(field("quantity")));
    }

    Ok(trimmed.to_string())
}
