//! Input validation utilities.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::UserError;

static LOGIN_ID_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").ok());
static EMAIL_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());
static PHONE_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^0\d{1,2}-?\d{3,4}-?\d{4}$").ok());
static BUSINESS_NUMBER_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\d{3}-?\d{2}-?\d{5}$").ok());
static URL_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").ok());

fn is_match(regex: &Lazy<Option<Regex>>, value: &str) -> Result<bool, UserError> {
    regex
        .as_ref()
        .map(|regex| regex.is_match(value))
        .ok_or_else(|| UserError::validation("Invalid validation pattern"))
}

/// Login ids become the local part of the account email.
pub fn validate_login_id(login_id: &str) -> Result<(), UserError> {
    if login_id.len() < 4 {
        return Err(UserError::validation("Login id must be at least 4 characters long"));
    }

    if login_id.len() > 20 {
        return Err(UserError::validation("Login id must be at most 20 characters long"));
    }

    if !is_match(&LOGIN_ID_REGEX, login_id)? {
        return Err(UserError::validation(
            "Login id can only contain letters, numbers, dots, underscores, and hyphens",
        ));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), UserError> {
    if password.len() < 6 {
        return Err(UserError::validation("Password must be at least 6 characters long"));
    }

    if password.len() > 128 {
        return Err(UserError::validation("Password must be less than 128 characters long"));
    }

    if !password.chars().any(|c| c.is_alphabetic()) || !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(UserError::validation("Password must contain a letter and a digit"));
    }

    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), UserError> {
    if name.trim().is_empty() {
        return Err(UserError::validation("Name cannot be empty"));
    }

    if name.chars().count() > 50 {
        return Err(UserError::validation("Name must be at most 50 characters long"));
    }

    if name.chars().any(|c| matches!(c, '\n' | '\r' | '\t' | '\0')) {
        return Err(UserError::validation("Name contains invalid characters"));
    }

    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), UserError> {
    if !is_match(&PHONE_REGEX, phone)? {
        return Err(UserError::validation("Invalid phone number format"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), UserError> {
    if email.len() > 255 {
        return Err(UserError::validation("Email too long"));
    }

    if !is_match(&EMAIL_REGEX, email)? {
        return Err(UserError::validation("Invalid email format"));
    }

    Ok(())
}

pub fn validate_business_number(number: &str) -> Result<(), UserError> {
    if !is_match(&BUSINESS_NUMBER_REGEX, number)? {
        return Err(UserError::validation("Invalid business registration number"));
    }
    Ok(())
}

/// Photo and attachment references.
pub fn validate_url(url: &str) -> Result<(), UserError> {
    if url.len() > 2048 {
        return Err(UserError::validation("URL too long"));
    }

    if !is_match(&URL_REGEX, url)? {
        return Err(UserError::validation("Invalid URL format"));
    }

    Ok(())
}

/// Validate a required free-text field such as a title or an address.
pub fn validate_text(field: &str, value: &str, max_chars: usize) -> Result<(), UserError> {
    if value.trim().is_empty() {
        return Err(UserError::validation(format!("{field} cannot be empty")));
    }

    if value.chars().count() > max_chars {
        return Err(UserError::validation(format!(
            "{field} must be at most {max_chars} characters long"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_id_validation() {
        assert!(validate_login_id("alice").is_ok());
        assert!(validate_login_id("kim.cleaner_01").is_ok());
        assert!(validate_login_id("abc").is_err());
        assert!(validate_login_id("_alice").is_err());
        assert!(validate_login_id("alice@home").is_err());
        assert!(validate_login_id(&"a".repeat(21)).is_err());
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("clean1").is_ok());
        assert!(validate_password("abc12").is_err());
        assert!(validate_password("password").is_err());
        assert!(validate_password("12345678").is_err());
    }

    #[test]
    fn test_contact_validation() {
        assert!(validate_phone("010-1234-5678").is_ok());
        assert!(validate_phone("01012345678").is_ok());
        assert!(validate_phone("02-123-4567").is_ok());
        assert!(validate_phone("12345").is_err());

        assert!(validate_email("kim@example.co.kr").is_ok());
        assert!(validate_email("not-an-email").is_err());

        assert!(validate_business_number("123-45-67890").is_ok());
        assert!(validate_business_number("1234567890").is_ok());
        assert!(validate_business_number("12-345-67890").is_err());
    }

    #[test]
    fn test_name_and_text_validation() {
        assert!(validate_name("김청소").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("line\nbreak").is_err());

        assert!(validate_text("Title", "Lobby", 10).is_ok());
        assert!(validate_text("Title", "", 10).is_err());
        assert!(validate_text("Title", "x".repeat(11).as_str(), 10).is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_url("https://cdn.example.com/jobs/1/before/a.jpg").is_ok());
        assert!(validate_url("ftp://example.com/a.jpg").is_err());
        assert!(validate_url("").is_err());
    }
}
