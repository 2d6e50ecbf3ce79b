//! Small field checks shared by the services.

use validator::{ValidateEmail, ValidateUrl};

use crate::error::ValidationErrors;

pub(crate) fn required(errors: &mut ValidationErrors, field: &str, value: &str, message: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, message);
        return false;
    }
    true
}

pub(crate) fn max_chars(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("May not be greater than {max} characters."));
    }
}

pub(crate) fn url(errors: &mut ValidationErrors, field: &str, value: Option<&String>, message: &str) {
    if let Some(value) = value {
        if !value.validate_url() {
            errors.add(field, message);
        }
    }
}

pub(crate) fn email(errors: &mut ValidationErrors, field: &str, value: &String) {
    if !value.validate_email() {
        errors.add(field, "Please provide a valid email address.");
    }
}

/// `#rrggbb` hex colour.
pub(crate) fn hex_color(errors: &mut ValidationErrors, field: &str, value: &str) {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        errors.add(field, "Color must be a hex value like #3b82f6.");
    }
}

/// Trim and drop empty optional text.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
