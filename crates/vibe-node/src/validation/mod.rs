//! # Input Validation Module
//!
//! Field checks for API request bodies. Request types implement
//! [`validator::Validate`] by calling the functions below, and failures are
//! rendered as a 422 [`ValidationErrorResponse`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vibe_node::validation::validate_username;
//!
//! if let Err(e) = validate_username("alice") {
//!     println!("Invalid username: {}", e);
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::{ValidateUrl, ValidationError, ValidationErrors};

/// Usernames start with a letter or number, then letters, numbers, `.`, `_` or `-`.
pub static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*$").expect("Invalid regex"));

/// Maximum lengths for various fields.
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;
pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_STATUS_LENGTH: usize = 256;
pub const MAX_MESSAGE_LENGTH: usize = 65536;
pub const MAX_CAPTION_LENGTH: usize = 1024;

/// Validation error response.
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    /// Error type.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Field-level error details.
    pub details: Vec<FieldError>,
}

/// Field-level validation error.
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(self)).into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    code: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation failed for field '{}'", field)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ValidationErrorResponse {
            error: "validation_error".to_string(),
            message: "Validation failed".to_string(),
            details,
        }
    }
}

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Collects field checks into a [`ValidationErrors`] set.
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: ValidationErrors,
}

impl FieldChecks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one field check.
    pub fn check(mut self, field: &'static str, result: Result<(), ValidationError>) -> Self {
        if let Err(e) = result {
            self.errors.add(field, e);
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Validate a username.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(error("length", "Username cannot be empty".into()));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(error(
            "length",
            format!("Username must be at most {} characters", MAX_USERNAME_LENGTH),
        ));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(error(
            "pattern",
            "Username must start with a letter or number and contain only letters, numbers, dots, hyphens, and underscores".into(),
        ));
    }

    Ok(())
}

/// Validate a required free-text field with an upper length bound.
pub fn validate_text(
    name: &str,
    value: &str,
    max_len: usize,
    allow_empty: bool,
) -> Result<(), ValidationError> {
    if !allow_empty && value.trim().is_empty() {
        return Err(error("length", format!("{} cannot be empty", name)));
    }

    if value.chars().count() > max_len {
        return Err(error(
            "length",
            format!("{} must be at most {} characters", name, max_len),
        ));
    }

    Ok(())
}

/// Validate an optional http(s) URL such as an avatar link.
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.len() > MAX_URL_LENGTH {
        return Err(error(
            "length",
            format!("URL must be at most {} characters", MAX_URL_LENGTH),
        ));
    }

    if !url.validate_url() || !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(error("url", "Must be an http or https URL".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("alice.smith").is_ok());
        assert!(validate_username("bob_42").is_ok());
        assert!(validate_username("a").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("-alice").is_err());
        assert!(validate_username("alice smith").is_err());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_text() {
        assert!(validate_text("Content", "hi", 10, false).is_ok());
        assert!(validate_text("Content", "", 10, true).is_ok());

        assert!(validate_text("Content", "   ", 10, false).is_err());
        assert!(validate_text("Content", "too long text", 5, false).is_err());
        // Multi-byte characters count once.
        assert!(validate_text("Content", "ééééé", 5, false).is_ok());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a.png").is_ok());
        assert!(validate_url("http://localhost:8000/x").is_ok());

        assert!(validate_url("not a url").is_err());
        assert!(validate_url("ftp://example.com/file").is_err());
    }

    #[test]
    fn test_field_checks_collect_errors() {
        let result = FieldChecks::new()
            .check("username", validate_username(""))
            .check("display_name", validate_text("Display name", "ok", 10, false))
            .check("status", validate_text("Status", "", 10, false))
            .finish();

        let response = ValidationErrorResponse::from(result.unwrap_err());
        let fields: Vec<_> = response.details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["status", "username"]);
        assert_eq!(response.error, "validation_error");
    }
}
