use std::collections::HashMap;

use chrono::{Datelike, Utc};

use crate::error::ApiError;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_SHORT_TEXT_LEN: usize = 200;
pub const MAX_LONG_TEXT_LEN: usize = 4000;
pub const EARLIEST_BATCH_YEAR: i32 = 1900;
/// Students may register before graduating
pub const BATCH_YEAR_LOOKAHEAD: i32 = 6;

/// Collects per-field problems and turns them into one validation error
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn check(&mut self, field: &str, ok: bool, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Length limit for an optional text value (counted in chars)
    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.add(field, format!("Must be at most {} characters", max));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.errors)))
        }
    }
}

/// Basic structural email check; deliverability is not verified
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub fn is_valid_batch_year(year: i32) -> bool {
    let latest = Utc::now().year() + BATCH_YEAR_LOOKAHEAD;
    (EARLIEST_BATCH_YEAR..=latest).contains(&year)
}

pub fn is_valid_http_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Trim an optional string, mapping blank input to `None`
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.org"));
        assert!(is_valid_email("first.last+tag@dept.uni.edu"));
        assert!(!is_valid_email("no-at-sign.example.org"));
        assert!(!is_valid_email("@example.org"));
        assert!(!is_valid_email("ada@localhost"));
        assert!(!is_valid_email("ada@example..org"));
        assert!(!is_valid_email("ada lovelace@example.org"));
        assert!(!is_valid_email("a@b@example.org"));
    }

    #[test]
    fn batch_year_bounds() {
        let this_year = Utc::now().year();
        assert!(is_valid_batch_year(this_year));
        assert!(is_valid_batch_year(this_year + BATCH_YEAR_LOOKAHEAD));
        assert!(!is_valid_batch_year(this_year + BATCH_YEAR_LOOKAHEAD + 1));
        assert!(!is_valid_batch_year(1899));
    }

    #[test]
    fn urls_must_be_http() {
        assert!(is_valid_http_url("https://www.linkedin.com/in/someone"));
        assert!(!is_valid_http_url("javascript:alert(1)"));
        assert!(!is_valid_http_url("not a url"));
    }

    #[test]
    fn field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.check("name", false, "Name is required");
        errors.add("name", "second message");
        errors.max_len("bio", Some("abcdef"), 3);
        errors.max_len("headline", None, 3);

        let err = errors.into_result().unwrap_err();
        let body = err.to_json();
        assert_eq!(body["field_errors"]["name"], "Name is required");
        assert_eq!(body["field_errors"]["bio"], "Must be at most 3 characters");
        assert!(body["field_errors"].get("headline").is_none());
    }

    #[test]
    fn blank_optionals_become_none() {
        assert_eq!(clean_optional(Some("  ".into())), None);
        assert_eq!(clean_optional(Some(" Acme ".into())), Some("Acme".into()));
        assert_eq!(clean_optional(None), None);
    }
}
