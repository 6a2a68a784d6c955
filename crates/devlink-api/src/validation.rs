use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use devlink_types::api::ErrorDetail;

use crate::error::ApiError;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").expect("email pattern is valid")
});

static GITHUB_LOGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$").expect("login pattern is valid")
});

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

/// GitHub logins: ASCII alphanumerics and hyphens, at most 39 characters.
pub fn is_github_login(value: &str) -> bool {
    GITHUB_LOGIN.is_match(value)
}

/// Path ids that do not parse are reported the same way as unknown ones.
pub fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found(not_found))
}

/// Collects per-field failures so a request reports all of them at once.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<ErrorDetail>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &str, value: &str, msg: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, msg);
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str, msg: &str) -> &mut Self {
        if !is_email(value) {
            self.fail(field, msg);
        }
        self
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize, msg: &str) -> &mut Self {
        if value.chars().count() < min {
            self.fail(field, msg);
        }
        self
    }

    fn fail(&mut self, field: &str, msg: &str) {
        self.errors.push(ErrorDetail::for_field(field, msg));
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
