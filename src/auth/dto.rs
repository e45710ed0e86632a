use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{auth::password::policy_violations, error::AppError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Collects `field: message` pairs and turns them into one validation error.
#[derive(Default)]
struct FieldErrors(Vec<String>);

impl FieldErrors {
    fn require(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.0.push(format!("{field}: {message}"));
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.0.push(format!("{field}: Email is required"));
        } else if !is_valid_email(value) {
            self.0.push(format!("{field}: Email format is invalid"));
        }
    }

    fn password(&mut self, field: &str, value: &str) {
        for rule in policy_violations(value) {
            self.0.push(format!("{field}: {rule}"));
        }
    }

    fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0.join(", ")))
        }
    }
}

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_string();

        let mut errors = FieldErrors::default();
        errors.require("firstName", &self.first_name, "First name is required");
        errors.require("lastName", &self.last_name, "Last name is required");
        errors.email("email", &self.email);
        errors.password("password", &self.password);
        errors.finish()
    }
}

/// Request body for login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = self.email.trim().to_string();
        let mut errors = FieldErrors::default();
        errors.require("email", &self.email, "Email is required");
        errors.require("password", &self.password, "Password is required");
        errors.finish()
    }
}

/// Returned after a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub token: String,
}

/// Body of forgot-password and resend-verification.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

impl EmailRequest {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = self.email.trim().to_string();
        let mut errors = FieldErrors::default();
        errors.email("email", &self.email);
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::default();
        errors.require("token", &self.token, "Token is required");
        errors.password("newPassword", &self.new_password);
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::default();
        errors.require("currentPassword", &self.current_password, "Current password is required");
        errors.password("newPassword", &self.new_password);
        errors.finish()
    }
}

/// `?token=` on the verification link.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ann@x.com"));
        assert!(!is_valid_email("ann@x"));
        assert!(!is_valid_email("ann x@x.com"));
    }

    #[test]
    fn register_request_trims_and_accepts_valid_input() {
        let mut req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "firstName": " Ann ",
            "lastName": "Lee",
            "email": " ann@x.com ",
            "password": "Passw0rd"
        }))
        .unwrap();
        req.validate().unwrap();
        assert_eq!(req.first_name, "Ann");
        assert_eq!(req.email, "ann@x.com");
    }

    #[test]
    fn register_request_reports_field_errors() {
        let mut req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "not-an-email",
            "password": "password"
        }))
        .unwrap();
        let msg = req.validate().unwrap_err().to_string();
        assert!(msg.contains("firstName: First name is required"));
        assert!(msg.contains("lastName: Last name is required"));
        assert!(msg.contains("email: Email format is invalid"));
        assert!(msg.contains("password: Password must contain at least one uppercase letter"));
        assert!(msg.contains("password: Password must contain at least one number"));
    }

    #[test]
    fn email_case_is_preserved() {
        let mut req = EmailRequest {
            email: "Ann@X.com".into(),
        };
        req.validate().unwrap();
        assert_eq!(req.email, "Ann@X.com");
    }

    #[test]
    fn reset_request_applies_password_policy() {
        let req = ResetPasswordRequest {
            token: "".into(),
            new_password: "short".into(),
        };
        let msg = req.validate().unwrap_err().to_string();
        assert!(msg.contains("token: Token is required"));
        assert!(msg.contains("newPassword: Password must be at least 8 characters"));
    }
}
