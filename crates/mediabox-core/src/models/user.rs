use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ClientError;

const MISSING_SIGNUP_FIELDS: &str = "Please fill in all signup fields.";
const MISSING_LOGIN_FIELDS: &str = "Please fill in all login fields.";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters long.";
const PASSWORD_MISMATCH: &str = "Passwords do not match.";

/// Authenticated identity as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        match (&self.username, &self.email) {
            (Some(username), _) if !username.is_empty() => username.clone(),
            (_, Some(email)) if !email.is_empty() => email.clone(),
            _ => format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MeResponse {
    #[serde(default)]
    pub user: Option<User>,
}

/// Body of login, signup and refresh responses.
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenResponse {
    pub fn into_token(self) -> Option<String> {
        self.token.filter(|t| !t.is_empty())
    }
}

/// Credentials posted to `/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(identifier: &str, password: &str) -> Result<Self, ClientError> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(ClientError::InvalidInput(MISSING_LOGIN_FIELDS.to_string()));
        }
        Ok(Self {
            identifier: identifier.trim().to_string(),
            password: password.to_string(),
        })
    }
}

/// Registration form contents.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "Please fill in all signup fields."))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Please fill in all signup fields."))]
    pub last_name: String,
    #[validate(length(min = 1, message = "Please fill in all signup fields."))]
    pub date_of_birth: String,
    #[validate(
        required(message = "Please fill in all signup fields."),
        length(min = 1, message = "Please fill in all signup fields.")
    )]
    pub email: Option<String>,
    pub username: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: String,
    pub confirm_password: Option<String>,
}

impl RegisterPayload {
    /// Form-level checks in display order: missing fields, password length, confirmation.
    pub fn check(&self) -> Result<(), ClientError> {
        if let Err(errors) = self.validate() {
            let fields = errors.field_errors();
            let missing = ["first_name", "last_name", "date_of_birth", "email"]
                .iter()
                .any(|field| fields.contains_key(*field));
            let message = if missing {
                MISSING_SIGNUP_FIELDS
            } else {
                PASSWORD_TOO_SHORT
            };
            return Err(ClientError::InvalidInput(message.to_string()));
        }

        if let Some(confirm) = &self.confirm_password {
            if confirm != &self.password {
                return Err(ClientError::InvalidInput(PASSWORD_MISMATCH.to_string()));
            }
        }

        Ok(())
    }
}

/// User record sent to `/auth/signup`. The backend names the plain password field `passwordHash`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub user: NewUser,
}

impl From<RegisterPayload> for SignupRequest {
    fn from(payload: RegisterPayload) -> Self {
        SignupRequest {
            user: NewUser {
                first_name: payload.first_name,
                last_name: payload.last_name,
                date_of_birth: payload.date_of_birth,
                email: payload.email.filter(|e| !e.is_empty()),
                username: payload.username.filter(|u| !u.is_empty()),
                password_hash: payload.password,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> RegisterPayload {
        RegisterPayload {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            date_of_birth: "1815-12-10".to_string(),
            email: Some("ada@example.com".to_string()),
            username: Some("ada".to_string()),
            password: "analytical".to_string(),
            confirm_password: Some("analytical".to_string()),
        }
    }

    fn message(result: Result<(), ClientError>) -> String {
        match result {
            Err(ClientError::InvalidInput(msg)) => msg,
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_register_payload_valid() {
        assert!(payload().check().is_ok());
    }

    #[test]
    fn test_register_payload_missing_fields() {
        let mut p = payload();
        p.email = None;
        assert_eq!(message(p.check()), MISSING_SIGNUP_FIELDS);

        let mut p = payload();
        p.last_name.clear();
        p.password = "abc".to_string();
        assert_eq!(message(p.check()), MISSING_SIGNUP_FIELDS);
    }

    #[test]
    fn test_register_payload_password_rules() {
        let mut p = payload();
        p.password = "abc".to_string();
        p.confirm_password = Some("abc".to_string());
        assert_eq!(message(p.check()), PASSWORD_TOO_SHORT);

        let mut p = payload();
        p.confirm_password = Some("different".to_string());
        assert_eq!(message(p.check()), PASSWORD_MISMATCH);
    }

    #[test]
    fn test_signup_request_shape() {
        let mut p = payload();
        p.username = Some(String::new());
        let body = serde_json::to_value(SignupRequest::from(p)).unwrap();
        assert_eq!(body["user"]["firstName"], "Ada");
        assert_eq!(body["user"]["dateOfBirth"], "1815-12-10");
        assert_eq!(body["user"]["passwordHash"], "analytical");
        assert!(body["user"].get("username").is_none());
        assert!(body["user"].get("confirmPassword").is_none());
    }

    #[test]
    fn test_login_request_rejects_blank_fields() {
        assert!(LoginRequest::new("ada", "secret").is_ok());
        let err = LoginRequest::new("  ", "secret").unwrap_err();
        assert_eq!(err, ClientError::InvalidInput(MISSING_LOGIN_FIELDS.to_string()));
        assert!(LoginRequest::new("ada", "").is_err());
    }

    #[test]
    fn test_token_response_ignores_empty_token() {
        let empty: TokenResponse = serde_json::from_str(r#"{"token":""}"#).unwrap();
        assert_eq!(empty.into_token(), None);
        let missing: TokenResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.into_token(), None);
        let present: TokenResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(present.into_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_user_display_name() {
        let user: User = serde_json::from_str(
            r#"{"firstName":"Ada","lastName":"Lovelace","dateOfBirth":"1815-12-10","passwordHash":"x"}"#,
        )
        .unwrap();
        assert_eq!(user.display_name(), "Ada Lovelace");
    }
}
