use serde::{Deserialize, Serialize};

/// The authenticated user record.
///
/// Owned exclusively by the session manager once authentication succeeds
/// and cleared on logout. `uid` is the stable identifier; everything else
/// is optional profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl UserRecord {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }

    /// Name to show in the UI, falling back to email, then uid.
    pub fn display(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// Request body for `POST /api/user/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /api/user/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Success payload from the login and register endpoints.
///
/// `expires_in` is the token TTL in seconds; when the server omits it the
/// caller falls back to the default session TTL.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserRecord,
    #[serde(rename = "expiresIn")]
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_display_fallbacks() {
        let mut user = UserRecord::new("u1");
        assert_eq!(user.display(), "u1");

        user.email = Some("pat@example.com".to_string());
        assert_eq!(user.display(), "pat@example.com");

        user.display_name = Some("Pat".to_string());
        assert_eq!(user.display(), "Pat");
    }

    #[test]
    fn test_auth_response_parses_camel_case() {
        let json = r#"{"token":"tok-1","user":{"uid":"u1","displayName":"Pat","email":"pat@example.com"},"expiresIn":7200}"#;
        let resp: AuthResponse = serde_json::from_str(json).expect("Failed to parse auth response");
        assert_eq!(resp.token, "tok-1");
        assert_eq!(resp.user.uid, "u1");
        assert_eq!(resp.user.display_name.as_deref(), Some("Pat"));
        assert_eq!(resp.expires_in, Some(7200));
    }

    #[test]
    fn test_auth_response_expires_in_optional() {
        let json = r#"{"token":"tok-2","user":{"uid":"u2","displayName":null,"email":null}}"#;
        let resp: AuthResponse = serde_json::from_str(json).expect("Failed to parse auth response");
        assert_eq!(resp.expires_in, None);
        assert!(resp.user.display_name.is_none());
    }

    #[test]
    fn test_register_request_omits_missing_display_name() {
        let req = RegisterRequest {
            email: "pat@example.com".to_string(),
            password: "secret".to_string(),
            display_name: None,
        };
        let json = serde_json::to_string(&req).expect("Failed to serialize register request");
        assert!(!json.contains("displayName"));
    }
}
