//! Logged-in user model and login form data

use serde::{Deserialize, Serialize};

/// User attached to a session
///
/// A value, never mutated in place: a login attempt produces a new one that
/// replaces the previous user in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedInUser {
    pub user_id: String,
    pub user_pwd: String,
    /// Display name resolved by the credential lookup
    pub user_name: Option<String>,
    /// True only once the credential lookup has verified the user
    pub active: bool,
}

impl LoggedInUser {
    /// Inactive user carrying the submitted credentials
    pub fn candidate(credentials: &Credentials) -> Self {
        Self {
            user_id: credentials.user_id.clone(),
            user_pwd: credentials.user_pwd.clone(),
            user_name: None,
            active: false,
        }
    }

    /// Copy of this user, activated with the attributes the lookup resolved
    pub fn activate(self, profile: UserProfile) -> Self {
        Self {
            user_name: profile.user_name,
            active: true,
            ..self
        }
    }
}

/// Form fields submitted to `logonAction`
///
/// Missing fields deserialize to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[serde(rename = "userPwd", default)]
    pub user_pwd: String,
}

#[cfg(test)]
impl Credentials {
    pub fn new(user_id: impl Into<String>, user_pwd: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_pwd: user_pwd.into(),
        }
    }
}

/// Profile attributes resolved for a verified user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub user_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_is_inactive() {
        let user = LoggedInUser::candidate(&Credentials::new("alice", "secret"));
        assert_eq!(user.user_id, "alice");
        assert_eq!(user.user_pwd, "secret");
        assert!(!user.active);
    }

    #[test]
    fn test_activate_keeps_submitted_id() {
        let user = LoggedInUser::candidate(&Credentials::new("alice", "secret")).activate(
            UserProfile {
                user_name: Some("Alice".to_string()),
            },
        );
        assert!(user.active);
        assert_eq!(user.user_id, "alice");
        assert_eq!(user.user_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_credentials_missing_fields_are_empty() {
        let credentials: Credentials = serde_json::from_str(r#"{"userId": "bob"}"#).unwrap();
        assert_eq!(credentials, Credentials::new("bob", ""));
    }
}
