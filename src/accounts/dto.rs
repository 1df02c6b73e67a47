use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::accounts::repo_types::User;

/// A user counts as online while their last login is this recent.
const ONLINE_WINDOW: Duration = Duration::minutes(5);

/// Request body for registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub display_name: String,
    pub username: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for profile updates. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// User record with the password hash stripped, safe to send to clients.
/// `is_online` is a read-time projection carried only by list/search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub display_name: String,
    pub username: String,
    pub avatar: Option<String>,
    pub theme: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
}

impl PublicUser {
    pub fn from_record(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            theme: user.theme.clone(),
            created_at: user.created_at,
            last_seen: user.last_seen,
            updated_at: user.updated_at,
            is_online: None,
        }
    }

    pub fn with_presence(user: &User, now: OffsetDateTime) -> Self {
        let mut public = Self::from_record(user);
        public.is_online = Some(now - user.last_seen < ONLINE_WINDOW);
        public
    }
}

/// Success envelope returned by register/login/update-profile.
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: PublicUser,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub users: usize,
    pub environment: String,
    pub uptime: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::default_theme;

    fn record() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            display_name: "Test User".into(),
            username: "tester".into(),
            password_hash: "$argon2id$fake".into(),
            avatar: None,
            theme: default_theme(),
            created_at: now,
            last_seen: now,
            updated_at: None,
        }
    }

    #[test]
    fn public_user_never_serializes_the_hash() {
        let json = serde_json::to_string(&PublicUser::from_record(&record())).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"username\":\"tester\""));
    }

    #[test]
    fn presence_flag_follows_last_seen() {
        let user = record();
        let now = OffsetDateTime::now_utc();
        let fresh = PublicUser::with_presence(&user, now);
        assert_eq!(fresh.is_online, Some(true));
        let stale = PublicUser::with_presence(&user, now + Duration::minutes(6));
        assert_eq!(stale.is_online, Some(false));
    }

    #[test]
    fn plain_projection_omits_presence() {
        let json = serde_json::to_string(&PublicUser::from_record(&record())).unwrap();
        assert!(!json.contains("isOnline"));
    }
}
