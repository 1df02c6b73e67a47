use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record as persisted in the backing file.
///
/// The hash stays on this type only; anything leaving the process goes
/// through [`crate::accounts::dto::PublicUser`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

pub(crate) fn default_theme() -> String {
    "dark".to_string()
}

/// Backing-file layout: a single JSON document holding the full collection.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AccountsFile {
    #[serde(default)]
    pub users: Vec<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields_get_defaults() {
        let json = r#"{
            "id": "6f2c0b9e-0d3f-4a71-9c2a-3f6d1e5b8a40",
            "displayName": "Test",
            "username": "test",
            "passwordHash": "x",
            "createdAt": "2024-01-01T00:00:00Z",
            "lastSeen": "2024-01-01T00:00:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.theme, "dark");
        assert!(user.avatar.is_none());
        assert!(user.updated_at.is_none());
    }

    #[test]
    fn empty_document_deserializes_to_no_users() {
        let doc: AccountsFile = serde_json::from_str("{}").unwrap();
        assert!(doc.users.is_empty());
    }
}
