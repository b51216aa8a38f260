use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_ROLE: &str = "user";

/// A stored credential record. The password hash never leaves the server;
/// the serialized form skips it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_never_serialized() {
        let user = User {
            id: Uuid::nil(),
            username: "u1".to_string(),
            email: "u1@x.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: DEFAULT_ROLE.to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
