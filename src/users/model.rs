use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::password::{hash_password, verify_password},
    db::{Entity, Timestamps},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("role must be one of: user, moderator, admin (got {0:?})")]
pub struct UnknownRole(String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub github_username: String,
    pub password_hash: String, // Argon2 PHC string, never serialized
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<OffsetDateTime>,
    #[sqlx(flatten)]
    pub timestamps: Timestamps,
}

impl User {
    /// New, unsaved user; the plaintext password is hashed immediately.
    pub fn new(name: String, email: String, github_username: String, password: &str) -> anyhow::Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            github_username,
            password_hash: hash_password(password)?,
            role: Role::User,
            is_active: true,
            last_login: None,
            timestamps: Timestamps::now(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn set_password(&mut self, plain: &str) -> anyhow::Result<()> {
        self.password_hash = hash_password(plain)?;
        Ok(())
    }

    pub fn check_password(&self, plain: &str) -> anyhow::Result<bool> {
        verify_password(plain, &self.password_hash)
    }
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub github_username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub last_login: Option<OffsetDateTime>,
}

/// Public projection of a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub github_username: String,
    pub role: Role,
    pub is_active: bool,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

fn replace<T: PartialEq>(slot: &mut T, value: Option<T>, field: &'static str, changed: &mut Vec<&'static str>) {
    if let Some(value) = value {
        if *slot != value {
            *slot = value;
            changed.push(field);
        }
    }
}

impl Entity for User {
    type Changes = UserChanges;
    type Dict = PublicUser;

    fn id(&self) -> Uuid {
        self.id
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn apply(&mut self, changes: UserChanges) -> Vec<&'static str> {
        let mut changed = Vec::new();
        replace(&mut self.name, changes.name, "name", &mut changed);
        replace(&mut self.email, changes.email, "email", &mut changed);
        replace(&mut self.github_username, changes.github_username, "github_username", &mut changed);
        replace(&mut self.password_hash, changes.password_hash, "password_hash", &mut changed);
        replace(&mut self.role, changes.role, "role", &mut changed);
        replace(&mut self.is_active, changes.is_active, "is_active", &mut changed);
        replace(&mut self.last_login, changes.last_login.map(Some), "last_login", &mut changed);
        changed
    }

    fn to_dict(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            github_username: self.github_username.clone(),
            role: self.role,
            is_active: self.is_active,
            is_admin: self.is_admin(),
            last_login: self.last_login,
            timestamps: self.timestamps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::new("Test User".into(), "test@example.com".into(), "testuser".into(), "password123").unwrap()
    }

    #[test]
    fn new_user_hashes_password() {
        let user = sample();
        assert_ne!(user.password_hash, "password123");
        assert!(user.check_password("password123").unwrap());
        assert!(!user.check_password("wrongpassword").unwrap());
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(Role::try_from(role.as_str().to_string()).unwrap(), role);
        }
        assert!(Role::try_from("superuser".to_string()).is_err());
    }

    #[test]
    fn apply_reports_only_real_changes() {
        let mut user = sample();
        let changed = user.apply(UserChanges {
            name: Some("Test User".into()),
            email: Some("new@example.com".into()),
            ..Default::default()
        });
        assert_eq!(changed, vec!["email"]);
        assert_eq!(user.email, "new@example.com");
    }

    #[test]
    fn update_then_to_dict_reflects_changed_fields() {
        let mut user = sample();
        let before = user.to_dict();

        user.apply(UserChanges {
            name: Some("Renamed".into()),
            ..Default::default()
        });
        user.touch();
        let after = user.to_dict();

        assert_eq!(after.name, "Renamed");
        assert_eq!(after.timestamps.created_at, before.timestamps.created_at);
        assert!(after.timestamps.updated_at > before.timestamps.updated_at);
        assert_eq!(
            PublicUser {
                name: before.name.clone(),
                timestamps: before.timestamps,
                ..after.clone()
            },
            before
        );
    }

    #[test]
    fn to_dict_hides_password_and_flags_admin() {
        let mut user = sample();
        user.role = Role::Admin;
        let json = serde_json::to_value(user.to_dict()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["is_admin"], true);
        assert_eq!(json["role"], "admin");
        assert!(json["last_login"].is_null());
        assert!(json["created_at"].is_string());
        assert!(json["updated_at"].is_string());
    }
}
