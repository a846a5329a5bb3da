use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::password::hash_password,
    config::AdminSeed,
    db::DataError,
    error::AppError,
    state::AppState,
};

use super::{
    dto::{ChangePasswordRequest, UpdateUserRequest},
    model::{Role, User, UserChanges},
    repo::{Page, UserStore},
};

pub const EMAIL_TAKEN: &str = "User with this email already exists";
pub const GITHUB_USERNAME_TAKEN: &str = "User with this GitHub username already exists";
const OWN_ACCOUNT_DEACTIVATION: &str = "Cannot delete your own account";

/// Input for account creation, already validated.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub github_username: String,
    pub password: String,
    pub role: Role,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reports a unique-constraint race as the same message the pre-checks use.
fn map_data_error(err: DataError) -> AppError {
    match &err {
        DataError::UniqueViolation(constraint) if constraint.contains("email") => {
            AppError::BadRequest(EMAIL_TAKEN.into())
        }
        DataError::UniqueViolation(constraint) if constraint.contains("github") => {
            AppError::BadRequest(GITHUB_USERNAME_TAKEN.into())
        }
        _ => AppError::Data(err),
    }
}

/// Self-or-admin gate for per-user routes.
pub fn ensure_self_or_admin(actor: &User, target: Uuid) -> Result<(), AppError> {
    if actor.id == target || actor.is_admin() {
        Ok(())
    } else {
        warn!(actor = %actor.id, target = %target, "cross-user access denied");
        Err(AppError::Unauthorized("Access denied".into()))
    }
}

pub fn ensure_admin(actor: &User) -> Result<(), AppError> {
    if actor.is_admin() {
        Ok(())
    } else {
        warn!(actor = %actor.id, "admin access required");
        Err(AppError::Forbidden("Admin access required".into()))
    }
}

pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
        }
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.users.find_by_email(&normalize_email(email)).await?.is_some())
    }

    pub async fn github_username_taken(&self, username: &str) -> Result<bool, AppError> {
        Ok(self
            .users
            .find_by_github_username(username.trim())
            .await?
            .is_some())
    }

    #[instrument(skip(self, new), fields(email = %new.email))]
    pub async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let email = normalize_email(&new.email);
        let github_username = new.github_username.trim().to_string();

        if self.email_taken(&email).await? {
            warn!(%email, "email already registered");
            return Err(AppError::BadRequest(EMAIL_TAKEN.into()));
        }
        if self.github_username_taken(&github_username).await? {
            warn!(%github_username, "github username already registered");
            return Err(AppError::BadRequest(GITHUB_USERNAME_TAKEN.into()));
        }

        let mut user = User::new(new.name.trim().to_string(), email, github_username, &new.password)?;
        user.role = new.role;
        self.users.save(&mut user).await.map_err(map_data_error)?;

        info!(user_id = %user.id, email = %user.email, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.users
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// The caller behind an access token. A token for a user that no longer
    /// exists or was deactivated is treated as invalid.
    pub async fn current_user(&self, id: Uuid) -> Result<User, AppError> {
        match self.users.find(id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => {
                warn!(user_id = %id, "token for missing or inactive user");
                Err(AppError::Unauthorized("User not found or inactive".into()))
            }
        }
    }

    /// Checks credentials and records the login time.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let invalid = || AppError::Unauthorized("Invalid credentials".into());
        let email = normalize_email(email);

        let Some(mut user) = self.users.find_by_email(&email).await? else {
            warn!(%email, "login unknown email");
            return Err(invalid());
        };
        if !user.check_password(password)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(invalid());
        }
        if !user.is_active {
            warn!(user_id = %user.id, "login for deactivated account");
            return Err(invalid());
        }

        self.users
            .update(
                &mut user,
                UserChanges {
                    last_login: Some(OffsetDateTime::now_utc()),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    #[instrument(skip(self, actor, req), fields(actor = %actor.id))]
    pub async fn update_user(&self, actor: &User, id: Uuid, req: UpdateUserRequest) -> Result<User, AppError> {
        let mut user = self.get_user(id).await?;
        let mut changes = UserChanges {
            name: req.name.map(|n| n.trim().to_string()),
            ..Default::default()
        };

        if let Some(email) = req.email.map(|e| normalize_email(&e)) {
            if email != user.email && self.email_taken(&email).await? {
                return Err(AppError::BadRequest(EMAIL_TAKEN.into()));
            }
            changes.email = Some(email);
        }
        if let Some(username) = req.github_username.map(|u| u.trim().to_string()) {
            if !username.eq_ignore_ascii_case(&user.github_username) && self.github_username_taken(&username).await? {
                return Err(AppError::BadRequest(GITHUB_USERNAME_TAKEN.into()));
            }
            changes.github_username = Some(username);
        }
        if let Some(password) = req.password {
            changes.password_hash = Some(hash_password(&password)?);
        }
        if actor.is_admin() {
            if actor.id == id && req.is_active == Some(false) {
                return Err(AppError::BadRequest(OWN_ACCOUNT_DEACTIVATION.into()));
            }
            if actor.id == id && req.role.is_some_and(|r| r != Role::Admin) {
                return Err(AppError::BadRequest("Cannot remove your own admin role".into()));
            }
            changes.role = req.role;
            changes.is_active = req.is_active;
        } else if req.role.is_some() || req.is_active.is_some() {
            warn!(actor = %actor.id, "ignoring role/is_active from non-admin");
        }

        let changed = self.users.update(&mut user, changes).await.map_err(map_data_error)?;
        info!(user_id = %user.id, ?changed, "user updated");
        Ok(user)
    }

    pub async fn change_password(&self, id: Uuid, req: ChangePasswordRequest) -> Result<(), AppError> {
        let mut user = self.get_user(id).await?;
        if !user.check_password(&req.current_password)? {
            warn!(user_id = %id, "change password with wrong current password");
            return Err(AppError::BadRequest("Current password is incorrect".into()));
        }
        if req.new_password != req.confirm_password {
            return Err(AppError::BadRequest("Passwords do not match".into()));
        }

        user.set_password(&req.new_password)?;
        self.users.save(&mut user).await?;
        info!(user_id = %id, "password changed");
        Ok(())
    }

    pub async fn list_users(&self, include_inactive: bool) -> Result<Vec<User>, AppError> {
        Ok(self.users.list(include_inactive).await?)
    }

    pub async fn search_users(&self, query: &str, page: u32, per_page: u32) -> Result<Page<User>, AppError> {
        Ok(self.users.search(query.trim(), page, per_page).await?)
    }

    /// Soft delete.
    pub async fn deactivate_user(&self, actor: &User, id: Uuid) -> Result<User, AppError> {
        if actor.id == id {
            return Err(AppError::BadRequest(OWN_ACCOUNT_DEACTIVATION.into()));
        }
        let mut user = self.get_user(id).await?;
        self.users
            .update(
                &mut user,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %id, actor = %actor.id, "user deactivated");
        Ok(user)
    }

    pub async fn promote_to_admin(&self, id: Uuid) -> Result<User, AppError> {
        let mut user = self.get_user(id).await?;
        self.users
            .update(
                &mut user,
                UserChanges {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %id, "user promoted to admin");
        Ok(user)
    }

    /// Creates the bootstrap admin unless an account with that email exists.
    /// Returns whether an account was created.
    pub async fn ensure_admin_account(&self, seed: &AdminSeed) -> Result<bool, AppError> {
        if self.email_taken(&seed.email).await? {
            info!(email = %seed.email, "admin account already present");
            return Ok(false);
        }
        let admin = self
            .create_user(NewUser {
                name: seed.name.clone(),
                email: seed.email.clone(),
                github_username: seed.github_username.clone(),
                password: seed.password.clone(),
                role: Role::Admin,
            })
            .await?;
        info!(user_id = %admin.id, "admin account created");
        Ok(true)
    }
}
