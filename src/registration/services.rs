use tracing::{info, instrument, warn};

use crate::{
    error::AppError,
    github::services::{GithubService, UsernameCheck},
    state::AppState,
    users::{
        model::{Role, User},
        services::{NewUser, UserService, EMAIL_TAKEN, GITHUB_USERNAME_TAKEN},
    },
};

use super::dto::{GithubValidation, RegisterRequest};

pub struct RegistrationService {
    users: UserService,
    github: GithubService,
}

impl RegistrationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: UserService::new(state),
            github: GithubService::new(state),
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        if req.confirm_password.as_ref().is_some_and(|c| *c != req.password) {
            return Err(AppError::BadRequest("Passwords do not match".into()));
        }
        if self.users.email_taken(&req.email).await? {
            warn!("registration with existing email");
            return Err(AppError::BadRequest(EMAIL_TAKEN.into()));
        }

        let github_username = req.github_username.trim().to_string();
        if self.users.github_username_taken(&github_username).await? {
            return Err(AppError::BadRequest(GITHUB_USERNAME_TAKEN.into()));
        }
        if self.github.check_username(&github_username).await? == UsernameCheck::Missing {
            warn!(%github_username, "registration with unknown GitHub user");
            return Err(AppError::BadRequest("GitHub username does not exist".into()));
        }

        let user = self
            .users
            .create_user(NewUser {
                name: req.name,
                email: req.email,
                github_username,
                password: req.password,
                role: Role::User,
            })
            .await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn validate_github_username(&self, username: &str) -> Result<(GithubValidation, &'static str), AppError> {
        let username = username.trim();
        if self.users.github_username_taken(username).await? {
            return Err(AppError::BadRequest(GITHUB_USERNAME_TAKEN.into()));
        }

        let validation = |note| GithubValidation {
            valid: true,
            username: username.to_string(),
            note,
        };
        match self.github.check_username(username).await? {
            UsernameCheck::Exists => Ok((validation(None), "GitHub username is valid")),
            UsernameCheck::FormatOnly => Ok((
                validation(Some("Format validated (GitHub API unavailable)")),
                "GitHub username format is valid",
            )),
            UsernameCheck::Missing => Err(AppError::NotFound("GitHub username does not exist".into())),
        }
    }
}
