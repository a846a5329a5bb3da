use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::jwt::AuthUser;
use crate::{error::AppError, state::AppState, users::model::User, users::services::UserService};

/// The active user behind a valid access token.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        let user = UserService::new(state).current_user(user_id).await?;
        Ok(CurrentUser(user))
    }
}
