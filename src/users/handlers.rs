use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    controller::Controller,
    db::Entity,
    error::AppError,
    extract::{IdPath, ValidJson, ValidQuery},
    response::ApiResponse,
    state::AppState,
};

use super::{
    dto::{
        ChangePasswordRequest, CreateUserRequest, ListUsersQuery, SearchUsersQuery,
        UpdateUserRequest, UserListResponse, UserSearchResponse,
    },
    model::{PublicUser, Role},
    services::{ensure_admin, ensure_self_or_admin, NewUser, UserService},
};

pub struct UsersController;

impl Controller for UsersController {
    const NAME: &'static str = "users";
    const PREFIX: &'static str = "/api/users";

    fn routes() -> Router<AppState> {
        Router::new()
            .route("/", get(list_users).post(create_user))
            .route("/search", get(search_users))
            .route("/:id", get(get_user).put(update_user).delete(deactivate_user))
            .route("/:id/change-password", put(change_password))
            .route("/:id/promote", put(promote_user))
    }
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.id))]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    ensure_admin(&actor)?;
    let user = UserService::new(&state)
        .create_user(NewUser {
            name: payload.name,
            email: payload.email,
            github_username: payload.github_username,
            password: payload.password,
            role: payload.role.unwrap_or(Role::User),
        })
        .await?;
    Ok(ApiResponse::created(user.to_dict(), "User created successfully"))
}

#[instrument(skip(state, actor), fields(actor = %actor.id))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ValidQuery(query): ValidQuery<ListUsersQuery>,
) -> Result<ApiResponse<UserListResponse>, AppError> {
    ensure_admin(&actor)?;
    let users: Vec<PublicUser> = UserService::new(&state)
        .list_users(query.include_inactive)
        .await?
        .iter()
        .map(|u| u.to_dict())
        .collect();
    let total = users.len();
    Ok(ApiResponse::ok(
        UserListResponse { users, total },
        "Users retrieved successfully",
    ))
}

#[instrument(skip(state, actor), fields(actor = %actor.id))]
pub async fn search_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ValidQuery(query): ValidQuery<SearchUsersQuery>,
) -> Result<ApiResponse<UserSearchResponse>, AppError> {
    ensure_admin(&actor)?;
    let page = UserService::new(&state)
        .search_users(&query.q, query.page, query.per_page)
        .await?;
    let pagination = page.pagination();
    let users = page.map(|u| u.to_dict()).items;
    Ok(ApiResponse::ok(
        UserSearchResponse { users, pagination },
        "Users found successfully",
    ))
}

#[instrument(skip(state, actor), fields(actor = %actor.id))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    IdPath(id): IdPath,
) -> Result<ApiResponse<PublicUser>, AppError> {
    ensure_self_or_admin(&actor, id)?;
    let user = UserService::new(&state).get_user(id).await?;
    Ok(ApiResponse::ok(user.to_dict(), "User retrieved successfully"))
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.id))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    IdPath(id): IdPath,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    ensure_self_or_admin(&actor, id)?;
    let user = UserService::new(&state).update_user(&actor, id, payload).await?;
    Ok(ApiResponse::ok(user.to_dict(), "User updated successfully"))
}

#[instrument(skip(state, actor, payload), fields(actor = %actor.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    IdPath(id): IdPath,
    ValidJson(payload): ValidJson<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    if actor.id != id {
        return Err(AppError::Unauthorized("Access denied".into()));
    }
    UserService::new(&state).change_password(id, payload).await?;
    Ok(ApiResponse::message("Password changed successfully"))
}

#[instrument(skip(state, actor), fields(actor = %actor.id))]
pub async fn deactivate_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    IdPath(id): IdPath,
) -> Result<ApiResponse<PublicUser>, AppError> {
    ensure_admin(&actor)?;
    let user = UserService::new(&state).deactivate_user(&actor, id).await?;
    Ok(ApiResponse::ok(user.to_dict(), "User deactivated successfully"))
}

#[instrument(skip(state, actor), fields(actor = %actor.id))]
pub async fn promote_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    IdPath(id): IdPath,
) -> Result<ApiResponse<PublicUser>, AppError> {
    ensure_admin(&actor)?;
    let user = UserService::new(&state).promote_to_admin(id).await?;
    Ok(ApiResponse::ok(user.to_dict(), "User promoted to admin successfully"))
}
