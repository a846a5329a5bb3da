use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{commit_changes, DataError, Repository};

use super::model::User;

const USER_COLUMNS: &str = "id, name, email, github_username, password_hash, role, is_active, \
                            last_login, created_at, updated_at";

/// One page of a larger result set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub total: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn pagination(&self) -> Pagination {
        let per_page = self.per_page.max(1) as u64;
        let pages = self.total.div_ceil(per_page) as u32;
        Pagination {
            page: self.page,
            pages,
            per_page: self.per_page,
            total: self.total,
            has_next: self.page < pages,
            has_prev: self.page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// User lookups on top of the generic entity repository.
#[async_trait]
pub trait UserStore: Repository<User> {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DataError>;
    /// Case-insensitive, like GitHub logins.
    async fn find_by_github_username(&self, username: &str) -> Result<Option<User>, DataError>;
    async fn list(&self, include_inactive: bool) -> Result<Vec<User>, DataError>;
    /// Case-insensitive substring match on name, email and GitHub username.
    /// `page` starts at 1.
    async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Page<User>, DataError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Escapes LIKE metacharacters so user input only ever matches literally.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl Repository<User> for PgUserStore {
    async fn upsert(&self, user: &User) -> Result<User, DataError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, github_username, password_hash, role,
                               is_active, last_login, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                github_username = EXCLUDED.github_username,
                password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role,
                is_active = EXCLUDED.is_active,
                last_login = EXCLUDED.last_login,
                updated_at = EXCLUDED.updated_at
            RETURNING {USER_COLUMNS}
            "#
        );
        let mut tx = self.db.begin().await?;
        let outcome = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.github_username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.is_active)
            .bind(user.last_login)
            .bind(user.timestamps.created_at)
            .bind(user.timestamps.updated_at)
            .fetch_one(&mut *tx)
            .await;
        commit_changes(tx, outcome).await
    }

    async fn remove(&self, id: Uuid) -> Result<bool, DataError> {
        let mut tx = self.db.begin().await?;
        let outcome = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map(|r| r.rows_affected() > 0);
        commit_changes(tx, outcome).await
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, DataError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DataError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_github_username(&self, username: &str) -> Result<Option<User>, DataError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(github_username) = lower($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<User>, DataError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE $1 OR is_active ORDER BY created_at DESC"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.db)
            .await?;
        Ok(users)
    }

    async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Page<User>, DataError> {
        let pattern = like_pattern(query);
        let page = page.max(1);
        let offset = i64::from(page - 1) * i64::from(per_page);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
              FROM users
             WHERE name ILIKE $1 OR email ILIKE $1 OR github_username ILIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
              FROM users
             WHERE name ILIKE $1 OR email ILIKE $1 OR github_username ILIKE $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#
        );
        let items = sqlx::query_as::<_, User>(&sql)
            .bind(&pattern)
            .bind(i64::from(per_page))
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        Ok(Page {
            items,
            page,
            per_page,
            total: total.max(0) as u64,
        })
    }
}
