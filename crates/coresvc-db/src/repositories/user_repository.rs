//! Postgres implementation of `UserRepository`.

use async_trait::async_trait;
use coresvc_core::domain::id::Id;
use coresvc_core::domain::pagination::ListParams;
use coresvc_core::domain::user::User;
use coresvc_core::ports::querier::Querier;
use coresvc_core::ports::user_repository::UserRepository;
use coresvc_core::ports::RepositoryError;
use sqlx::Row;

use crate::errors::map_sqlx_error;
use crate::querier::{PgQuerier, with_executor};

use super::row_mappers::{USER_SELECT_COLUMNS, row_to_user};

pub struct PgUserRepository;

impl PgUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PgUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, q: &mut dyn Querier, user: &User) -> Result<(), RepositoryError> {
        let q = PgQuerier::downcast_mut(q);
        let result = with_executor!(q, exec => {
            sqlx::query(
                "INSERT INTO users (id, email, first_name, last_name, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(user.id.as_uuid())
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(exec)
            .await
        });

        result.map(|_| ()).map_err(map_insert_error)
    }

    async fn find_by_id(
        &self,
        q: &mut dyn Querier,
        id: Id,
    ) -> Result<Option<User>, RepositoryError> {
        let q = PgQuerier::downcast_mut(q);
        let query = format!("SELECT {USER_SELECT_COLUMNS} FROM users WHERE id = $1");
        let row = with_executor!(q, exec => {
            sqlx::query(&query).bind(id.as_uuid()).fetch_optional(exec).await
        })
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn exists_by_email(
        &self,
        q: &mut dyn Querier,
        email: &str,
    ) -> Result<bool, RepositoryError> {
        let q = PgQuerier::downcast_mut(q);
        let row = with_executor!(q, exec => {
            sqlx::query("SELECT 1 FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(exec)
                .await
        })
        .map_err(map_sqlx_error)?;

        Ok(row.is_some())
    }

    async fn list(
        &self,
        q: &mut dyn Querier,
        params: ListParams,
    ) -> Result<(Vec<User>, i64), RepositoryError> {
        let q = PgQuerier::downcast_mut(q);

        let list_query = format!(
            "SELECT {USER_SELECT_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let limit = i64::from(params.limit());
        let offset = params.offset();

        let rows = with_executor!(q, exec => {
            sqlx::query(&list_query).bind(limit).bind(offset).fetch_all(exec).await
        })
        .map_err(map_sqlx_error)?;

        let users = rows.iter().map(row_to_user).collect::<Result<Vec<_>, _>>()?;

        let total: i64 = with_executor!(q, exec => {
            sqlx::query("SELECT COUNT(*) FROM users")
                .fetch_one(exec)
                .await
                .and_then(|row| row.try_get::<i64, _>(0))
        })
        .map_err(map_sqlx_error)?;

        Ok((users, total))
    }
}

fn map_insert_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::AlreadyExists("email already registered".to_string());
        }
    }
    map_sqlx_error(err)
}
