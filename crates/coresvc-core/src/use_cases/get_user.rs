//! Get-user use case: a subject may always read their own record;
//! `UsersReadAny` is required to read someone else's.

use std::sync::Arc;

use tracing::instrument;

use crate::application::auth::{AuthContext, Permission};
use crate::application::error::AppError;
use crate::domain::id::Id;
use crate::domain::user::User;
use crate::ports::querier::Querier;
use crate::ports::user_repository::UserRepository;

pub struct GetUser {
    users: Arc<dyn UserRepository>,
}

impl GetUser {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    #[instrument(skip_all, fields(user_id = %id))]
    pub async fn execute(
        &self,
        auth: &AuthContext,
        q: &mut dyn Querier,
        id: Id,
    ) -> Result<User, AppError> {
        let is_self = auth.subject_id == id;
        if !is_self && !auth.permits(Permission::UsersReadAny) {
            return Err(AppError::Forbidden);
        }

        self.users
            .find_by_id(q, id)
            .await
            .map_err(AppError::internal)?
            .ok_or(AppError::NotFound { entity: "user" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::auth::Role;
    use crate::domain::pagination::ListParams;
    use crate::ports::{RepositoryError};
    use async_trait::async_trait;
    use mockall::mock;
    use std::any::Any;
    use chrono::Utc;

    struct NoopQuerier;
    impl Querier for NoopQuerier {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    mock! {
        Users {}
        #[async_trait]
        impl UserRepository for Users {
            async fn insert(&self, q: &mut dyn Querier, user: &User) -> Result<(), RepositoryError>;
            async fn find_by_id(&self, q: &mut dyn Querier, id: Id) -> Result<Option<User>, RepositoryError>;
            async fn exists_by_email(&self, q: &mut dyn Querier, email: &str) -> Result<bool, RepositoryError>;
            async fn list(&self, q: &mut dyn Querier, params: ListParams) -> Result<(Vec<User>, i64), RepositoryError>;
        }
    }

    fn sample_user(id: Id) -> User {
        let now = Utc::now();
        User {
            id,
            email: "a@b.com".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn allows_reading_self() {
        let id = Id::generate();
        let mut users = MockUsers::new();
        let expected = sample_user(id);
        let cloned = expected.clone();
        users
            .expect_find_by_id()
            .returning(move |_, _| Ok(Some(cloned.clone())));
        let use_case = GetUser::new(Arc::new(users));
        let ctx = AuthContext::new(id, Role::User);
        let mut q = NoopQuerier;
        let result = use_case.execute(&ctx, &mut q, id).await.unwrap();
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn denies_reading_other_without_read_any() {
        let mut users = MockUsers::new();
        users.expect_find_by_id().never();
        let use_case = GetUser::new(Arc::new(users));
        let ctx = AuthContext::new(Id::generate(), Role::User);
        let mut q = NoopQuerier;
        let result = use_case.execute(&ctx, &mut q, Id::generate()).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn maps_missing_row_to_not_found() {
        let mut users = MockUsers::new();
        users.expect_find_by_id().returning(|_, _| Ok(None));
        let use_case = GetUser::new(Arc::new(users));
        let ctx = AuthContext::new(Id::generate(), Role::Admin);
        let mut q = NoopQuerier;
        let result = use_case.execute(&ctx, &mut q, Id::generate()).await;
        assert!(matches!(result, Err(AppError::NotFound { entity: "user" })));
    }
}
