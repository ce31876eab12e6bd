//! List-users use case: paginated listing, restricted to subjects with
//! `UsersReadAny`.

use std::sync::Arc;

use tracing::instrument;

use crate::application::auth::{AuthContext, Permission};
use crate::application::error::AppError;
use crate::domain::pagination::ListParams;
use crate::domain::user::User;
use crate::ports::querier::Querier;
use crate::ports::user_repository::UserRepository;

pub struct ListUsers {
    users: Arc<dyn UserRepository>,
}

impl ListUsers {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    #[instrument(skip_all, fields(page = params.page(), page_size = params.page_size()))]
    pub async fn execute(
        &self,
        auth: &AuthContext,
        q: &mut dyn Querier,
        params: ListParams,
    ) -> Result<(Vec<User>, i64), AppError> {
        if !auth.permits(Permission::UsersReadAny) {
            return Err(AppError::Forbidden);
        }

        self.users.list(q, params).await.map_err(AppError::internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::auth::Role;
    use crate::domain::id::Id;
    use crate::ports::RepositoryError;
    use async_trait::async_trait;
    use mockall::mock;
    use std::any::Any;

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

    #[tokio::test]
    async fn denies_without_read_any() {
        let mut users = MockUsers::new();
        users.expect_list().never();
        let use_case = ListUsers::new(Arc::new(users));
        let ctx = AuthContext::new(Id::generate(), Role::User);
        let mut q = NoopQuerier;
        let result = use_case.execute(&ctx, &mut q, ListParams::default()).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn returns_page_and_total_for_admin() {
        let mut users = MockUsers::new();
        users.expect_list().returning(|_, _| Ok((Vec::new(), 0)));
        let use_case = ListUsers::new(Arc::new(users));
        let ctx = AuthContext::new(Id::generate(), Role::Admin);
        let mut q = NoopQuerier;
        let result = use_case
            .execute(&ctx, &mut q, ListParams::default())
            .await
            .unwrap();
        assert_eq!(result, (Vec::new(), 0));
    }
}
