//! Create-user use case: authorization, validation, duplicate-email check,
//! and a transactional insert + audit write.

use std::sync::Arc;

use tracing::instrument;

use crate::application::auth::{AuthContext, Permission};
use crate::application::error::AppError;
use crate::domain::audit::{EmailRedaction, NewAuditEvent};
use crate::domain::user::{NewUser, User};
use crate::ports::audit_repository::AuditRepository;
use crate::ports::clock::Clock;
use crate::ports::tx_manager::{TxManager, TxManagerExt};
use crate::ports::user_repository::UserRepository;

pub struct CreateUser {
    users: Arc<dyn UserRepository>,
    audit: Arc<dyn AuditRepository>,
    tx: Arc<dyn TxManager>,
    clock: Arc<dyn Clock>,
    email_redaction: EmailRedaction,
}

impl CreateUser {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        audit: Arc<dyn AuditRepository>,
        tx: Arc<dyn TxManager>,
        clock: Arc<dyn Clock>,
        email_redaction: EmailRedaction,
    ) -> Self {
        Self {
            users,
            audit,
            tx,
            clock,
            email_redaction,
        }
    }

    /// `request_id` is threaded through for the audit trail, not for
    /// idempotency — that's handled above this layer by the transport
    /// middleware.
    #[instrument(skip_all, fields(email = %new_user.email))]
    pub async fn execute(
        &self,
        auth: &AuthContext,
        new_user: NewUser,
        request_id: String,
    ) -> Result<User, AppError> {
        if !auth.permits(Permission::UsersWrite) {
            return Err(AppError::Forbidden);
        }

        let violations = new_user.validate();
        if !violations.is_empty() {
            return Err(AppError::Validation { violations });
        }

        let now = self.clock.now();
        let user = new_user.into_user(now);

        let users = Arc::clone(&self.users);
        let audit = Arc::clone(&self.audit);
        let actor_id = Some(auth.subject_id);
        let email_redaction = self.email_redaction;
        let stored = self
            .tx
            .with_tx(move |q| {
                let user = user.clone();
                let request_id = request_id.clone();
                async move {
                    if users
                        .exists_by_email(q, &user.email)
                        .await
                        .map_err(|e| AppError::internal(e))?
                    {
                        return Err(AppError::EmailExists);
                    }

                    users
                        .insert(q, &user)
                        .await
                        .map_err(|e| AppError::internal(e))?;

                    let event = NewAuditEvent {
                        entity: "user",
                        action: "created",
                        actor_id,
                        entity_id: user.id,
                        payload: serde_json::json!({
                            "email": email_redaction.apply(&user.email),
                        }),
                        request_id,
                    }
                    .into_event(now);

                    audit
                        .insert(q, &event)
                        .await
                        .map_err(|e| AppError::internal(e))?;

                    Ok(user)
                }
            })
            .await?;

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::Id;
    use crate::ports::clock::SystemClock;
    use crate::ports::querier::Querier;
    use crate::ports::{RepositoryError};
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
            async fn list(&self, q: &mut dyn Querier, params: crate::domain::pagination::ListParams) -> Result<(Vec<User>, i64), RepositoryError>;
        }
    }

    mock! {
        Audit {}
        #[async_trait]
        impl AuditRepository for Audit {
            async fn insert(&self, q: &mut dyn Querier, event: &crate::domain::audit::AuditEvent) -> Result<(), RepositoryError>;
        }
    }

    struct PassthroughTx;

    #[async_trait]
    impl TxManager for PassthroughTx {
        async fn with_tx_erased<'a>(
            &'a self,
            f: Box<
                dyn for<'q> Fn(
                        &'q mut dyn Querier,
                    ) -> crate::ports::tx_manager::BoxFuture<
                        'q,
                        Result<Box<dyn Any + Send>, AppError>,
                    > + Send
                    + Sync
                    + 'a,
            >,
        ) -> Result<Box<dyn Any + Send>, AppError> {
            let mut q = NoopQuerier;
            f(&mut q).await
        }
    }

    fn admin_ctx() -> AuthContext {
        AuthContext::new(Id::generate(), crate::application::auth::Role::Admin)
    }

    fn valid_new_user() -> NewUser {
        NewUser {
            email: "a@b.com".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        }
    }

    #[tokio::test]
    async fn denies_forbidden_role() {
        let mut users = MockUsers::new();
        users.expect_exists_by_email().never();
        let audit = MockAudit::new();
        let use_case = CreateUser::new(
            Arc::new(users),
            Arc::new(audit),
            Arc::new(PassthroughTx),
            Arc::new(SystemClock),
            EmailRedaction::Partial,
        );
        let ctx = AuthContext::new(Id::generate(), crate::application::auth::Role::User);
        let result = use_case
            .execute(&ctx, valid_new_user(), "req-1".to_string())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn rejects_invalid_input_before_touching_repositories() {
        let mut users = MockUsers::new();
        users.expect_exists_by_email().never();
        let use_case = CreateUser::new(
            Arc::new(users),
            Arc::new(MockAudit::new()),
            Arc::new(PassthroughTx),
            Arc::new(SystemClock),
            EmailRedaction::Partial,
        );
        let invalid = NewUser {
            email: String::new(),
            ..valid_new_user()
        };
        let result = use_case
            .execute(&admin_ctx(), invalid, "req-1".to_string())
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn maps_duplicate_email_to_email_exists() {
        let mut users = MockUsers::new();
        users.expect_exists_by_email().returning(|_, _| Ok(true));
        let use_case = CreateUser::new(
            Arc::new(users),
            Arc::new(MockAudit::new()),
            Arc::new(PassthroughTx),
            Arc::new(SystemClock),
            EmailRedaction::Partial,
        );
        let result = use_case
            .execute(&admin_ctx(), valid_new_user(), "req-1".to_string())
            .await;
        assert!(matches!(result, Err(AppError::EmailExists)));
    }

    #[tokio::test]
    async fn inserts_and_audits_on_success() {
        let mut users = MockUsers::new();
        users.expect_exists_by_email().returning(|_, _| Ok(false));
        users.expect_insert().returning(|_, _| Ok(()));
        let mut audit = MockAudit::new();
        audit.expect_insert().returning(|_, _| Ok(()));
        let use_case = CreateUser::new(
            Arc::new(users),
            Arc::new(audit),
            Arc::new(PassthroughTx),
            Arc::new(SystemClock),
            EmailRedaction::Partial,
        );
        let result = use_case
            .execute(&admin_ctx(), valid_new_user(), "req-1".to_string())
            .await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().email, "a@b.com");
    }

    #[tokio::test]
    async fn audit_payload_carries_redacted_email_not_raw() {
        let mut users = MockUsers::new();
        users.expect_exists_by_email().returning(|_, _| Ok(false));
        users.expect_insert().returning(|_, _| Ok(()));
        let mut audit = MockAudit::new();
        audit.expect_insert().returning(|_, event| {
            assert_eq!(event.payload["email"], "a***@b.com");
            Ok(())
        });
        let use_case = CreateUser::new(
            Arc::new(users),
            Arc::new(audit),
            Arc::new(PassthroughTx),
            Arc::new(SystemClock),
            EmailRedaction::Partial,
        );
        let result = use_case
            .execute(&admin_ctx(), valid_new_user(), "req-1".to_string())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn full_redaction_never_includes_the_local_part() {
        let mut users = MockUsers::new();
        users.expect_exists_by_email().returning(|_, _| Ok(false));
        users.expect_insert().returning(|_, _| Ok(()));
        let mut audit = MockAudit::new();
        audit.expect_insert().returning(|_, event| {
            assert_eq!(event.payload["email"], "[REDACTED]");
            Ok(())
        });
        let use_case = CreateUser::new(
            Arc::new(users),
            Arc::new(audit),
            Arc::new(PassthroughTx),
            Arc::new(SystemClock),
            EmailRedaction::Full,
        );
        let result = use_case
            .execute(&admin_ctx(), valid_new_user(), "req-1".to_string())
            .await;
        assert!(result.is_ok());
    }
}
