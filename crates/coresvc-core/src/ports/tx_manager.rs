//! Transaction manager port.
//!
//! `with_tx`'s natural shape is generic over the closure it runs, which
//! would make the trait non-object-safe if written directly — and this
//! port genuinely needs to be held as `Arc<dyn TxManager>` behind
//! `AppState`, alongside every other port. So the trait itself only
//! exposes [`TxManager::with_tx_erased`], a dyn-safe core method that
//! erases the transaction body's result down to `Box<dyn Any + Send>`,
//! the same opacity trick [`Querier`] already uses for the
//! connection/transaction split. [`TxManagerExt::with_tx`] is the
//! ergonomic façade every call site actually uses — it downcasts back to
//! the caller's own `T` so nothing outside this module ever touches
//! `Box<dyn Any>`.
//!
//! `f` is bound `Fn`, not `FnOnce`: `PgTxManager` retries the whole
//! transaction from scratch on a serialization/deadlock conflict, which
//! means invoking the closure more than once. Every call site in this repo
//! already only clones its captures inside the closure body rather than
//! consuming them, so this is not a new constraint in practice.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use super::querier::Querier;
use crate::application::error::AppError;

/// A future, boxed and pinned, erased down to `dyn Future` so it can cross
/// a `dyn Trait` boundary.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The type-erased shape of a transaction body once `with_tx`'s `F`/`Fut`/`T`
/// have been boxed away.
type ErasedTxBody<'a> = dyn for<'q> Fn(&'q mut dyn Querier) -> BoxFuture<'q, Result<Box<dyn Any + Send>, AppError>>
    + Send
    + Sync
    + 'a;

#[async_trait]
pub trait TxManager: Send + Sync {
    /// Acquire a transaction, invoke `f` with a [`Querier`] bound to it,
    /// commit on `Ok`, roll back otherwise. A serialization/deadlock
    /// conflict (`AppError::is_retryable_conflict`) is retried with a fresh
    /// transaction rather than propagated directly. Use [`TxManagerExt::with_tx`]
    /// rather than calling this directly.
    async fn with_tx_erased<'a>(
        &'a self,
        f: Box<ErasedTxBody<'a>>,
    ) -> Result<Box<dyn Any + Send>, AppError>;
}

/// Generic, ergonomic wrapper around [`TxManager::with_tx_erased`]. Blanket
/// implemented for every `TxManager`, so call sites keep writing
/// `self.tx.with_tx(move |q| async move { .. }).await?` without ever
/// seeing the erasure underneath.
#[async_trait]
pub trait TxManagerExt: TxManager {
    async fn with_tx<'a, F, Fut, T>(&'a self, f: F) -> Result<T, AppError>
    where
        F: for<'q> Fn(&'q mut dyn Querier) -> Fut + Send + Sync + 'a,
        Fut: Future<Output = Result<T, AppError>> + Send,
        T: Send + 'static,
    {
        let erased: Box<ErasedTxBody<'a>> = Box::new(move |q: &mut dyn Querier| {
            let fut = f(q);
            Box::pin(async move { fut.await.map(|value| Box::new(value) as Box<dyn Any + Send>) })
                as BoxFuture<'_, Result<Box<dyn Any + Send>, AppError>>
        });

        let result = self.with_tx_erased(erased).await?;
        Ok(*result
            .downcast::<T>()
            .expect("TxManager::with_tx: erased result type did not match T"))
    }
}

impl<TM: TxManager + ?Sized> TxManagerExt for TM {}
