//! The `Querier` port: an opaque handle repositories execute against.
//!
//! Both the connection pool and an open transaction satisfy this port (via
//! a concrete adapter type defined in `coresvc-db`), so a repository method
//! composes transparently whether it's called standalone or as part of a
//! larger `TxManager::with_tx` block. The marker is deliberately driver-free
//! — see `DESIGN.md` for why this is type-erased via `std::any` rather than
//! naming a SQL driver type directly.
use std::any::Any;

/// Opaque execution context. Infra adapters downcast this to their concrete
/// pool/transaction enum via [`Querier::as_any_mut`].
pub trait Querier: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
