//! The concrete `Querier` implementation: either a pooled connection or an
//! open transaction, tagged by variant rather than inspected generically —
//! repository methods downcast once to this enum and `match` on it, never
//! reflecting over arbitrary types.

use std::any::Any;

use coresvc_core::ports::querier::Querier;
use sqlx::{PgPool, Postgres, Transaction};

pub enum PgQuerier {
    Pool(PgPool),
    Tx(Transaction<'static, Postgres>),
}

impl Querier for PgQuerier {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl PgQuerier {
    /// Downcast a `&mut dyn Querier` to this adapter's concrete type.
    ///
    /// # Panics
    ///
    /// Panics if `q` was not constructed by this crate's pool or
    /// [`crate::tx_manager::PgTxManager`] — a programming error, never a
    /// runtime condition a caller can recover from.
    pub fn downcast_mut(q: &mut dyn Querier) -> &mut Self {
        q.as_any_mut()
            .downcast_mut::<Self>()
            .expect("Querier was not a PgQuerier")
    }
}

/// Binds `$exec` to whichever executor `$q` currently holds — `&PgPool` or
/// `&mut Transaction<'_, Postgres>` — and evaluates `$body` against it.
/// Both arms run the same source once each, so they type-check
/// independently without needing a common `dyn Executor`.
macro_rules! with_executor {
    ($q:expr, $exec:ident => $body:expr) => {
        match $q {
            crate::querier::PgQuerier::Pool(pool) => {
                let $exec = &*pool;
                $body
            }
            crate::querier::PgQuerier::Tx(tx) => {
                let $exec = &mut *tx;
                $body
            }
        }
    };
}

pub(crate) use with_executor;
