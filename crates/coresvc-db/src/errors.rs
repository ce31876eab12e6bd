//! Shared sqlx error mapping. SQLSTATE `40001` (`serialization_failure`) and
//! `40P01` (`deadlock_detected`) are mapped to [`RepositoryError::Serialization`]
//! so [`crate::tx_manager::PgTxManager`] can retry the whole transaction —
//! every other database error maps to the generic [`RepositoryError::Storage`],
//! never leaking the SQL fragment or driver detail past this boundary.

use coresvc_core::ports::RepositoryError;

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

#[must_use]
pub fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(db_err.code().as_deref(), Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)) {
            return RepositoryError::Serialization(err.to_string());
        }
    }
    RepositoryError::Storage(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_map_to_storage() {
        let err = sqlx::Error::PoolClosed;
        assert!(matches!(map_sqlx_error(err), RepositoryError::Storage(_)));
    }
}
