pub mod audit_repository;
pub mod row_mappers;
pub mod user_repository;

pub use audit_repository::PgAuditRepository;
pub use user_repository::PgUserRepository;
