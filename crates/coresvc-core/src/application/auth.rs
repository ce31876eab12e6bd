//! Authorization primitives: subject role, fine-grained permissions, and the
//! per-request `AuthContext` attached by the JWT middleware.

use super::super::domain::id::Id;

/// The subject's role, normalized (lowercased, trimmed) by the transport
/// layer before this type is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parse a normalized role string. Unknown roles return `None` so the
    /// caller can fail closed.
    #[must_use]
    pub fn parse(normalized: &str) -> Option<Self> {
        match normalized {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    /// Whether this role is granted `permission`. Unknown combinations deny
    /// by default — authorization fails closed.
    #[must_use]
    pub fn permits(self, permission: Permission) -> bool {
        match (self, permission) {
            (Self::Admin, _) => true,
            (Self::User, Permission::UsersRead | Permission::UsersWrite) => true,
            (Self::User, Permission::UsersReadAny) => false,
        }
    }
}

/// A permission a use case checks before doing any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read one's own user record.
    UsersRead,
    /// Create a user record.
    UsersWrite,
    /// Read any user record, regardless of ownership.
    UsersReadAny,
}

/// The authenticated subject, attached to the request context by the JWT
/// middleware once claims have been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject_id: Id,
    pub role: Role,
}

impl AuthContext {
    #[must_use]
    pub fn new(subject_id: Id, role: Role) -> Self {
        Self { subject_id, role }
    }

    /// Fail-closed authorization check: missing or unknown roles are denied
    /// earlier, at construction time, so by the time a use case calls this
    /// the only question is whether the known role permits the action.
    #[must_use]
    pub fn permits(&self, permission: Permission) -> bool {
        self.role.permits(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_permits_everything() {
        assert!(Role::Admin.permits(Permission::UsersReadAny));
        assert!(Role::Admin.permits(Permission::UsersWrite));
    }

    #[test]
    fn user_cannot_read_any() {
        assert!(!Role::User.permits(Permission::UsersReadAny));
        assert!(Role::User.permits(Permission::UsersRead));
    }

    #[test]
    fn parse_rejects_unknown_role() {
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn parse_accepts_known_roles() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
    }
}
