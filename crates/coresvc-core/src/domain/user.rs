//! The illustrative `User` entity.
//!
//! Stands in for whatever business entity a generated service actually
//! manages; the transport, use-case, and repository layers only ever see it
//! through this module's narrow surface.

use chrono::{DateTime, Utc};

use super::error::FieldViolation;
use super::id::Id;

/// A persisted user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new user, before an `Id` and timestamps are
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    /// Validate the fields of a new user, collecting every violation rather
    /// than failing on the first one.
    #[must_use]
    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();

        let email = self.email.trim();
        if email.is_empty() {
            violations.push(FieldViolation::new("email", "must not be empty"));
        } else if !is_plausible_email(email) {
            violations.push(FieldViolation::new("email", "must be a valid email address"));
        }

        if self.first_name.trim().is_empty() {
            violations.push(FieldViolation::new("firstName", "must not be empty"));
        } else if self.first_name.chars().count() > 100 {
            violations.push(FieldViolation::new(
                "firstName",
                "must be at most 100 characters",
            ));
        }

        if self.last_name.trim().is_empty() {
            violations.push(FieldViolation::new("lastName", "must not be empty"));
        } else if self.last_name.chars().count() > 100 {
            violations.push(FieldViolation::new(
                "lastName",
                "must be at most 100 characters",
            ));
        }

        violations
    }

    /// Promote a validated `NewUser` into a persisted `User`, assigning a
    /// fresh identifier and timestamps. Callers must have already checked
    /// [`NewUser::validate`] returns no violations.
    #[must_use]
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Id::generate(),
            email: self.email.trim().to_lowercase(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Minimal structural email check. Not RFC 5322-complete by design — the
/// domain layer only needs to reject obviously malformed input; deep
/// validation belongs to whatever sends the confirmation email.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_new_user() -> NewUser {
        NewUser {
            email: "a@b.c".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        }
    }

    #[test]
    fn accepts_valid_input() {
        assert!(valid_new_user().validate().is_empty());
    }

    #[test]
    fn rejects_empty_email() {
        let user = NewUser {
            email: String::new(),
            ..valid_new_user()
        };
        let violations = user.validate();
        assert!(violations.iter().any(|v| v.field == "email"));
    }

    #[test]
    fn rejects_malformed_email() {
        let user = NewUser {
            email: "not-an-email".to_string(),
            ..valid_new_user()
        };
        assert!(user.validate().iter().any(|v| v.field == "email"));
    }

    #[test]
    fn collects_every_violation() {
        let user = NewUser {
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
        };
        let violations = user.validate();
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn into_user_lowercases_and_trims_email() {
        let user = NewUser {
            email: "  A@B.C  ".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        };
        let now = Utc::now();
        let persisted = user.into_user(now);
        assert_eq!(persisted.email, "a@b.c");
    }
}
