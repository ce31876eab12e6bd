//! Audit event recorded atomically with every business mutation.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::id::Id;

/// Mirrors `coresvc-config`'s `AUDIT_REDACT_EMAIL` setting without the
/// application layer depending on the config crate (forbidden per the
/// hexagonal layering rule) — the bootstrap composition root maps one to
/// the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailRedaction {
    /// Replace the whole address with a fixed placeholder.
    Full,
    /// Keep the first character of the local part and the domain, mask
    /// the rest of the local part (`a***@example.com`).
    Partial,
}

impl EmailRedaction {
    #[must_use]
    pub fn apply(self, email: &str) -> String {
        match self {
            Self::Full => "[REDACTED]".to_string(),
            Self::Partial => partial_redact(email),
        }
    }
}

fn partial_redact(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "[REDACTED]".to_string();
    };
    let mut chars = local.chars();
    let first = chars.next().map_or_else(String::new, |c| c.to_string());
    format!("{first}***@{domain}")
}

/// A record describing a business mutation. Created once inside the same
/// transaction that performs the mutation; never updated afterward.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub id: Id,
    pub event_type: String,
    pub actor_id: Option<Id>,
    pub entity_type: &'static str,
    pub entity_id: Id,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

/// Fields needed to record a new audit event, before an `Id` and timestamp
/// are assigned.
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub entity: &'static str,
    pub action: &'static str,
    pub actor_id: Option<Id>,
    pub entity_id: Id,
    pub payload: Value,
    pub request_id: String,
}

impl NewAuditEvent {
    /// Event type is always `entity.action`, lowercase, per the audit
    /// contract (e.g. `user.created`).
    #[must_use]
    pub fn event_type(&self) -> String {
        format!("{}.{}", self.entity, self.action)
    }

    #[must_use]
    pub fn into_event(self, now: DateTime<Utc>) -> AuditEvent {
        AuditEvent {
            id: Id::generate(),
            event_type: self.event_type(),
            actor_id: self.actor_id,
            entity_type: self.entity,
            entity_id: self.entity_id,
            payload: self.payload,
            timestamp: now,
            request_id: self.request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_is_lowercase_entity_dot_action() {
        let new_event = NewAuditEvent {
            entity: "user",
            action: "created",
            actor_id: None,
            entity_id: Id::generate(),
            payload: serde_json::json!({}),
            request_id: "req-1".to_string(),
        };
        assert_eq!(new_event.event_type(), "user.created");
    }

    #[test]
    fn full_redaction_replaces_whole_address() {
        assert_eq!(EmailRedaction::Full.apply("a@b.com"), "[REDACTED]");
    }

    #[test]
    fn partial_redaction_keeps_first_char_and_domain() {
        assert_eq!(EmailRedaction::Partial.apply("alice@example.com"), "a***@example.com");
    }

    #[test]
    fn partial_redaction_falls_back_on_malformed_address() {
        assert_eq!(EmailRedaction::Partial.apply("not-an-email"), "[REDACTED]");
    }
}
