//! Role policy: one table deciding, per role, resource and operation,
//! whether a request may proceed and which rows it may touch.

use thiserror::Error;

use crate::auth::{Identity, Role};
use crate::types::{Operation, ResourceType};

/// Rows an identity may see or affect for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Unrestricted,
    OwnedByTeacher(i64),
    OwnedByStudent(i64),
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    pub scope: Scope,
}

impl AuthorizationDecision {
    fn allow(scope: Scope) -> Self {
        Self { allowed: true, reason: None, scope }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            scope: Scope::Denied,
        }
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("{role} may not {operation} {resource}: {reason}")]
    Denied {
        role: Role,
        resource: ResourceType,
        operation: Operation,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Deny,
    Allow,
    Own,
}

fn rule(role: Role, resource: ResourceType, operation: Operation) -> Rule {
    use ResourceType::*;

    let write = operation.is_write();
    match role {
        Role::Admin => Rule::Allow,
        Role::Unrecognized => Rule::Deny,
        Role::Teacher => match resource {
            User if write => Rule::Deny,
            User => Rule::Own,
            Subject if write => Rule::Deny,
            Subject => Rule::Allow,
            Bill => Rule::Deny,
            Class | Grade | AttendanceEntry | AttendanceList | WeeklyNote => Rule::Own,
        },
        Role::Student => match resource {
            User => Rule::Deny,
            _ if write => Rule::Deny,
            Subject => Rule::Allow,
            Class | Bill | Grade | AttendanceEntry | AttendanceList | WeeklyNote => Rule::Own,
        },
    }
}

/// Decide whether `identity` may perform `operation` on `resource`.
///
/// `target_owner` is the teacher owning the row being written (the class
/// teacher for class-linked rows). A scoped write naming another owner is denied.
pub fn authorize(
    identity: &Identity,
    resource: ResourceType,
    operation: Operation,
    target_owner: Option<i64>,
) -> AuthorizationDecision {
    match rule(identity.role, resource, operation) {
        Rule::Allow => AuthorizationDecision::allow(Scope::Unrestricted),
        Rule::Deny => {
            if identity.role == Role::Unrecognized {
                AuthorizationDecision::deny("unrecognized role")
            } else {
                AuthorizationDecision::deny(format!("role has no {} access", operation))
            }
        }
        Rule::Own => {
            let scope = match identity.role {
                Role::Teacher => Scope::OwnedByTeacher(identity.user_id),
                Role::Student => Scope::OwnedByStudent(identity.user_id),
                _ => return AuthorizationDecision::deny("role cannot own records"),
            };
            match target_owner {
                Some(owner) if operation.is_write() && owner != identity.user_id => {
                    AuthorizationDecision::deny("target is owned by another teacher")
                }
                _ => AuthorizationDecision::allow(scope),
            }
        }
    }
}

/// `authorize`, turning a denial into an error and an allow into its scope.
pub fn require(
    identity: &Identity,
    resource: ResourceType,
    operation: Operation,
    target_owner: Option<i64>,
) -> Result<Scope, PolicyError> {
    let decision = authorize(identity, resource, operation, target_owner);
    if decision.allowed {
        Ok(decision.scope)
    } else {
        Err(PolicyError::Denied {
            role: identity.role,
            resource,
            operation,
            reason: decision.reason.unwrap_or_default(),
        })
    }
}
