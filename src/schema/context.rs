//! Check Context
//!
//! Everything a predicate may consult: who is asking, the stored document,
//! the incoming submission, the universe snapshot, and the value at the leaf
//! currently being evaluated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::universe::UniverseState;

/// Role flags carried by an authenticated identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub organizer: bool,
    #[serde(default)]
    pub volunteer: bool,
    #[serde(default)]
    pub hacker: bool,
}

/// Identity of the caller, produced by the authentication layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// Identifier matching the `_id` of the caller's own user document
    pub id: Option<String>,

    #[serde(default)]
    pub roles: Roles,
}

impl Requester {
    /// Create a requester with the given id and roles
    pub fn new(id: impl Into<String>, roles: Roles) -> Self {
        Self {
            id: Some(id.into()),
            roles,
        }
    }

    /// Unauthenticated caller
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn hacker(id: impl Into<String>) -> Self {
        Self::new(
            id,
            Roles {
                hacker: true,
                ..Roles::default()
            },
        )
    }

    pub fn volunteer(id: impl Into<String>) -> Self {
        Self::new(
            id,
            Roles {
                volunteer: true,
                ..Roles::default()
            },
        )
    }

    pub fn organizer(id: impl Into<String>) -> Self {
        Self::new(
            id,
            Roles {
                organizer: true,
                ..Roles::default()
            },
        )
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(
            id,
            Roles {
                admin: true,
                organizer: true,
                ..Roles::default()
            },
        )
    }

    pub fn is_admin(&self) -> bool {
        self.roles.admin
    }

    pub fn is_volunteer(&self) -> bool {
        self.roles.volunteer
    }

    pub fn is_hacker(&self) -> bool {
        self.roles.hacker
    }

    /// Admins and organizers see internal denial reasons
    pub fn is_privileged(&self) -> bool {
        self.roles.admin || self.roles.organizer
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }
}

/// Immutable bundle handed to every predicate and interceptor
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub request_user: &'a Requester,

    /// Persisted document (read, update and delete paths)
    pub target_object: Option<&'a Value>,

    /// Full incoming payload (create and update paths)
    pub submission_object: Option<&'a Value>,

    pub universe_state: &'a UniverseState,

    /// Value at the leaf under evaluation; `None` at group gates
    pub field_value: Option<&'a Value>,
}

impl<'a> CheckContext<'a> {
    /// Context for read and delete traversals
    pub fn for_target(
        request_user: &'a Requester,
        target_object: Option<&'a Value>,
        universe_state: &'a UniverseState,
    ) -> Self {
        Self {
            request_user,
            target_object,
            submission_object: None,
            universe_state,
            field_value: None,
        }
    }

    /// Context for create and update traversals
    pub fn for_write(
        request_user: &'a Requester,
        target_object: Option<&'a Value>,
        submission_object: &'a Value,
        universe_state: &'a UniverseState,
    ) -> Self {
        Self {
            request_user,
            target_object,
            submission_object: Some(submission_object),
            universe_state,
            field_value: None,
        }
    }

    /// Same context narrowed to one leaf value
    pub fn at_field<'b>(&self, value: Option<&'b Value>) -> CheckContext<'b>
    where
        'a: 'b,
    {
        CheckContext {
            request_user: self.request_user,
            target_object: self.target_object,
            submission_object: self.submission_object,
            universe_state: self.universe_state,
            field_value: value,
        }
    }

    /// Look up a dot path in the target document
    pub fn target_at(&self, path: &str) -> Option<&'a Value> {
        self.target_object.and_then(|doc| lookup_path(doc, path))
    }

    /// Look up a dot path in the submission
    pub fn submission_at(&self, path: &str) -> Option<&'a Value> {
        self.submission_object.and_then(|doc| lookup_path(doc, path))
    }

    /// True when the requester's id equals the target's `_id`
    pub fn requester_owns_target(&self) -> bool {
        match (&self.request_user.id, self.target_at("_id")) {
            (Some(id), Some(Value::String(owner))) => id == owner,
            _ => false,
        }
    }
}

/// Resolve a dot-delimited path inside a JSON value
pub fn lookup_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admin_is_privileged() {
        assert!(Requester::admin("a").is_privileged());
        assert!(Requester::organizer("o").is_privileged());
        assert!(!Requester::volunteer("v").is_privileged());
        assert!(!Requester::hacker("h").is_privileged());
        assert!(!Requester::anonymous().is_authenticated());
    }

    #[test]
    fn test_lookup_path() {
        let doc = json!({"status": {"accepted": true}, "name": "Ada"});
        assert_eq!(lookup_path(&doc, "status.accepted"), Some(&json!(true)));
        assert_eq!(lookup_path(&doc, "name"), Some(&json!("Ada")));
        assert_eq!(lookup_path(&doc, "name.first"), None);
        assert_eq!(lookup_path(&doc, "missing"), None);
    }

    #[test]
    fn test_requester_owns_target() {
        let universe = UniverseState::default();
        let doc = json!({"_id": "u1"});

        let owner = Requester::hacker("u1");
        let ctx = CheckContext::for_target(&owner, Some(&doc), &universe);
        assert!(ctx.requester_owns_target());

        let other = Requester::hacker("u2");
        let ctx = CheckContext::for_target(&other, Some(&doc), &universe);
        assert!(!ctx.requester_owns_target());

        let anon = Requester::anonymous();
        let ctx = CheckContext::for_target(&anon, Some(&doc), &universe);
        assert!(!ctx.requester_owns_target());
    }

    #[test]
    fn test_at_field_keeps_outer_context() {
        let universe = UniverseState::default();
        let user = Requester::hacker("u1");
        let doc = json!({"_id": "u1"});
        let submission = json!({"name": "Ada"});
        let ctx = CheckContext::for_write(&user, Some(&doc), &submission, &universe);

        let value = json!("Ada");
        let leaf = ctx.at_field(Some(&value));
        assert_eq!(leaf.field_value, Some(&value));
        assert_eq!(leaf.submission_at("name"), Some(&value));
        assert!(leaf.requester_owns_target());
    }
}
