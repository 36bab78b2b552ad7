// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use graft_api::ApiError;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ANONYMOUS: &str = "anonymous";

/// Caller identity as established by the transport.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(ANONYMOUS.to_string())
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    List,
    Create,
    Update,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
        }
    }

    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Decides whether `actor` may perform `action` on `resource` (a type name or a global id).
pub trait AuthorizationGate: Send + Sync {
    fn check(&self, actor: &Actor, action: Action, resource: &str) -> Decision;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationGate for AllowAll {
    fn check(&self, _actor: &Actor, _action: Action, _resource: &str) -> Decision {
        Decision::Allow
    }
}

/// Allows everything except explicit `(actor, action)` denials, optionally refusing writes
/// from anonymous callers.
#[derive(Debug, Clone, Default)]
pub struct DenyListGate {
    denied: BTreeSet<(Actor, Action)>,
    deny_anonymous_writes: bool,
}

impl DenyListGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn deny(mut self, actor: Actor, action: Action) -> Self {
        self.denied.insert((actor, action));
        self
    }

    #[must_use]
    pub fn deny_anonymous_writes(mut self, enabled: bool) -> Self {
        self.deny_anonymous_writes = enabled;
        self
    }
}

impl AuthorizationGate for DenyListGate {
    fn check(&self, actor: &Actor, action: Action, _resource: &str) -> Decision {
        if self.deny_anonymous_writes && actor.is_anonymous() && action.is_write() {
            return Decision::Deny;
        }
        if self.denied.contains(&(actor.clone(), action)) {
            return Decision::Deny;
        }
        Decision::Allow
    }
}

/// Asks the gate and turns a denial into `Unauthorized`. The gate's decision is final.
pub fn authorize(
    gate: &dyn AuthorizationGate,
    actor: &Actor,
    action: Action,
    resource: &str,
) -> Result<(), ApiError> {
    match gate.check(actor, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            warn!(actor = %actor, action = action.as_str(), resource, "authorization denied");
            Err(ApiError::unauthorized(action.as_str(), resource))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::ErrorCode;

    #[test]
    fn deny_list_blocks_only_listed_pairs() {
        let gate = DenyListGate::new().deny(Actor::new("mallory"), Action::Update);
        assert_eq!(
            gate.check(&Actor::new("mallory"), Action::Update, "User"),
            Decision::Deny
        );
        assert_eq!(
            gate.check(&Actor::new("mallory"), Action::Read, "User"),
            Decision::Allow
        );
        assert_eq!(
            gate.check(&Actor::new("alice"), Action::Update, "User"),
            Decision::Allow
        );
    }

    #[test]
    fn anonymous_writes_can_be_refused() {
        let gate = DenyListGate::new().deny_anonymous_writes(true);
        let err = authorize(&gate, &Actor::anonymous(), Action::Create, "Post")
            .expect_err("denied");
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert!(authorize(&gate, &Actor::anonymous(), Action::List, "Post").is_ok());
    }
}
