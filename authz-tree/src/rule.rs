// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

use crate::access::AccessLevel;
use crate::principal::{Principal, UserGroupId, UserId};
use crate::tree::NodeId;

/// Access rule for a user or user group, attached to one tree node.
///
/// The principal is fixed once the rule exists. Access level and exclusion flag can only be
/// changed through [`Authz::update_access_rule`](crate::Authz::update_access_rule).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRule {
    node: NodeId,
    principal: Principal,
    access_level: AccessLevel,
    exclusion: bool,
}

impl AccessRule {
    pub(crate) fn new(
        node: NodeId,
        principal: Principal,
        access_level: AccessLevel,
        exclusion: bool,
    ) -> Self {
        Self {
            node,
            principal,
            access_level,
            exclusion,
        }
    }

    /// Tree node where this rule resides.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    /// User this rule applies to, `None` for a user group rule.
    pub fn user(&self) -> Option<UserId> {
        self.principal.user()
    }

    /// User group this rule applies to, `None` for a user rule.
    pub fn user_group(&self) -> Option<UserGroupId> {
        self.principal.user_group()
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Returns true if the rule applies to everyone except the named principal.
    pub fn is_exclusion(&self) -> bool {
        self.exclusion
    }

    pub(crate) fn set_access_level(&mut self, access_level: AccessLevel) {
        self.access_level = access_level;
    }

    pub(crate) fn set_exclusion(&mut self, exclusion: bool) {
        self.exclusion = exclusion;
    }
}

impl Display for AccessRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} = {} @ {}",
            if self.exclusion { "~" } else { "" },
            self.principal,
            self.access_level,
            self.node
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::access::AccessLevel;
    use crate::principal::{Principal, UserGroupId, UserId};
    use crate::tree::{NodeId, TreeId};

    use super::AccessRule;

    #[test]
    fn setters_keep_principal() {
        let node = NodeId::new(TreeId(0), 3);
        let mut rule = AccessRule::new(
            node,
            Principal::User(UserId(7)),
            AccessLevel::ReadOnly,
            false,
        );
        assert_eq!(rule.node(), node);
        assert_eq!(rule.user(), Some(UserId(7)));
        assert_eq!(rule.user_group(), None);

        rule.set_access_level(AccessLevel::ReadWrite);
        rule.set_exclusion(true);
        assert_eq!(rule.access_level(), AccessLevel::ReadWrite);
        assert!(rule.is_exclusion());
        assert_eq!(rule.principal(), Principal::User(UserId(7)));
    }

    #[test]
    fn display_marks_exclusion() {
        let rule = AccessRule::new(
            NodeId::new(TreeId(1), 0),
            Principal::UserGroup(UserGroupId(2)),
            AccessLevel::None,
            true,
        );
        assert!(rule.to_string().starts_with("~group#2"));
    }
}
