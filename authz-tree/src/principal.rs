// SPDX-License-Identifier: MIT OR Apache-2.0

//! Users and user groups, the principals an access rule can name.
//!
//! Principals never create rules themselves. Their back-reference sets are maintained by
//! [`Authz`](crate::Authz) whenever a rule naming them is created or removed.

use std::collections::BTreeSet;
use std::fmt::Display;

use crate::tree::NodeId;

/// Handle of a user registered in an [`Authz`](crate::Authz) model.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct UserId(pub(crate) u64);

/// Handle of a user group registered in an [`Authz`](crate::Authz) model.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct UserGroupId(pub(crate) u64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

impl Display for UserGroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Target of an access rule, either a single user or a user group.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Principal {
    User(UserId),
    UserGroup(UserGroupId),
}

impl Principal {
    /// Return the user id if this principal is a user.
    pub fn user(&self) -> Option<UserId> {
        match self {
            Principal::User(id) => Some(*id),
            Principal::UserGroup(_) => None,
        }
    }

    /// Return the user group id if this principal is a user group.
    pub fn user_group(&self) -> Option<UserGroupId> {
        match self {
            Principal::User(_) => None,
            Principal::UserGroup(id) => Some(*id),
        }
    }

    /// Return true if this principal is a user group.
    pub fn is_user_group(&self) -> bool {
        matches!(self, Principal::UserGroup(_))
    }

    /// Return true if this principal is a single user.
    pub fn is_user(&self) -> bool {
        !self.is_user_group()
    }
}

impl From<UserId> for Principal {
    fn from(id: UserId) -> Self {
        Principal::User(id)
    }
}

impl From<UserGroupId> for Principal {
    fn from(id: UserGroupId) -> Self {
        Principal::UserGroup(id)
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principal::User(id) => write!(f, "{}", id),
            Principal::UserGroup(id) => write!(f, "{}", id),
        }
    }
}

/// A single user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
    pub(crate) access_rules: BTreeSet<NodeId>,
}

impl User {
    pub(crate) fn new(name: &str, alias: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            alias: alias.map(ToOwned::to_owned),
            access_rules: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias under which the user is referenced in the `[aliases]` section, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Nodes holding an access rule for this user.
    pub fn access_rules(&self) -> &BTreeSet<NodeId> {
        &self.access_rules
    }
}

/// A named set of users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserGroup {
    pub(crate) name: String,
    pub(crate) users: BTreeSet<UserId>,
    pub(crate) access_rules: BTreeSet<NodeId>,
}

impl UserGroup {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            users: BTreeSet::new(),
            access_rules: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members of this group.
    pub fn users(&self) -> &BTreeSet<UserId> {
        &self.users
    }

    /// Nodes holding an access rule for this group.
    pub fn access_rules(&self) -> &BTreeSet<NodeId> {
        &self.access_rules
    }
}
