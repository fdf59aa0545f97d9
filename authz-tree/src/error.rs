// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use crate::principal::{UserGroupId, UserId};
use crate::tree::{NodeId, TreeId};

/// Invalid arguments passed to an authz operation.
///
/// All checks happen before the first mutation, an operation returning an error has not changed
/// any state. Lookups which find nothing are not errors, they return `None`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("user {0} does not exist")]
    UnknownUser(UserId),

    #[error("user group {0} does not exist")]
    UnknownUserGroup(UserGroupId),

    #[error("invalid node name {0:?}")]
    InvalidNodeName(String),

    #[error("node {0} already has a child named {1:?}")]
    DuplicateNode(NodeId, String),

    #[error("operation not allowed on root node {0}")]
    RootNode(NodeId),

    #[error("source and target both belong to tree {0}")]
    AliasedTrees(TreeId),

    #[error("invalid access level token {0:?}")]
    InvalidAccessLevel(String),
}
