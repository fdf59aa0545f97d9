// SPDX-License-Identifier: MIT OR Apache-2.0

//! Path-indexed access control for Subversion-style `authz` files.
//!
//! An [`Authz`] model owns any number of path trees and the users and user groups referenced by
//! their access rules. Nodes are created on demand while resolving slash-delimited paths, rules
//! attach an [`AccessLevel`] for one [`Principal`] to one node.
//!
//! ```
//! use authz_tree::{AccessLevel, Authz};
//!
//! let mut authz = Authz::new();
//! let root = authz.create_tree();
//! let alice = authz.create_user("alice", None);
//!
//! authz
//!     .create_access_rule_for_user_at_path(root, "teamA/proj1", alice, AccessLevel::ReadWrite, false)
//!     .unwrap();
//!
//! let rule = authz
//!     .find_access_rule_for_user_at_path(root, "/teamA/proj1/", alice)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(rule.access_level(), AccessLevel::ReadWrite);
//! assert!(authz.find_access_rule_for_user_at_path(root, "teamA", alice).unwrap().is_none());
//! ```

mod access;
mod authz;
mod error;
pub mod path;
mod principal;
mod rule;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
mod tree;

pub use access::AccessLevel;
pub use authz::Authz;
pub use error::AuthzError;
pub use principal::{Principal, User, UserGroup, UserGroupId, UserId};
pub use rule::AccessRule;
pub use tree::{NodeId, ROOT_NODE_NAME, TreeId, TreeNode};
