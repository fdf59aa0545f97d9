// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.

use std::collections::BTreeSet;

use crate::{AccessLevel, Authz, NodeId, Principal, UserGroupId, UserId};

/// Print `tracing` output of the model when `RUST_LOG` is set.
pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// A model with one tree, two users and one group which contains both users.
pub struct Fixture {
    pub authz: Authz,
    pub root: NodeId,
    pub alice: UserId,
    pub bob: UserId,
    pub developers: UserGroupId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut authz = Authz::new();
        let root = authz.create_tree();
        let alice = authz.create_user("alice", None);
        let bob = authz.create_user("bob", Some("b"));
        let developers = authz.create_user_group("developers");
        authz
            .add_user_to_group(developers, alice)
            .expect("alice exists");
        authz.add_user_to_group(developers, bob).expect("bob exists");

        Self {
            authz,
            root,
            alice,
            bob,
            developers,
        }
    }

    /// Add a read-write rule for `principal` at `path`.
    pub fn grant(&mut self, path: &str, principal: impl Into<Principal>) -> NodeId {
        self.authz
            .create_access_rule_at_path(
                self.root,
                path,
                principal.into(),
                AccessLevel::ReadWrite,
                false,
            )
            .expect("principal exists")
            .node()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Every node reachable from any tree root, depth-first.
pub fn all_nodes(authz: &Authz) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut stack: Vec<NodeId> = authz.trees().collect();
    while let Some(id) = stack.pop() {
        let node = authz.node(id).expect("reachable nodes exist");
        stack.extend(node.children().values().copied());
        nodes.push(id);
    }
    nodes
}

/// Panic unless every principal's back-references match the rules found in all trees.
pub fn assert_back_references_consistent(authz: &Authz) {
    for (id, user) in authz.users() {
        let expected: BTreeSet<NodeId> = all_nodes(authz)
            .into_iter()
            .filter(|node| {
                authz
                    .node(*node)
                    .and_then(|node| node.access_rule(&Principal::User(id)))
                    .is_some()
            })
            .collect();
        assert_eq!(user.access_rules(), &expected, "back-references of {id}");
    }

    for (id, group) in authz.user_groups() {
        let expected: BTreeSet<NodeId> = all_nodes(authz)
            .into_iter()
            .filter(|node| {
                authz
                    .node(*node)
                    .and_then(|node| node.access_rule(&Principal::UserGroup(id)))
                    .is_some()
            })
            .collect();
        assert_eq!(group.access_rules(), &expected, "back-references of {id}");
    }

    for id in all_nodes(authz) {
        for rule in authz.node(id).expect("reachable nodes exist").access_rules() {
            assert_eq!(rule.node(), id, "rule stored under foreign node");
            let known = match rule.principal() {
                Principal::User(user) => authz.user(user).is_some(),
                Principal::UserGroup(group) => authz.user_group(group).is_some(),
            };
            assert!(known, "rule at {id} names deleted principal {}", rule.principal());
        }
    }
}
