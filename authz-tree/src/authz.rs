// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner of all path trees and principals of one authz document.
//!
//! Rules live inside their node, keyed by principal, so a node holds at most one rule per
//! principal. Each principal keeps the set of nodes holding a rule for it. Both indices are only
//! written by the methods of [`Authz`], which validate every argument before the first mutation.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::access::AccessLevel;
use crate::error::AuthzError;
use crate::path::{join_path, split_path, validate_name};
use crate::principal::{Principal, User, UserGroup, UserGroupId, UserId};
use crate::rule::AccessRule;
use crate::tree::{NodeId, PathTree, TreeId, TreeNode};

/// In-memory authorization model: path trees with access rules for users and user groups.
#[derive(Debug, Default)]
pub struct Authz {
    trees: BTreeMap<TreeId, PathTree>,
    users: BTreeMap<UserId, User>,
    user_groups: BTreeMap<UserGroupId, UserGroup>,
    next_tree_id: u64,
    next_user_id: u64,
    next_user_group_id: u64,
}

impl Authz {
    pub fn new() -> Self {
        Self::default()
    }

    // Trees
    // ---------------------------------------------------------------------------------------------

    /// Create a new, empty tree and return its root node.
    pub fn create_tree(&mut self) -> NodeId {
        let id = TreeId(self.next_tree_id);
        self.next_tree_id += 1;

        let tree = PathTree::new(id);
        let root = tree.root();
        self.trees.insert(id, tree);
        debug!(%id, "created tree");
        root
    }

    /// Root nodes of all trees, in creation order.
    pub fn trees(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.trees.values().map(PathTree::root)
    }

    /// Drop the whole tree `node` belongs to, together with all its rules.
    pub fn delete_tree(&mut self, node: NodeId) -> Result<(), AuthzError> {
        self.check_node(node)?;
        let Some(tree) = self.trees.remove(&node.tree()) else {
            return Err(AuthzError::UnknownNode(node));
        };

        for (id, removed) in tree.into_nodes() {
            self.unlink_rules(id, removed.access_rules.into_keys());
        }
        debug!(tree = %node.tree(), "deleted tree");
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.trees.get(&id.tree()).and_then(|tree| tree.get(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.trees
            .get_mut(&id.tree())
            .and_then(|tree| tree.get_mut(id))
    }

    fn check_node(&self, id: NodeId) -> Result<&TreeNode, AuthzError> {
        self.node(id).ok_or(AuthzError::UnknownNode(id))
    }

    /// Create a named child under `parent`.
    ///
    /// Fails if the name is empty or contains a slash, or if `parent` already has a child with
    /// that name.
    pub fn create_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, AuthzError> {
        validate_name(name)?;
        if self.check_node(parent)?.child(name).is_some() {
            return Err(AuthzError::DuplicateNode(parent, name.to_owned()));
        }

        let tree = self
            .trees
            .get_mut(&parent.tree())
            .ok_or(AuthzError::UnknownNode(parent))?;
        Ok(tree.insert_child(parent, name))
    }

    /// Walk from `from` along `path`, one segment at a time.
    ///
    /// Returns `None` if a segment is missing or `from` does not exist. Never creates nodes.
    pub fn find_by_path(&self, from: NodeId, path: &str) -> Option<NodeId> {
        let mut current = from;
        self.node(current)?;
        for segment in split_path(path) {
            current = self.node(current)?.child(segment)?;
        }
        Some(current)
    }

    /// Walk from `from` along `path`, creating every missing segment as a new child without
    /// rules. The root path returns `from` itself.
    pub fn build_tree(&mut self, from: NodeId, path: &str) -> Result<NodeId, AuthzError> {
        self.check_node(from)?;
        let tree = self
            .trees
            .get_mut(&from.tree())
            .ok_or(AuthzError::UnknownNode(from))?;

        let mut current = from;
        for segment in split_path(path) {
            let existing = tree.get(current).and_then(|node| node.child(segment));
            current = match existing {
                Some(child) => child,
                None => tree.insert_child(current, segment),
            };
        }
        Ok(current)
    }

    /// Absolute path of `node` within its tree, "/" for a root.
    pub fn path_of(&self, node: NodeId) -> Option<String> {
        let tree = self.trees.get(&node.tree())?;
        let segments = tree.relative_segments(tree.root(), node)?;
        Some(join_path(segments))
    }

    /// Detach `node` from its parent, removing its subtree and every rule inside it.
    pub fn delete_node(&mut self, node: NodeId) -> Result<(), AuthzError> {
        if self.check_node(node)?.is_root() {
            return Err(AuthzError::RootNode(node));
        }
        let tree = self
            .trees
            .get_mut(&node.tree())
            .ok_or(AuthzError::UnknownNode(node))?;

        let removed = tree.detach(node);
        debug!(%node, count = removed.len(), "deleted nodes");
        for (id, removed) in removed {
            self.unlink_rules(id, removed.access_rules.into_keys());
        }
        Ok(())
    }

    // Principals
    // ---------------------------------------------------------------------------------------------

    pub fn create_user(&mut self, name: &str, alias: Option<&str>) -> UserId {
        let id = UserId(self.next_user_id);
        self.next_user_id += 1;
        self.users.insert(id, User::new(name, alias));
        id
    }

    pub fn create_user_group(&mut self, name: &str) -> UserGroupId {
        let id = UserGroupId(self.next_user_group_id);
        self.next_user_group_id += 1;
        self.user_groups.insert(id, UserGroup::new(name));
        id
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn user_group(&self, id: UserGroupId) -> Option<&UserGroup> {
        self.user_groups.get(&id)
    }

    pub fn users(&self) -> impl Iterator<Item = (UserId, &User)> {
        self.users.iter().map(|(id, user)| (*id, user))
    }

    pub fn user_groups(&self) -> impl Iterator<Item = (UserGroupId, &UserGroup)> {
        self.user_groups.iter().map(|(id, group)| (*id, group))
    }

    pub fn find_user_by_name(&self, name: &str) -> Option<UserId> {
        self.users
            .iter()
            .find(|(_, user)| user.name == name)
            .map(|(id, _)| *id)
    }

    pub fn find_user_group_by_name(&self, name: &str) -> Option<UserGroupId> {
        self.user_groups
            .iter()
            .find(|(_, group)| group.name == name)
            .map(|(id, _)| *id)
    }

    pub fn rename_user(&mut self, id: UserId, name: &str) -> Result<(), AuthzError> {
        let user = self.users.get_mut(&id).ok_or(AuthzError::UnknownUser(id))?;
        user.name = name.to_owned();
        Ok(())
    }

    pub fn rename_user_group(&mut self, id: UserGroupId, name: &str) -> Result<(), AuthzError> {
        let group = self
            .user_groups
            .get_mut(&id)
            .ok_or(AuthzError::UnknownUserGroup(id))?;
        group.name = name.to_owned();
        Ok(())
    }

    pub fn add_user_to_group(&mut self, group: UserGroupId, user: UserId) -> Result<(), AuthzError> {
        self.check_principal(Principal::User(user))?;
        let group = self
            .user_groups
            .get_mut(&group)
            .ok_or(AuthzError::UnknownUserGroup(group))?;
        group.users.insert(user);
        Ok(())
    }

    /// Remove `user` from `group`. A no-op if the user is not a member.
    pub fn remove_user_from_group(
        &mut self,
        group: UserGroupId,
        user: UserId,
    ) -> Result<(), AuthzError> {
        self.check_principal(Principal::User(user))?;
        let group = self
            .user_groups
            .get_mut(&group)
            .ok_or(AuthzError::UnknownUserGroup(group))?;
        group.users.remove(&user);
        Ok(())
    }

    /// Groups `user` is a direct member of.
    pub fn user_groups_of(&self, user: UserId) -> Result<BTreeSet<UserGroupId>, AuthzError> {
        self.check_principal(Principal::User(user))?;
        Ok(self
            .user_groups
            .iter()
            .filter(|(_, group)| group.users.contains(&user))
            .map(|(id, _)| *id)
            .collect())
    }

    /// Remove a user, every rule naming it and its group memberships.
    pub fn delete_user(&mut self, id: UserId) -> Result<(), AuthzError> {
        let user = self.users.remove(&id).ok_or(AuthzError::UnknownUser(id))?;
        for node in &user.access_rules {
            if let Some(node) = self.node_mut(*node) {
                node.access_rules.remove(&Principal::User(id));
            }
        }
        for group in self.user_groups.values_mut() {
            group.users.remove(&id);
        }
        debug!(%id, rules = user.access_rules.len(), "deleted user");
        Ok(())
    }

    /// Remove a user group and every rule naming it. Member users are kept.
    pub fn delete_user_group(&mut self, id: UserGroupId) -> Result<(), AuthzError> {
        let group = self
            .user_groups
            .remove(&id)
            .ok_or(AuthzError::UnknownUserGroup(id))?;
        for node in &group.access_rules {
            if let Some(node) = self.node_mut(*node) {
                node.access_rules.remove(&Principal::UserGroup(id));
            }
        }
        debug!(%id, rules = group.access_rules.len(), "deleted user group");
        Ok(())
    }

    fn check_principal(&self, principal: Principal) -> Result<(), AuthzError> {
        match principal {
            Principal::User(id) if !self.users.contains_key(&id) => {
                Err(AuthzError::UnknownUser(id))
            }
            Principal::UserGroup(id) if !self.user_groups.contains_key(&id) => {
                Err(AuthzError::UnknownUserGroup(id))
            }
            _ => Ok(()),
        }
    }

    fn back_references_mut(&mut self, principal: Principal) -> Option<&mut BTreeSet<NodeId>> {
        match principal {
            Principal::User(id) => self.users.get_mut(&id).map(|user| &mut user.access_rules),
            Principal::UserGroup(id) => self
                .user_groups
                .get_mut(&id)
                .map(|group| &mut group.access_rules),
        }
    }

    // Access rules
    // ---------------------------------------------------------------------------------------------

    /// Attach a rule for `principal` to `node`, replacing any rule the principal already has
    /// there.
    pub fn create_access_rule(
        &mut self,
        node: NodeId,
        principal: Principal,
        access_level: AccessLevel,
        exclusion: bool,
    ) -> Result<&AccessRule, AuthzError> {
        self.check_principal(principal)?;
        self.check_node(node)?;
        self.insert_rule(node, principal, access_level, exclusion)
    }

    /// Like [`Authz::create_access_rule`] but resolves `path` from `from` first, creating any
    /// missing node on the way.
    pub fn create_access_rule_at_path(
        &mut self,
        from: NodeId,
        path: &str,
        principal: Principal,
        access_level: AccessLevel,
        exclusion: bool,
    ) -> Result<&AccessRule, AuthzError> {
        self.check_principal(principal)?;
        let node = self.build_tree(from, path)?;
        self.insert_rule(node, principal, access_level, exclusion)
    }

    pub fn create_access_rule_for_user(
        &mut self,
        node: NodeId,
        user: UserId,
        access_level: AccessLevel,
        exclusion: bool,
    ) -> Result<&AccessRule, AuthzError> {
        self.create_access_rule(node, Principal::User(user), access_level, exclusion)
    }

    pub fn create_access_rule_for_user_group(
        &mut self,
        node: NodeId,
        group: UserGroupId,
        access_level: AccessLevel,
        exclusion: bool,
    ) -> Result<&AccessRule, AuthzError> {
        self.create_access_rule(node, Principal::UserGroup(group), access_level, exclusion)
    }

    pub fn create_access_rule_for_user_at_path(
        &mut self,
        from: NodeId,
        path: &str,
        user: UserId,
        access_level: AccessLevel,
        exclusion: bool,
    ) -> Result<&AccessRule, AuthzError> {
        self.create_access_rule_at_path(from, path, Principal::User(user), access_level, exclusion)
    }

    pub fn create_access_rule_for_user_group_at_path(
        &mut self,
        from: NodeId,
        path: &str,
        group: UserGroupId,
        access_level: AccessLevel,
        exclusion: bool,
    ) -> Result<&AccessRule, AuthzError> {
        self.create_access_rule_at_path(
            from,
            path,
            Principal::UserGroup(group),
            access_level,
            exclusion,
        )
    }

    /// Rule for `principal` directly on `node`. `Ok(None)` if there is none or the node does not
    /// exist.
    pub fn find_access_rule(
        &self,
        node: NodeId,
        principal: Principal,
    ) -> Result<Option<&AccessRule>, AuthzError> {
        self.check_principal(principal)?;
        Ok(self
            .node(node)
            .and_then(|node| node.access_rule(&principal)))
    }

    /// Rule for `principal` at `path` below `from`. Never creates nodes.
    pub fn find_access_rule_at_path(
        &self,
        from: NodeId,
        path: &str,
        principal: Principal,
    ) -> Result<Option<&AccessRule>, AuthzError> {
        self.check_principal(principal)?;
        let Some(node) = self.find_by_path(from, path) else {
            return Ok(None);
        };
        self.find_access_rule(node, principal)
    }

    pub fn find_access_rule_for_user(
        &self,
        node: NodeId,
        user: UserId,
    ) -> Result<Option<&AccessRule>, AuthzError> {
        self.find_access_rule(node, Principal::User(user))
    }

    pub fn find_access_rule_for_user_group(
        &self,
        node: NodeId,
        group: UserGroupId,
    ) -> Result<Option<&AccessRule>, AuthzError> {
        self.find_access_rule(node, Principal::UserGroup(group))
    }

    pub fn find_access_rule_for_user_at_path(
        &self,
        from: NodeId,
        path: &str,
        user: UserId,
    ) -> Result<Option<&AccessRule>, AuthzError> {
        self.find_access_rule_at_path(from, path, Principal::User(user))
    }

    pub fn find_access_rule_for_user_group_at_path(
        &self,
        from: NodeId,
        path: &str,
        group: UserGroupId,
    ) -> Result<Option<&AccessRule>, AuthzError> {
        self.find_access_rule_at_path(from, path, Principal::UserGroup(group))
    }

    /// Change level and exclusion flag of an existing rule. Returns `Ok(None)` if `principal` has
    /// no rule on `node`.
    pub fn update_access_rule(
        &mut self,
        node: NodeId,
        principal: Principal,
        access_level: AccessLevel,
        exclusion: bool,
    ) -> Result<Option<&AccessRule>, AuthzError> {
        self.check_principal(principal)?;
        let Some(rule) = self
            .node_mut(node)
            .and_then(|node| node.access_rules.get_mut(&principal))
        else {
            return Ok(None);
        };

        rule.set_access_level(access_level);
        rule.set_exclusion(exclusion);
        Ok(Some(&*rule))
    }

    /// Remove the rule for `principal` from `node`. A no-op if there is none.
    pub fn delete_access_rule(
        &mut self,
        node: NodeId,
        principal: Principal,
    ) -> Result<(), AuthzError> {
        self.check_principal(principal)?;
        self.remove_rule(node, principal);
        Ok(())
    }

    /// Remove the rule for `principal` at `path` below `from`. A no-op if the path does not
    /// resolve.
    pub fn delete_access_rule_at_path(
        &mut self,
        from: NodeId,
        path: &str,
        principal: Principal,
    ) -> Result<(), AuthzError> {
        self.check_principal(principal)?;
        if let Some(node) = self.find_by_path(from, path) {
            self.remove_rule(node, principal);
        }
        Ok(())
    }

    pub fn delete_access_rule_for_user(
        &mut self,
        node: NodeId,
        user: UserId,
    ) -> Result<(), AuthzError> {
        self.delete_access_rule(node, Principal::User(user))
    }

    pub fn delete_access_rule_for_user_group(
        &mut self,
        node: NodeId,
        group: UserGroupId,
    ) -> Result<(), AuthzError> {
        self.delete_access_rule(node, Principal::UserGroup(group))
    }

    pub fn delete_access_rule_for_user_at_path(
        &mut self,
        from: NodeId,
        path: &str,
        user: UserId,
    ) -> Result<(), AuthzError> {
        self.delete_access_rule_at_path(from, path, Principal::User(user))
    }

    pub fn delete_access_rule_for_user_group_at_path(
        &mut self,
        from: NodeId,
        path: &str,
        group: UserGroupId,
    ) -> Result<(), AuthzError> {
        self.delete_access_rule_at_path(from, path, Principal::UserGroup(group))
    }

    /// Remove every rule directly on `node`. Children are not touched.
    pub fn delete_all_access_rules(&mut self, node: NodeId) -> Result<(), AuthzError> {
        self.check_node(node)?;
        self.clear_rules(node);
        Ok(())
    }

    /// Remove every rule on `node` and all its descendants.
    pub fn delete_all_access_rules_in_tree(&mut self, node: NodeId) -> Result<(), AuthzError> {
        self.check_node(node)?;
        let subtree = self
            .trees
            .get(&node.tree())
            .map(|tree| tree.subtree(node))
            .unwrap_or_default();

        debug!(%node, nodes = subtree.len(), "deleting all access rules in tree");
        for id in subtree {
            self.clear_rules(id);
        }
        Ok(())
    }

    /// Re-create every rule found in the subtree of `source` at the same relative path below
    /// `target`, creating missing nodes on the way.
    ///
    /// Rules keep their principal, access level and exclusion flag. Existing rules for the same
    /// principal under `target` are replaced. Source and target must belong to different trees.
    pub fn clone_all_access_rules_in_tree(
        &mut self,
        source: NodeId,
        target: NodeId,
    ) -> Result<(), AuthzError> {
        self.check_node(source)?;
        self.check_node(target)?;
        if source.tree() == target.tree() {
            return Err(AuthzError::AliasedTrees(source.tree()));
        }

        let Some(tree) = self.trees.get(&source.tree()) else {
            return Err(AuthzError::UnknownNode(source));
        };

        let mut copies = Vec::new();
        for id in tree.subtree(source) {
            let (Some(node), Some(segments)) = (tree.get(id), tree.relative_segments(source, id))
            else {
                continue;
            };
            if !node.has_access_rules() {
                continue;
            }

            let path = join_path(segments);
            for rule in node.access_rules() {
                copies.push((
                    path.clone(),
                    rule.principal(),
                    rule.access_level(),
                    rule.is_exclusion(),
                ));
            }
        }

        debug!(%source, %target, rules = copies.len(), "cloning access rules");
        for (path, principal, access_level, exclusion) in copies {
            let node = self.build_tree(target, &path)?;
            self.insert_rule(node, principal, access_level, exclusion)?;
        }
        Ok(())
    }

    /// All rules naming `principal`, across every tree.
    pub fn access_rules_of(&self, principal: Principal) -> Result<Vec<&AccessRule>, AuthzError> {
        let nodes = match principal {
            Principal::User(id) => self.user(id).map(User::access_rules),
            Principal::UserGroup(id) => self.user_group(id).map(UserGroup::access_rules),
        };
        let Some(nodes) = nodes else {
            self.check_principal(principal)?;
            return Ok(Vec::new());
        };

        Ok(nodes
            .iter()
            .filter_map(|node| self.node(*node)?.access_rule(&principal))
            .collect())
    }

    /// Distinct users named by rules directly on `node`.
    pub fn extract_users_from_access_rules(&self, node: NodeId) -> BTreeSet<UserId> {
        self.node(node)
            .map(|node| node.access_rules().filter_map(AccessRule::user).collect())
            .unwrap_or_default()
    }

    /// Distinct user groups named by rules directly on `node`.
    pub fn extract_user_groups_from_access_rules(&self, node: NodeId) -> BTreeSet<UserGroupId> {
        self.node(node)
            .map(|node| {
                node.access_rules()
                    .filter_map(AccessRule::user_group)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Write a rule into both indices. Node and principal have been checked by the caller.
    fn insert_rule(
        &mut self,
        node: NodeId,
        principal: Principal,
        access_level: AccessLevel,
        exclusion: bool,
    ) -> Result<&AccessRule, AuthzError> {
        if let Some(back_references) = self.back_references_mut(principal) {
            back_references.insert(node);
        }
        trace!(%node, %principal, %access_level, exclusion, "insert access rule");

        let rule = AccessRule::new(node, principal, access_level, exclusion);
        let tree_node = self.node_mut(node).ok_or(AuthzError::UnknownNode(node))?;
        let rule = match tree_node.access_rules.entry(principal) {
            Entry::Occupied(mut entry) => {
                entry.insert(rule);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(rule),
        };
        Ok(rule)
    }

    fn remove_rule(&mut self, node: NodeId, principal: Principal) -> Option<AccessRule> {
        let rule = self.node_mut(node)?.access_rules.remove(&principal)?;
        if let Some(back_references) = self.back_references_mut(principal) {
            back_references.remove(&node);
        }
        trace!(%node, %principal, "removed access rule");
        Some(rule)
    }

    fn clear_rules(&mut self, node: NodeId) {
        let Some(tree_node) = self.node_mut(node) else {
            return;
        };
        let rules = std::mem::take(&mut tree_node.access_rules);
        self.unlink_rules(node, rules.into_keys());
    }

    /// Drop `node` from the back-reference sets of the given principals.
    fn unlink_rules<I>(&mut self, node: NodeId, principals: I)
    where
        I: IntoIterator<Item = Principal>,
    {
        for principal in principals {
            if let Some(back_references) = self.back_references_mut(principal) {
                back_references.remove(&node);
            }
        }
    }
}
