//! Hierarchy indexer: derived, read-only views over a collected goal set.
//!
//! The parent map here comes purely from each goal's declared `parent_key`.
//! That view may disagree with another node's `child_keys` (the traversal's
//! edge source); both views are kept as-is, never reconciled.

use std::collections::{HashMap, HashSet};

use crate::goal::Goal;

/// Fallback category for goals whose root ancestor is unmapped.
pub const OTHER_CATEGORY: &str = "Other";

/// Root-goal-name -> category table, supplied by configuration
/// (`Config::category_table`).
pub type CategoryTable = HashMap<String, String>;

/// Parent/children index over one collected goal set.
pub struct HierarchyIndex<'a> {
    goals: HashMap<&'a str, &'a Goal>,
    /// Child keys per parent, in collection order.
    children: HashMap<&'a str, Vec<&'a str>>,
    /// Keys in collection order, for stable root enumeration.
    order: Vec<&'a str>,
}

impl<'a> HierarchyIndex<'a> {
    pub fn build(goals: &'a [Goal]) -> Self {
        let mut index = Self {
            goals: HashMap::new(),
            children: HashMap::new(),
            order: Vec::new(),
        };

        for goal in goals {
            index.goals.insert(&goal.key, goal);
            index.order.push(&goal.key);
        }

        for goal in goals {
            if let Some(parent) = goal.parent_key.as_deref() {
                index.children.entry(parent).or_default().push(&goal.key);
            }
        }

        index
    }

    pub fn get(&self, key: &str) -> Option<&Goal> {
        self.goals.get(key).copied()
    }

    /// Declared parent of `key`, resolved or not.
    pub fn parent_of(&self, key: &str) -> Option<&str> {
        self.goals.get(key).and_then(|g| g.parent_key.as_deref())
    }

    /// Keys whose declared parent is `key`, in collection order.
    pub fn children_of(&self, key: &str) -> &[&'a str] {
        self.children.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Forest roots: goals with no parent, or a parent that never resolved
    /// within this set.
    pub fn roots(&self) -> Vec<&'a str> {
        self.order
            .iter()
            .filter(|key| match self.parent_of(key) {
                None => true,
                Some(parent) => !self.goals.contains_key(parent),
            })
            .copied()
            .collect()
    }

    /// Walk parent links from `key` to the top of its tree.
    ///
    /// Stops at a goal with no parent, an unresolved parent reference, or a
    /// key already seen during this walk (a parent cycle), returning the last
    /// good key. A key absent from the set is its own root.
    pub fn root_ancestor(&self, key: &'a str) -> &'a str {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = key;

        loop {
            seen.insert(current);
            let Some(parent) = self.parent_of(current) else {
                return current;
            };
            match self.goals.get(parent).copied() {
                Some(next) if !seen.contains(next.key.as_str()) => current = next.key.as_str(),
                _ => return current,
            }
        }
    }

    /// Every key reachable from `key` through the declared-parent view,
    /// depth-first. Fresh visited set per query; `key` itself is excluded.
    pub fn descendants(&self, key: &str) -> HashSet<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<&str> = self.children_of(key).to_vec();

        while let Some(current) = stack.pop() {
            if !visited.insert(current.to_string()) {
                continue;
            }
            for &child in self.children_of(current) {
                if !visited.contains(child) {
                    stack.push(child);
                }
            }
        }

        visited
    }

    /// Category of `key`'s root ancestor per the supplied table,
    /// [`OTHER_CATEGORY`] when the root's name is unmapped.
    pub fn classify(&self, key: &'a str, table: &'a CategoryTable) -> &'a str {
        let root = self.root_ancestor(key);
        self.get(root)
            .and_then(|goal| table.get(&goal.name))
            .map(String::as_str)
            .unwrap_or(OTHER_CATEGORY)
    }
}
