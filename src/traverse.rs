//! Traversal engine: depth-first expansion of the goal forest.
//!
//! Owns the run's mutable state (visited/collected/failed) for exactly one
//! call; nothing else reads or writes it mid-run. Remote calls are issued one
//! at a time — no fan-out, no batching — which keeps the upstream rate-limit
//! surface as small as one browser tab's.

use std::collections::{BTreeSet, HashSet};

use crate::error::{OkrsnapError, Result};
use crate::goal::Goal;
use crate::normalize::normalize;
use crate::remote::GoalFetcher;

/// Result of one traversal run.
#[derive(Debug, Clone)]
pub struct TraversalOutcome {
    /// Every goal that resolved, in depth-first collection order. This order
    /// is what makes repeated runs over identical data byte-identical
    /// downstream.
    pub goals: Vec<Goal>,
    /// Keys whose fetch or normalization failed. Soft failures only; their
    /// siblings and ancestors are unaffected.
    pub failed: BTreeSet<String>,
}

impl TraversalOutcome {
    pub fn contains(&self, key: &str) -> bool {
        self.goals.iter().any(|g| g.key == key)
    }
}

/// Per-run working set. Created at run start, dropped after the outcome is
/// assembled; never persisted.
struct TraversalState {
    visited: HashSet<String>,
    collected: Vec<Goal>,
    collected_keys: HashSet<String>,
    failed: BTreeSet<String>,
    ceiling_hit: bool,
}

impl TraversalState {
    fn new() -> Self {
        Self {
            visited: HashSet::new(),
            collected: Vec::new(),
            collected_keys: HashSet::new(),
            failed: BTreeSet::new(),
            ceiling_hit: false,
        }
    }
}

/// Depth-first goal-graph walker over any [`GoalFetcher`].
pub struct TraversalEngine<F: GoalFetcher> {
    fetcher: F,
    max_goals: Option<usize>,
}

impl<F: GoalFetcher> TraversalEngine<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            max_goals: None,
        }
    }

    /// Cap the number of goals fetched in one run. Keys beyond the ceiling
    /// are skipped, not failed: the bound is policy, not an error.
    pub fn with_max_goals(mut self, max_goals: Option<usize>) -> Self {
        self.max_goals = max_goals;
        self
    }

    /// Run the full traversal: fetch the root list, expand every root
    /// depth-first, and assemble the outcome.
    ///
    /// Fatal only when there is nothing to start from or nothing resolved;
    /// individual goal failures land in [`TraversalOutcome::failed`].
    pub async fn run(&self) -> Result<TraversalOutcome> {
        let roots = self.fetcher.fetch_initial_roots().await?;
        if roots.is_empty() {
            return Err(OkrsnapError::EmptyRoots);
        }

        log::info!("Traversing {} root goal(s)", roots.len());

        let mut state = TraversalState::new();
        let mut succeeded_roots = 0usize;

        for root in &roots {
            self.expand(root, &mut state).await;
            // A root counts as processed when its own node resolved, whether
            // in this expansion or an earlier root's subtree.
            if state.collected_keys.contains(root) {
                succeeded_roots += 1;
            }
        }

        if succeeded_roots == 0 {
            return Err(OkrsnapError::NoProgress { failed: roots.len() });
        }

        log::info!(
            "Traversal complete: {} goals collected, {} failed ({}/{} roots resolved)",
            state.collected.len(),
            state.failed.len(),
            succeeded_roots,
            roots.len()
        );

        Ok(TraversalOutcome {
            goals: state.collected,
            failed: state.failed,
        })
    }

    /// Expand one root's subtree with an explicit stack, preorder.
    ///
    /// Keys are marked visited before their children are pushed, so a cycle
    /// re-entering any node on the current path short-circuits. Revisits are
    /// idempotent: one fetch per key per run, ever.
    async fn expand(&self, root: &str, state: &mut TraversalState) {
        let mut stack: Vec<(String, usize)> = vec![(root.to_string(), 0)];

        while let Some((key, depth)) = stack.pop() {
            if state.visited.contains(&key) {
                continue;
            }

            if let Some(max) = self.max_goals {
                if state.visited.len() >= max {
                    if !state.ceiling_hit {
                        log::warn!("Goal ceiling of {} reached; skipping remaining keys", max);
                        state.ceiling_hit = true;
                    }
                    continue;
                }
            }

            state.visited.insert(key.clone());

            let raw = match self.fetcher.fetch_goal_detail(&key).await {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("[depth {}] Failed to fetch {}: {}", depth, key, e);
                    state.failed.insert(key);
                    continue;
                }
            };

            let goal = match normalize(&raw) {
                Some(goal) => goal,
                None => {
                    log::warn!("[depth {}] Unusable record for {}", depth, key);
                    state.failed.insert(key);
                    continue;
                }
            };

            log::info!("[depth {}] Collected {} ({})", depth, goal.key, goal.name);

            // Reverse push so the first declared child is expanded next:
            // pure depth-first preorder, matching the declared sub-goal order.
            for child in goal.child_keys.iter().rev() {
                if !state.visited.contains(child) {
                    stack.push((child.clone(), depth + 1));
                }
            }

            state.collected_keys.insert(goal.key.clone());
            state.collected.push(goal);
        }
    }
}
