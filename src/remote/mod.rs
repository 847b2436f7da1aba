//! Remote goal fetcher: the Townsquare GraphQL gateway boundary.
//!
//! Everything past this module works with the strongly-typed [`crate::Goal`];
//! the raw `serde_json::Value` payload shape never escapes the
//! fetcher/normalizer boundary.

mod client;
pub mod queries;

pub use client::TownsquareClient;

use serde_json::Value;
use thiserror::Error;

/// Soft, per-goal fetch failure.
///
/// Not convertible into [`crate::OkrsnapError`] on purpose: a single goal
/// failing to resolve must never abort the run. The traversal engine records
/// the key in its failed set and moves on.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("HTTP {0}: {1}")]
    Status(u16, String),
    #[error("response carried no goal data")]
    MissingGoal,
}

/// Source of raw goal records.
///
/// Implemented by [`TownsquareClient`] for production and by in-memory mocks
/// in traversal tests. Calls are async but issued strictly one at a time.
#[allow(async_fn_in_trait)]
pub trait GoalFetcher {
    /// Fetch one goal's full detail record. Transport errors, non-2xx
    /// responses and a missing/null `data.goal` field are all soft failures.
    async fn fetch_goal_detail(&self, key: &str) -> Result<Value, FetchError>;

    /// Fetch the directory-view snapshot: the ordered list of root goal keys,
    /// draining all pages before returning. A remote failure here is fatal
    /// for the run (no roots means nothing to traverse), hence the crate
    /// error type.
    async fn fetch_initial_roots(&self) -> crate::Result<Vec<String>>;
}
