pub mod config;
pub mod error;
pub mod goal;
pub mod hierarchy;
pub mod normalize;
pub mod remote;
pub mod sink;
pub mod snapshot;
pub mod traverse;

pub use config::Config;
pub use error::{OkrsnapError, Result};
pub use goal::Goal;
pub use hierarchy::{CategoryTable, HierarchyIndex};
pub use remote::{FetchError, GoalFetcher, TownsquareClient};
pub use sink::{FileSink, SnapshotSink};
pub use traverse::{TraversalEngine, TraversalOutcome};
