//! assetsync-sync: reconciles a local asset tree with a bucket and applies
//! the resulting plan.
//!
//! - [`reconcile`]: pure planner over the two inventories
//! - [`retention`]: the keep-window predicate
//! - [`store`] / [`local_store`]: the bucket seam and its backends
//! - [`inventory`]: remote snapshot
//! - [`executor`]: applies a plan, isolating per-key failures
//! - [`pipeline`]: the steps of one run
//! - [`report`]: progress and findings sink

pub mod error;
pub mod executor;
pub mod inventory;
pub mod local_store;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod retention;
pub mod store;

pub use error::{StoreError, SyncError};
pub use executor::{execute, ActionOutcome, ExecutionReport};
pub use inventory::RemoteSnapshot;
pub use local_store::LocalDirStore;
pub use pipeline::{decide, plan, run, Decision};
pub use reconcile::reconcile;
pub use report::{LogReporter, RecordingReporter, Reporter};
pub use retention::is_evictable;
pub use store::{open, MemoryStore, ObjectAttributes, ObjectStore, StoredObject};
