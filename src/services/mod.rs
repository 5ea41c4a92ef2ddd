pub mod reconciler;
pub mod run_log;
pub mod snapshot_store;

pub use reconciler::{color_for, Reconciler, TEST_ACCOUNT, UNASSIGNED_REVIEWER};
pub use run_log::RunLog;
pub use snapshot_store::{Snapshot, SnapshotStore};
