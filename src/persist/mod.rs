//! Persistence boundary — streamed JSONL node/edge records, snapshots,
//! and incremental sync.

pub mod jsonl;

pub use jsonl::{
    EdgeRecord, JsonlStore, LoadOptions, NodeRecord, StorageStats, StoreReport,
};
