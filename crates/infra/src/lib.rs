//! Infrastructure layer: event and snapshot stores, per-aggregate controllers.

pub mod config;
pub mod controller;
pub mod event_store;
pub mod registry;
pub mod snapshot_store;

pub use config::ControllerConfig;
pub use controller::{ControllerError, ControllerHandle, EventOf, Executed, spawn_controller};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent};
pub use registry::ControllerRegistry;
pub use snapshot_store::{
    InMemorySnapshotStore, NoSnapshots, SnapshotRecord, SnapshotStore, SnapshotStoreError,
};
