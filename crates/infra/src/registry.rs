//! Lazily spawned controllers, one per aggregate identity.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

use appfold_core::AggregateId;
use appfold_events::{CommandHandler, Event};

use crate::config::ControllerConfig;
use crate::controller::{ControllerHandle, EventOf, Executed, ControllerError, spawn_controller};
use crate::event_store::EventStore;
use crate::snapshot_store::SnapshotStore;

/// Routes commands to the single controller owning each aggregate.
///
/// A controller that exited (shutdown or idle timeout) is replaced by a fresh
/// one on the next lookup; the new controller reloads from the stores. A
/// controller that reports `Faulted` is evicted, so once the stored data is
/// repaired the next command runs on a fresh controller.
pub struct ControllerRegistry<H: CommandHandler> {
    handler: Arc<H>,
    events: Arc<dyn EventStore>,
    snapshots: Arc<dyn SnapshotStore>,
    config: ControllerConfig,
    controllers: RwLock<HashMap<AggregateId, ControllerHandle<H>>>,
}

impl<H> ControllerRegistry<H>
where
    H: CommandHandler,
    H::State: Serialize + DeserializeOwned,
    EventOf<H>: Event + Serialize + DeserializeOwned,
{
    pub fn new(
        handler: Arc<H>,
        events: Arc<dyn EventStore>,
        snapshots: Arc<dyn SnapshotStore>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            handler,
            events,
            snapshots,
            config,
            controllers: RwLock::new(HashMap::new()),
        }
    }

    /// Handle to the live controller for `id`, spawning one if needed.
    pub async fn get(&self, id: AggregateId) -> ControllerHandle<H> {
        {
            let controllers = self.controllers.read().await;
            if let Some(handle) = controllers.get(&id)
                && handle.is_alive()
            {
                return handle.clone();
            }
        }

        let mut controllers = self.controllers.write().await;
        // Another caller may have spawned it while we waited for the write lock.
        if let Some(handle) = controllers.get(&id)
            && handle.is_alive()
        {
            return handle.clone();
        }

        // Dead handles still pin their last published snapshot.
        controllers.retain(|_, handle| handle.is_alive());

        debug!(aggregate_id = %id, "spawning controller");
        let handle = spawn_controller(
            id,
            Arc::clone(&self.handler),
            Arc::clone(&self.events),
            Arc::clone(&self.snapshots),
            self.config.clone(),
        );
        controllers.insert(id, handle.clone());
        handle
    }

    pub async fn execute(
        &self,
        id: AggregateId,
        command: H::Cmd,
    ) -> Result<Executed<EventOf<H>, H::Output>, ControllerError> {
        let handle = self.get(id).await;
        let result = handle.execute(command).await;
        self.evict_if_faulted(&handle, &result).await;
        result
    }

    pub async fn state(&self, id: AggregateId) -> Result<H::State, ControllerError> {
        let handle = self.get(id).await;
        let result = handle.state().await;
        self.evict_if_faulted(&handle, &result).await;
        result
    }

    /// Stop and forget the controller for `id`, if any.
    pub async fn evict(&self, id: AggregateId) {
        let removed = self.controllers.write().await.remove(&id);
        if let Some(handle) = removed {
            debug!(aggregate_id = %id, "evicting controller");
            handle.shutdown().await;
        }
    }

    async fn evict_if_faulted<T>(
        &self,
        handle: &ControllerHandle<H>,
        result: &Result<T, ControllerError>,
    ) {
        if !matches!(result, Err(ControllerError::Faulted(_))) {
            return;
        }
        let mut controllers = self.controllers.write().await;
        // Only drop the entry if it still points at the faulted controller.
        let same = controllers
            .get(&handle.id())
            .is_some_and(|cached| cached.same_controller(handle));
        if same {
            controllers.remove(&handle.id());
            drop(controllers);
            debug!(aggregate_id = %handle.id(), "evicting faulted controller");
            handle.shutdown().await;
        }
    }

    /// Number of cached handles, live or not.
    pub async fn cached_count(&self) -> usize {
        self.controllers.read().await.len()
    }

    /// Number of cached controllers that are still running.
    pub async fn live_count(&self) -> usize {
        self.controllers
            .read()
            .await
            .values()
            .filter(|h| h.is_alive())
            .count()
    }

    /// Stop every controller and forget them.
    pub async fn shutdown_all(&self) {
        let handles: Vec<_> = self.controllers.write().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.shutdown().await;
        }
    }
}
