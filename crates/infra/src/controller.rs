//! Per-aggregate controller: the single writer for one aggregate identity.
//!
//! Each controller is a tokio task that owns the in-memory snapshot of one
//! aggregate and drains a bounded mailbox one message at a time. A command is
//! fully handled (guards, external calls, commit, fold) before the next message is
//! read, so commands for the same identity never interleave, even while the
//! handler is suspended on a billing or identity lookup.
//!
//! ```text
//! Execute(command)
//!   -> load (checkpoint + tail replay) if not loaded
//!   -> handler.handle(&snapshot, command)   [under command_timeout]
//!   -> append(batch, Exact(snapshot.version))
//!   -> fold committed batch, republish snapshot, maybe checkpoint
//! ```
//!
//! Lifecycle: `Unloaded -> Active -> (Unloaded on conflict | Faulted)`. A
//! concurrency conflict or an unreachable store leaves the controller unloaded so
//! the next command reloads. Only integrity violations fault the controller, and a
//! faulted controller refuses every later message.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use appfold_core::{Aggregate, AggregateId, AggregateRoot, DomainError, ExpectedVersion};
use appfold_events::{Command, CommandHandler, Event, EventEnvelope, HandlerError};

use crate::config::ControllerConfig;
use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
use crate::snapshot_store::{SnapshotRecord, SnapshotStore, SnapshotStoreError};

/// Event type folded by handler `H`.
pub type EventOf<H> = <<H as CommandHandler>::State as Aggregate>::Event;

/// Why a command did not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// A guard refused the command. Nothing was committed.
    #[error("command rejected: {0}")]
    Rejected(DomainError),

    #[error("dependency '{service}' failed: {message}")]
    Dependency {
        service: &'static str,
        message: String,
    },

    #[error("command timed out")]
    Timeout,

    /// Another writer committed first. The controller reloads on the next command.
    #[error("concurrent modification: {0}")]
    Conflict(String),

    /// A store could not be reached. Nothing was committed and the command may be retried.
    #[error("store failure: {0}")]
    Store(String),

    /// The controller hit an inconsistency and refuses further work.
    #[error("controller faulted: {0}")]
    Faulted(String),

    #[error("command targets aggregate {target} but was sent to {owner}")]
    TargetMismatch {
        target: AggregateId,
        owner: AggregateId,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("controller is no longer running")]
    ControllerGone,
}

impl From<HandlerError> for ControllerError {
    fn from(value: HandlerError) -> Self {
        match value {
            HandlerError::Domain(err) => ControllerError::Rejected(err),
            HandlerError::Dependency { service, message } => {
                ControllerError::Dependency { service, message }
            }
        }
    }
}

impl From<EventStoreError> for ControllerError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => ControllerError::Conflict(msg),
            EventStoreError::Serialization(msg) => ControllerError::Serialization(msg),
            other => ControllerError::Store(other.to_string()),
        }
    }
}

impl From<SnapshotStoreError> for ControllerError {
    fn from(value: SnapshotStoreError) -> Self {
        ControllerError::Store(value.to_string())
    }
}

/// A completed command: the committed events (possibly none), the resulting
/// stream version and the handler's output.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed<E, O> {
    pub events: Vec<EventEnvelope<E>>,
    pub version: u64,
    pub output: O,
}

type ExecuteResult<H> =
    Result<Executed<EventOf<H>, <H as CommandHandler>::Output>, ControllerError>;

enum ControllerMessage<H: CommandHandler> {
    Execute {
        command: H::Cmd,
        reply: oneshot::Sender<ExecuteResult<H>>,
    },
    GetState {
        reply: oneshot::Sender<Result<H::State, ControllerError>>,
    },
    Shutdown,
}

/// Why a load did not produce a snapshot.
enum LoadError {
    /// The stores failed; retrying later may succeed.
    Store(ControllerError),
    /// What the stores hold cannot be folded into a trustworthy snapshot.
    Integrity(String),
}

enum Lifecycle<S> {
    Unloaded,
    Active(S),
    Faulted(String),
}

/// Cloneable async handle to a running controller.
pub struct ControllerHandle<H: CommandHandler> {
    id: AggregateId,
    sender: mpsc::Sender<ControllerMessage<H>>,
    snapshots: watch::Receiver<H::State>,
}

// Manual `Clone`: `H` itself need not be `Clone`.
impl<H: CommandHandler> Clone for ControllerHandle<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sender: self.sender.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<H: CommandHandler> std::fmt::Debug for ControllerHandle<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<H: CommandHandler> ControllerHandle<H> {
    pub fn id(&self) -> AggregateId {
        self.id
    }

    /// Send a command and wait until it is committed or refused.
    pub async fn execute(&self, command: H::Cmd) -> ExecuteResult<H> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ControllerMessage::Execute { command, reply })
            .await
            .map_err(|_| ControllerError::ControllerGone)?;
        rx.await.map_err(|_| ControllerError::ControllerGone)?
    }

    /// The current snapshot, loading it first if needed.
    pub async fn state(&self) -> Result<H::State, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ControllerMessage::GetState { reply })
            .await
            .map_err(|_| ControllerError::ControllerGone)?;
        rx.await.map_err(|_| ControllerError::ControllerGone)?
    }

    /// Receiver of every snapshot the controller publishes after a load or commit.
    pub fn subscribe(&self) -> watch::Receiver<H::State> {
        self.snapshots.clone()
    }

    /// Ask the controller to stop once queued messages ahead of this one are handled.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(ControllerMessage::Shutdown).await;
    }

    /// `false` once the controller task has exited (shutdown or idle timeout).
    pub fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }

    /// `true` if both handles talk to the same controller task.
    pub fn same_controller(&self, other: &Self) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

/// Spawn a controller task for `id` on the current tokio runtime.
///
/// Nothing is loaded until the first message arrives.
pub fn spawn_controller<H>(
    id: AggregateId,
    handler: Arc<H>,
    events: Arc<dyn EventStore>,
    snapshots: Arc<dyn SnapshotStore>,
    config: ControllerConfig,
) -> ControllerHandle<H>
where
    H: CommandHandler,
    H::State: Serialize + DeserializeOwned,
    EventOf<H>: Event + Serialize + DeserializeOwned,
{
    let (sender, rx) = mpsc::channel(config.mailbox_capacity.max(1));
    let (publisher, subscriber) = watch::channel(handler.empty_state(id));

    let controller = Controller {
        id,
        handler,
        events,
        snapshots,
        config,
        lifecycle: Lifecycle::Unloaded,
        publisher,
    };

    let span = info_span!("controller", aggregate_id = %id);
    tokio::spawn(controller.run(rx).instrument(span));

    ControllerHandle {
        id,
        sender,
        snapshots: subscriber,
    }
}

struct Controller<H: CommandHandler> {
    id: AggregateId,
    handler: Arc<H>,
    events: Arc<dyn EventStore>,
    snapshots: Arc<dyn SnapshotStore>,
    config: ControllerConfig,
    lifecycle: Lifecycle<H::State>,
    publisher: watch::Sender<H::State>,
}

impl<H> Controller<H>
where
    H: CommandHandler,
    H::State: Serialize + DeserializeOwned,
    EventOf<H>: Event + Serialize + DeserializeOwned,
{
    async fn run(mut self, mut rx: mpsc::Receiver<ControllerMessage<H>>) {
        loop {
            let message = match self.config.idle_timeout {
                Some(idle) => match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(message) => message,
                    Err(_elapsed) => {
                        info!("controller idle, shutting down");
                        break;
                    }
                },
                None => rx.recv().await,
            };

            match message {
                Some(ControllerMessage::Execute { command, reply }) => {
                    let result = self.execute(command).await;
                    // The caller may have given up; nothing to do then.
                    let _ = reply.send(result);
                }
                Some(ControllerMessage::GetState { reply }) => {
                    let result = self.loaded().await.map(|state| state.clone());
                    let _ = reply.send(result);
                }
                Some(ControllerMessage::Shutdown) | None => break,
            }
        }
        debug!("controller stopped");
    }

    async fn execute(&mut self, command: H::Cmd) -> ExecuteResult<H> {
        if let Some(target) = command.target_aggregate_id() {
            if target != self.id {
                return Err(ControllerError::TargetMismatch {
                    target,
                    owner: self.id,
                });
            }
        }

        let state = self.loaded().await?.clone();
        let version = state.version();

        let decision = tokio::time::timeout(
            self.config.command_timeout,
            self.handler.handle(&state, command),
        )
        .await
        .map_err(|_| {
            warn!(version, timeout = ?self.config.command_timeout, "command timed out");
            ControllerError::Timeout
        })??;

        if decision.events.is_empty() {
            return Ok(Executed {
                events: Vec::new(),
                version,
                output: decision.output,
            });
        }

        let committed = self.commit(&decision.events, version).await?;

        let mut next = state;
        for event in &decision.events {
            next.apply(event);
        }
        let new_version = next.version();
        let last_sequence = committed.last().map(|e| e.sequence_number).unwrap_or(version);
        if new_version != last_sequence {
            return Err(self.fault(format!(
                "folded version {new_version} does not match committed sequence {last_sequence}"
            )));
        }

        info!(
            events = committed.len(),
            version = new_version,
            "committed"
        );

        if self.config.checkpoint_due(version, new_version) {
            self.checkpoint(&next).await;
        }

        self.publisher.send_replace(next.clone());
        self.lifecycle = Lifecycle::Active(next);

        let envelopes = committed
            .iter()
            .zip(decision.events)
            .map(|(stored, event)| stored.to_envelope(event))
            .collect();

        Ok(Executed {
            events: envelopes,
            version: new_version,
            output: decision.output,
        })
    }

    /// Append a batch expecting the stream to still be at `version`.
    async fn commit(
        &mut self,
        batch: &[EventOf<H>],
        version: u64,
    ) -> Result<Vec<StoredEvent>, ControllerError> {
        let aggregate_type = self.handler.aggregate_type();
        let occurred_at = Utc::now();
        let uncommitted = batch
            .iter()
            .map(|event| {
                UncommittedEvent::from_typed(self.id, aggregate_type, Uuid::now_v7(), occurred_at, event)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = match self
            .events
            .append(uncommitted, ExpectedVersion::Exact(version))
            .await
        {
            Ok(committed) => committed,
            Err(err) => {
                // Whatever the store did, our snapshot can no longer be trusted.
                self.lifecycle = Lifecycle::Unloaded;
                if err.is_concurrency() {
                    warn!(version, error = %err, "concurrent commit detected, snapshot dropped");
                } else {
                    warn!(version, error = %err, "append failed, snapshot dropped");
                }
                return Err(err.into());
            }
        };

        let contiguous = committed.len() == batch.len()
            && committed
                .iter()
                .zip(version + 1..)
                .all(|(stored, expected)| stored.sequence_number == expected);
        if !contiguous {
            return Err(self.fault("store returned a non-contiguous commit".to_string()));
        }

        Ok(committed)
    }

    /// The loaded snapshot, loading it on first use or after a conflict or store outage.
    async fn loaded(&mut self) -> Result<&H::State, ControllerError> {
        if let Lifecycle::Unloaded = self.lifecycle {
            match self.load().await {
                Ok(state) => {
                    self.publisher.send_replace(state.clone());
                    self.lifecycle = Lifecycle::Active(state);
                }
                Err(LoadError::Store(err)) => {
                    warn!(error = %err, "load failed, staying unloaded");
                    return Err(err);
                }
                Err(LoadError::Integrity(reason)) => return Err(self.fault(reason)),
            }
        }

        match &self.lifecycle {
            Lifecycle::Active(state) => Ok(state),
            Lifecycle::Faulted(reason) => Err(ControllerError::Faulted(reason.clone())),
            Lifecycle::Unloaded => Err(ControllerError::Faulted("snapshot not loaded".to_string())),
        }
    }

    /// Latest checkpoint (if any) plus the tail of the stream.
    async fn load(&self) -> Result<H::State, LoadError> {
        let checkpoint = self
            .snapshots
            .load_latest(self.id)
            .await
            .map_err(|e| LoadError::Store(e.into()))?;

        let mut state = match checkpoint {
            Some(record) => {
                let state: H::State = serde_json::from_value(record.state).map_err(|e| {
                    LoadError::Integrity(format!(
                        "checkpoint at version {} is unreadable: {e}",
                        record.version
                    ))
                })?;
                if state.version() != record.version {
                    return Err(LoadError::Integrity(format!(
                        "checkpoint claims version {} but holds version {}",
                        record.version,
                        state.version()
                    )));
                }
                state
            }
            None => self.handler.empty_state(self.id),
        };
        let base = state.version();

        let tail = self
            .events
            .load_stream_after(self.id, base)
            .await
            .map_err(|e| LoadError::Store(e.into()))?;

        for (stored, expected) in tail.iter().zip(base + 1..) {
            if stored.aggregate_id != self.id {
                return Err(LoadError::Integrity(format!(
                    "stream contains event of aggregate {} at sequence {}",
                    stored.aggregate_id, stored.sequence_number
                )));
            }
            if stored.sequence_number != expected {
                return Err(LoadError::Integrity(format!(
                    "gap in stream: expected sequence {expected}, found {}",
                    stored.sequence_number
                )));
            }
            let event: EventOf<H> = stored
                .decode()
                .map_err(|e| LoadError::Integrity(e.to_string()))?;
            state.apply(&event);
        }

        debug!(
            checkpoint = base,
            replayed = tail.len(),
            version = state.version(),
            "snapshot loaded"
        );
        Ok(state)
    }

    /// Checkpoint failures are logged only: the events are already committed.
    async fn checkpoint(&self, state: &H::State) {
        let serialized = match serde_json::to_value(state) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "checkpoint serialization failed");
                return;
            }
        };

        let record = SnapshotRecord {
            aggregate_id: self.id,
            aggregate_type: self.handler.aggregate_type().to_string(),
            version: state.version(),
            state: serialized,
            taken_at: Utc::now(),
        };

        match self.snapshots.save(record).await {
            Ok(()) => debug!(version = state.version(), "checkpoint written"),
            Err(err) => warn!(error = %err, "checkpoint write failed"),
        }
    }

    fn fault(&mut self, reason: String) -> ControllerError {
        warn!(reason = %reason, "controller faulted");
        self.lifecycle = Lifecycle::Faulted(reason.clone());
        ControllerError::Faulted(reason)
    }
}
