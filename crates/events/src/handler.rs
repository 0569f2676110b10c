use async_trait::async_trait;
use thiserror::Error;

use appfold_core::{Aggregate, AggregateId, DomainError};

use crate::Command;

/// The outcome of an accepted command: the batch to commit and the value to return.
///
/// An empty `events` batch is legal (e.g. a plan change the billing side did not
/// confirm); the controller then commits nothing and still returns `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision<E, O> {
    pub events: Vec<E>,
    pub output: O,
}

impl<E, O> Decision<E, O> {
    pub fn emit(events: Vec<E>, output: O) -> Self {
        Self { events, output }
    }

    pub fn nothing(output: O) -> Self {
        Self {
            events: Vec::new(),
            output,
        }
    }
}

/// Why a handler refused to produce a batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// A guard rejected the command (recoverable by the caller).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// An external collaborator (billing, identity, plans) failed or was unreachable.
    #[error("dependency '{service}' failed: {message}")]
    Dependency {
        service: &'static str,
        message: String,
    },
}

impl HandlerError {
    pub fn dependency(service: &'static str, message: impl Into<String>) -> Self {
        Self::Dependency {
            service,
            message: message.into(),
        }
    }
}

/// Decides which events a command produces (command handler abstraction).
///
/// The handler owns the command router and the guards for one aggregate kind:
///
/// 1. **Route**: match the closed command enum (exhaustively, no runtime fallback)
/// 2. **Guard**: validate against `state` and, where needed, external lookups
/// 3. **Emit**: build the event batch with explicit constructor functions
///
/// ## Purity
///
/// `handle` receives the current snapshot by shared reference and must not mutate
/// it; state evolution happens only through `Aggregate::apply` once the batch is
/// committed. A handler may suspend on external calls (that is why it is async), and
/// the controller guarantees no other command for the same identity runs meanwhile.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Snapshot type folded from this aggregate's events.
    type State: Aggregate<Id = AggregateId> + Clone + Send + Sync + 'static;
    type Cmd: Command;
    type Output: Send + 'static;

    /// Stable aggregate type name (e.g. "apps.app"), stamped onto stored events.
    fn aggregate_type(&self) -> &'static str;

    /// The empty snapshot replay starts from.
    fn empty_state(&self, id: AggregateId) -> Self::State;

    async fn handle(
        &self,
        state: &Self::State,
        command: Self::Cmd,
    ) -> Result<Decision<<Self::State as Aggregate>::Event, Self::Output>, HandlerError>;
}
