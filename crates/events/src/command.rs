use appfold_core::{Actor, AggregateId};

/// A command targets a specific aggregate (command abstraction).
///
/// Commands represent **intent** - a request to perform an action on an aggregate.
/// They are **transient** (not persisted) and are transformed into events (which are persisted).
///
/// ## Command vs Event
///
/// - **Command**: Intent to do something (e.g., "Assign contributor X as editor")
/// - **Event**: Fact that something happened (e.g., "ContributorAssigned { X, Editor }")
///
/// Commands are rejected if invalid (guard violations). Events represent accepted changes.
///
/// ## Aggregate Targeting
///
/// Routing happens by the identity of the controller a command is sent to. A command may
/// still name its target; when it does, the controller refuses commands whose target does
/// not match its own identity. When it does not, the controller's identity is used.
///
/// ## Design Constraints
///
/// Commands must be `Send + 'static` because they cross into the controller task that
/// owns the aggregate.
pub trait Command: core::fmt::Debug + Send + 'static {
    /// The acting principal recorded on every event the command produces.
    fn actor(&self) -> &Actor;

    /// Explicit target, if the caller supplied one.
    fn target_aggregate_id(&self) -> Option<AggregateId>;
}
