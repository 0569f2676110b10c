//! Folding helpers shared by live controllers and offline replay.
//!
//! Both paths go through [`Aggregate::apply`], so incremental folding and
//! bulk replay of the same sequence always produce the same state.

use appfold_core::Aggregate;

/// Apply one event to a snapshot, producing the next snapshot.
pub fn fold<A: Aggregate>(mut state: A, event: &A::Event) -> A {
    state.apply(event);
    state
}

/// Rebuild a snapshot by replaying an ordered event history onto `empty`.
pub fn replay<'a, A>(empty: A, events: impl IntoIterator<Item = &'a A::Event>) -> A
where
    A: Aggregate,
    A::Event: 'a,
{
    events
        .into_iter()
        .fold(empty, |state, event| fold(state, event))
}
