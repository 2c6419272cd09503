//! Aggregate root trait for mutable domain models.

/// Aggregate root marker + minimal interface.
///
/// Kept intentionally small: an aggregate owns its invariants and exposes a
/// version that moves forward on every successful state change.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    ///
    /// Incremented once per successful mutation; rejected mutations leave it
    /// untouched.
    fn version(&self) -> u64;
}
