//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity** and are compared by their attribute
/// values. `Money { minor_units: 1000, currency: EUR }` is a value object; a
/// `Product` with an id is an entity.
///
/// Value objects are immutable: "changing" one means building a new value,
/// which keeps them safe to copy into event snapshots and share across threads.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
