//! Records whose identity is their id (catalogue products, user profiles).

/// A record identified by a typed id.
///
/// Two values with the same id describe the same product or user even when
/// other fields differ (a repriced product, an edited profile).
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;

    /// Whether `other` describes the same record.
    fn same_entity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
