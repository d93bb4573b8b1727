//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog, party and order records all implement this; the document store
/// keys its collections by `Entity::id`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
