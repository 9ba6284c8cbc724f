//! Aggregate root trait for domain models.

use crate::entity::Entity;

/// Aggregate root marker.
///
/// An aggregate root is the single entry point into a cluster of entities: it
/// owns its subordinates exclusively and enforces invariants across the whole
/// cluster. Repositories load and persist aggregates, never their parts.
///
/// This is intentionally small so modules can decide how they model state
/// transitions without bringing in any infrastructure concerns.
pub trait AggregateRoot: Entity {}
