//! Domain model for planet records.
//!
//! # Responsibility
//! - Define the canonical planet record shared by repository, service and
//!   HTTP layers.
//!
//! # Invariants
//! - Persisted planets always carry a store-assigned `PlanetId`.
//! - Planets are never mutated after creation; deletion is a hard delete.

pub mod planet;
