//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the planet data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Planet::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod planet_repo;
