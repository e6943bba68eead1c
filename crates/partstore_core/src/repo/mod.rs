//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the part aggregate's data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories never validate caller input; that happens at the boundary.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod part_repo;
