//! Part aggregate data model.
//!
//! # Responsibility
//! - Define the canonical part aggregate shared by repository and service.
//!
//! # Invariants
//! - Every part is identified by a store-assigned `PartId`.
//! - Deletion is represented by tombstones in storage, not hard delete.

pub mod part;
