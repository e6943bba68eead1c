//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into route-level operations.
//! - Keep front ends decoupled from storage details.

pub mod part_service;
