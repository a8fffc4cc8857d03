//! Domain model for the project/task tracker.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep draft (creation input) shapes separate from persisted rows.
//!
//! # Invariants
//! - Every domain object is identified by a stable `Uuid`.
//! - `position` is assigned and mutated only by the ordering engine.

pub mod project;
pub mod task;
