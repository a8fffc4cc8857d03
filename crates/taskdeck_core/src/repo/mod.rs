//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - All `position` writes go through `ordered::OrderedCollection`; payload
//!   CRUD never touches order keys.
//! - Repository APIs return semantic errors (`NotFound`, `ReorderMismatch`)
//!   in addition to DB transport errors.

pub mod ordered;
pub mod project_repo;
pub mod task_repo;
