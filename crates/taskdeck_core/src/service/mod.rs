//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Normalize and validate caller input above the persistence boundary.

use uuid::Uuid;

pub mod project_service;
pub mod task_service;

/// Where a caller wants a new ordered member placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Append at the end of the scope.
    End,
    /// Occupy an explicit position, shifting later members one slot.
    At(i64),
    /// Land directly after an existing member.
    After(Uuid),
}
