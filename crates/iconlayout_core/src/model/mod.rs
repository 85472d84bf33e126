//! Layout domain model shared by every store backend.
//!
//! # Responsibility
//! - Define the declarative page/folder/leaf tree and the Dock tile lists.
//! - Define the store identity snapshot used for title resolution.
//!
//! # Invariants
//! - Model values are built fresh per reconciliation and never persisted.
//! - Only their effect on the store (rows or plist arrays) persists.

pub mod dock;
pub mod layout;
pub mod mapping;
