//! core
//!
//! Core domain types, configuration, and storage layout.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for vendor and checkout storage
//! - [`lock`] - Per-commit vendor archive lock
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Storage paths are derived in one place
//! - Schemas are strict and self-describing

pub mod config;
pub mod lock;
pub mod paths;
pub mod types;
