//! Planboard - local-first project/task tracking core
//!
//! This library keeps a client-side cache of projects and tasks
//! consistent with a remote authoritative store. Local edits are
//! persisted synchronously and pushed in the background; the client
//! stays fully usable offline or with sync disabled.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Application configuration management
//! * [`storage`] - Local database and data persistence
//! * [`sync`] - Synchronization engine: diffing, identity
//!   reconciliation and the background outbox
//! * [`remote`] - Remote store client and wire translation
//! * [`models`] - Domain types shared across layers

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// Logging setup
pub mod logger;

/// Domain model types
pub mod models;

/// Remote store client and boundary translation
pub mod remote;

/// Repository layer for database operations
pub mod repositories;

/// Local storage layer for cached project data
pub mod storage;

/// Synchronization engine for keeping local and remote data in sync
pub mod sync;

// Re-export the types most callers need
pub use models::{Phase, Project, Task, TaskState, TaskStatus, TimeLogEntry};
pub use sync::{ProjectSyncState, SyncService};
