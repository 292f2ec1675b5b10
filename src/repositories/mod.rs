//! Repository layer for database operations.
//!
//! This module provides repository structs that encapsulate database queries
//! and operations, following the Data Mapper pattern recommended by SeaORM.
//! Repositories keep entities as pure data models while providing reusable
//! database access methods.

pub mod app_state;
pub mod project;
pub mod task;
pub mod task_state;

pub use app_state::AppStateRepository;
pub use project::ProjectRepository;
pub use task::TaskRepository;
pub use task_state::TaskStateRepository;
