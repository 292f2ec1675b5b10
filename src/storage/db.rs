use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

/// Local storage manager for cached project data.
///
/// Owns the SQLite connection. Every public operation executes inside a
/// single transaction, so no caller can observe a half-applied write.
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Initialize the local storage with a `SQLite` database.
    ///
    /// With `in_memory` set, the database lives in process memory; used by
    /// tests and by callers that do not want a persistent cache.
    pub async fn new(in_memory: bool) -> Result<Self> {
        let database_url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            let data_dir = dirs::data_dir()
                .context("Could not determine data directory")?
                .join("planboard");
            std::fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
            format!("sqlite://{}?mode=rwc", data_dir.join("planboard.sqlite").display())
        };

        let conn = Database::connect(&database_url)
            .await
            .with_context(|| format!("Failed to open local database: {database_url}"))?;

        let storage = LocalStorage { conn };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_unprepared(
                r"
                CREATE TABLE IF NOT EXISTS projects (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    project_type TEXT,
                    status TEXT,
                    lead TEXT,
                    budget REAL,
                    start_date TEXT,
                    target_date TEXT,
                    is_archived BOOLEAN NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    phases TEXT NOT NULL DEFAULT '[]'
                )
                ",
            )
            .await?;

        self.conn
            .execute_unprepared(
                r"
                CREATE TABLE IF NOT EXISTS tasks (
                    project_id TEXT NOT NULL,
                    id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    phase TEXT,
                    category TEXT,
                    estimated_hours REAL NOT NULL DEFAULT 0,
                    depends_on TEXT NOT NULL DEFAULT '[]',
                    parent_id TEXT,
                    PRIMARY KEY (project_id, id),
                    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
                )
                ",
            )
            .await?;

        self.conn
            .execute_unprepared(
                r"
                CREATE TABLE IF NOT EXISTS task_states (
                    project_id TEXT NOT NULL,
                    task_id TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'pending',
                    notes TEXT NOT NULL DEFAULT '',
                    actual_hours REAL NOT NULL DEFAULT 0,
                    blocked_reason TEXT,
                    completed_at TEXT,
                    time_log TEXT NOT NULL DEFAULT '[]',
                    PRIMARY KEY (project_id, task_id),
                    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
                )
                ",
            )
            .await?;

        self.conn
            .execute_unprepared(
                r"
                CREATE TABLE IF NOT EXISTS app_state (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                )
                ",
            )
            .await?;

        Ok(())
    }

    /// Check if the database has any data
    pub async fn has_data(&self) -> Result<bool> {
        use sea_orm::EntityTrait;
        let count = crate::entities::project::Entity::find().all(&self.conn).await?.len();
        Ok(count > 0)
    }

    /// Clear all data from the database
    pub async fn clear_all_data(&self) -> Result<()> {
        self.conn.execute_unprepared("DELETE FROM task_states").await?;
        self.conn.execute_unprepared("DELETE FROM tasks").await?;
        self.conn.execute_unprepared("DELETE FROM projects").await?;
        self.conn.execute_unprepared("DELETE FROM app_state").await?;
        Ok(())
    }
}
