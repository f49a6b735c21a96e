use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api_error::ApiResult;

pub type DBConnection = Arc<Mutex<Connection>>;

/// Opens (or creates) the database file and brings the schema up.
pub fn open_database(path: &str) -> ApiResult<Connection> {
    let connection = Connection::open(path)?;
    init_schema(&connection)?;
    Ok(connection)
}

/// Idempotent schema setup. Timestamps are local-time strings
/// (`YYYY-MM-DD HH:MM:SS`) so lexicographic comparison is chronological.
pub fn init_schema(connection: &Connection) -> ApiResult<()> {
    connection.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA foreign_keys=ON;

        CREATE TABLE IF NOT EXISTS users (
          id INTEGER PRIMARY KEY,
          username TEXT NOT NULL UNIQUE,
          email TEXT NOT NULL UNIQUE,
          password_hash TEXT NOT NULL,
          role TEXT NOT NULL DEFAULT 'user',
          hide_goals INTEGER NOT NULL DEFAULT 0,
          hide_completed_tasks INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS sessions (
          token TEXT PRIMARY KEY,
          user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lists (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL,
          description TEXT,
          reset_period TEXT NOT NULL DEFAULT 'static',
          created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
          sort_order INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS list_permissions (
          user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
          list_id INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
          permission_level TEXT NOT NULL,
          PRIMARY KEY (user_id, list_id)
        );

        CREATE TABLE IF NOT EXISTS tasks (
          id INTEGER PRIMARY KEY,
          list_id INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
          title TEXT NOT NULL,
          description TEXT,
          duration_minutes INTEGER NOT NULL DEFAULT 0,
          allow_multiple_completions INTEGER NOT NULL DEFAULT 0,
          sort_order INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS task_completions (
          id INTEGER PRIMARY KEY,
          task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
          completed_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
          completed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS goals (
          id INTEGER PRIMARY KEY,
          user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
          name TEXT NOT NULL,
          calculation_type TEXT NOT NULL,
          target_value INTEGER NOT NULL,
          period_type TEXT NOT NULL,
          list_ids TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_list ON tasks(list_id, sort_order);
        CREATE INDEX IF NOT EXISTS idx_completions_task
          ON task_completions(task_id, completed_at);
        CREATE INDEX IF NOT EXISTS idx_permissions_list ON list_permissions(list_id);
        "#,
    )?;

    Ok(())
}
