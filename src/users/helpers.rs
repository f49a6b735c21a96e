use chrono::Local;
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};

use std::fmt::Write as _;

use crate::api_error::{ApiError, ApiResult};

use super::data::*;

fn user_from_row(row: &Row) -> rusqlite::Result<(User, String)> {
    let role: String = row.get(3)?;
    Ok((
        User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            role: Role::parse(&role).unwrap_or(Role::User),
            hide_goals: row.get(4)?,
            hide_completed_tasks: row.get(5)?,
        },
        row.get(6)?,
    ))
}

const USER_COLUMNS: &str =
    "id, username, email, role, hide_goals, hide_completed_tasks, password_hash";

pub fn get_user_from_db(user_id: UserID, db_connection: &Connection) -> ApiResult<Option<User>> {
    let mut statement = db_connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = (?1)"))?;
    let user = statement
        .query_row(params![user_id], user_from_row)
        .optional()?;
    Ok(user.map(|(user, _)| user))
}

pub fn get_user_by_username(
    username: &str,
    db_connection: &Connection,
) -> ApiResult<Option<(User, String)>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = (?1)"
    ))?;
    Ok(statement
        .query_row(params![username], user_from_row)
        .optional()?)
}

pub fn get_all_users_from_db(db_connection: &Connection) -> ApiResult<Vec<User>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY username"
    ))?;
    let rows = statement.query_map(params![], user_from_row)?;

    let mut users = vec![];
    for row_result in rows {
        users.push(row_result?.0);
    }

    Ok(users)
}

/// The first account on a fresh install becomes the global owner so someone
/// can administer the household; everyone after that starts as a plain user.
pub fn add_user_to_db(request: &RegisterRequest, db_connection: &Connection) -> ApiResult<User> {
    let user_count: i64 =
        db_connection.query_row("SELECT COUNT(*) FROM users", params![], |row| row.get(0))?;
    let role = if user_count == 0 { Role::Owner } else { Role::User };

    db_connection.execute(
        "INSERT INTO users (username, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
        params![
            request.username,
            request.email,
            hash_password(&request.password),
            role.as_str()
        ],
    )?;
    let id = db_connection.last_insert_rowid();

    Ok(User {
        id,
        username: request.username.clone(),
        email: request.email.clone(),
        role,
        hide_goals: false,
        hide_completed_tasks: false,
    })
}

pub fn update_user_in_db(
    user_id: UserID,
    request: &UpdateUserRequest,
    db_connection: &Connection,
) -> ApiResult<()> {
    if let Some(email) = &request.email {
        db_connection.execute(
            "UPDATE users SET email = (?1) WHERE id = (?2)",
            params![email, user_id],
        )?;
    }
    if let Some(hide_goals) = request.hide_goals {
        db_connection.execute(
            "UPDATE users SET hide_goals = (?1) WHERE id = (?2)",
            params![hide_goals, user_id],
        )?;
    }
    if let Some(hide_completed) = request.hide_completed_tasks {
        db_connection.execute(
            "UPDATE users SET hide_completed_tasks = (?1) WHERE id = (?2)",
            params![hide_completed, user_id],
        )?;
    }
    if let Some(role) = request.role {
        db_connection.execute(
            "UPDATE users SET role = (?1) WHERE id = (?2)",
            params![role.as_str(), user_id],
        )?;
    }

    Ok(())
}

pub fn create_session(user_id: UserID, db_connection: &Connection) -> ApiResult<String> {
    let token = random_hex(32);
    db_connection.execute(
        "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![
            token,
            user_id,
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
        ],
    )?;
    Ok(token)
}

pub fn delete_session(token: &str, db_connection: &Connection) -> ApiResult<()> {
    db_connection.execute("DELETE FROM sessions WHERE token = (?1)", params![token])?;
    Ok(())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => salted_digest(salt, password) == digest,
        None => false,
    }
}

/// Stored as `salt$hexdigest`, salt drawn fresh per account.
pub fn hash_password(password: &str) -> String {
    let salt = random_hex(16);
    let digest = salted_digest(&salt, password);
    format!("{salt}${digest}")
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex_string(&hasher.finalize())
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex_string(&buf)
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

pub fn validate_register_request(request: &RegisterRequest) -> ApiResult<()> {
    let mut missing = vec![];
    if request.username.trim().is_empty() {
        missing.push("username".to_string());
    }
    if request.email.trim().is_empty() || !request.email.contains('@') {
        missing.push("email".to_string());
    }
    if request.password.is_empty() {
        missing.push("password".to_string());
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(missing))
    }
}
