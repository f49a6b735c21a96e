//! Per-list permission resolution. Every list and task endpoint routes its
//! access decision through this module; nothing re-derives permissions ad hoc.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::api_error::{ApiError, ApiResult};

/// Flat, closed set of list permission levels. Ordering is by explicit rank,
/// not any structural hierarchy: owner > admin > user.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    User,
    Admin,
    Owner,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    pub fn parse(value: &str) -> Option<PermissionLevel> {
        match value {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::User => 0,
            Self::Admin => 1,
            Self::Owner => 2,
        }
    }

    pub fn at_least(&self, other: PermissionLevel) -> bool {
        self.rank() >= other.rank()
    }
}

/// The single source of truth for a user's permission on a list. `None`
/// means no access at all.
pub fn permission_for(
    connection: &Connection,
    user_id: i64,
    list_id: i64,
) -> ApiResult<Option<PermissionLevel>> {
    let mut statement = connection.prepare(
        "SELECT permission_level FROM list_permissions WHERE user_id = (?1) AND list_id = (?2)",
    )?;

    let stored = statement
        .query_row(params![user_id, list_id], |row| row.get::<usize, String>(0))
        .optional()?;

    match stored {
        None => Ok(None),
        Some(value) => PermissionLevel::parse(&value)
            .map(Some)
            .ok_or_else(|| ApiError::Internal(format!("invalid permission level: {value}"))),
    }
}

/// Any permission level grants read access and completion toggling.
pub fn require_list_access(
    connection: &Connection,
    user_id: i64,
    list_id: i64,
) -> ApiResult<PermissionLevel> {
    permission_for(connection, user_id, list_id)?
        .ok_or_else(|| ApiError::access_denied("access denied"))
}

/// Creating, editing, deleting and reordering tasks takes admin or owner.
pub fn require_task_manager(
    connection: &Connection,
    user_id: i64,
    list_id: i64,
) -> ApiResult<PermissionLevel> {
    let level = require_list_access(connection, user_id, list_id)?;
    if level.at_least(PermissionLevel::Admin) {
        Ok(level)
    } else {
        Err(ApiError::access_denied(
            "only owners or admins can manage tasks",
        ))
    }
}

/// Editing or deleting the list itself, and managing its permission set,
/// takes the owner level.
pub fn require_list_owner(
    connection: &Connection,
    user_id: i64,
    list_id: i64,
) -> ApiResult<PermissionLevel> {
    let level = require_list_access(connection, user_id, list_id)?;
    if level.at_least(PermissionLevel::Owner) {
        Ok(level)
    } else {
        Err(ApiError::access_denied(
            "only the list owner can manage this list",
        ))
    }
}
