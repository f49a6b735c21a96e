use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::api_error::{ApiError, ApiResult};
use crate::period::ResetPeriod;
use crate::permissions::PermissionLevel;
use crate::users::data::UserID;

use super::data::*;

fn list_from_row(row: &Row) -> rusqlite::Result<List> {
    let reset_period: String = row.get(3)?;
    Ok(List {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        reset_period: ResetPeriod::parse(&reset_period).unwrap_or(ResetPeriod::Static),
        created_by: row.get(4)?,
        sort_order: row.get(5)?,
    })
}

pub fn get_list_from_db(list_id: ListID, db_connection: &Connection) -> ApiResult<Option<List>> {
    let mut statement = db_connection.prepare(
        "SELECT id, name, description, reset_period, created_by, sort_order \
         FROM lists WHERE id = (?1)",
    )?;
    Ok(statement.query_row(params![list_id], list_from_row).optional()?)
}

/// Only lists the user holds a permission row for are visible to them.
pub fn get_lists_for_user(
    user_id: UserID,
    db_connection: &Connection,
) -> ApiResult<Vec<ListWithPermission>> {
    let mut statement = db_connection.prepare(
        "SELECT lists.id, lists.name, lists.description, lists.reset_period, \
                lists.created_by, lists.sort_order, list_permissions.permission_level \
         FROM lists JOIN list_permissions ON list_permissions.list_id = lists.id \
         WHERE list_permissions.user_id = (?1) \
         ORDER BY lists.sort_order, lists.id",
    )?;

    let rows = statement.query_map(params![user_id], |row| {
        let level: String = row.get(6)?;
        Ok((list_from_row(row)?, level))
    })?;

    let mut lists = vec![];
    for row_result in rows {
        let (list, level) = row_result?;
        let permission = PermissionLevel::parse(&level)
            .ok_or_else(|| ApiError::Internal(format!("invalid permission level: {level}")))?;
        lists.push(ListWithPermission { list, permission });
    }

    Ok(lists)
}

/// Creates the list and the creator's owner permission row in one
/// transaction so a half-created list can never be orphaned.
pub fn add_list_to_db(
    request: &CreateListRequest,
    created_by: UserID,
    db_connection: &mut Connection,
) -> ApiResult<List> {
    let transaction = db_connection.transaction()?;

    let reset_period = request.reset_period.unwrap_or(ResetPeriod::Static);
    transaction.execute(
        "INSERT INTO lists (name, description, reset_period, created_by, sort_order) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            request.name,
            request.description,
            reset_period.as_str(),
            created_by,
            request.sort_order.unwrap_or(0)
        ],
    )?;
    let id = transaction.last_insert_rowid();

    transaction.execute(
        "INSERT INTO list_permissions (user_id, list_id, permission_level) \
         VALUES (?1, ?2, ?3)",
        params![created_by, id, PermissionLevel::Owner.as_str()],
    )?;

    transaction.commit()?;

    Ok(List {
        id,
        name: request.name.clone(),
        description: request.description.clone(),
        reset_period,
        created_by: Some(created_by),
        sort_order: request.sort_order.unwrap_or(0),
    })
}

pub fn update_list_in_db(
    list_id: ListID,
    request: &UpdateListRequest,
    db_connection: &Connection,
) -> ApiResult<()> {
    if let Some(name) = &request.name {
        db_connection.execute(
            "UPDATE lists SET name = (?1) WHERE id = (?2)",
            params![name, list_id],
        )?;
    }
    if let Some(description) = &request.description {
        db_connection.execute(
            "UPDATE lists SET description = (?1) WHERE id = (?2)",
            params![description, list_id],
        )?;
    }
    if let Some(reset_period) = request.reset_period {
        db_connection.execute(
            "UPDATE lists SET reset_period = (?1) WHERE id = (?2)",
            params![reset_period.as_str(), list_id],
        )?;
    }
    if let Some(sort_order) = request.sort_order {
        db_connection.execute(
            "UPDATE lists SET sort_order = (?1) WHERE id = (?2)",
            params![sort_order, list_id],
        )?;
    }

    Ok(())
}

/// Tasks and their completions go with the list via foreign-key cascades.
pub fn delete_list_from_db(list_id: ListID, db_connection: &Connection) -> ApiResult<()> {
    db_connection.execute("DELETE FROM lists WHERE id = (?1)", params![list_id])?;
    Ok(())
}

pub fn get_list_permissions_from_db(
    list_id: ListID,
    db_connection: &Connection,
) -> ApiResult<Vec<PermissionEntry>> {
    let mut statement = db_connection.prepare(
        "SELECT list_permissions.user_id, users.username, list_permissions.permission_level \
         FROM list_permissions JOIN users ON users.id = list_permissions.user_id \
         WHERE list_permissions.list_id = (?1) \
         ORDER BY users.username",
    )?;

    let rows = statement.query_map(params![list_id], |row| {
        Ok((
            row.get::<usize, UserID>(0)?,
            row.get::<usize, String>(1)?,
            row.get::<usize, String>(2)?,
        ))
    })?;

    let mut entries = vec![];
    for row_result in rows {
        let (user_id, username, level) = row_result?;
        let permission_level = PermissionLevel::parse(&level)
            .ok_or_else(|| ApiError::Internal(format!("invalid permission level: {level}")))?;
        entries.push(PermissionEntry {
            user_id,
            username,
            permission_level,
        });
    }

    Ok(entries)
}

/// Upsert keyed on the (user, list) composite primary key.
pub fn set_list_permission_in_db(
    list_id: ListID,
    request: &SetPermissionRequest,
    db_connection: &Connection,
) -> ApiResult<()> {
    db_connection.execute(
        "INSERT INTO list_permissions (user_id, list_id, permission_level) \
         VALUES (?1, ?2, ?3) \
         ON CONFLICT (user_id, list_id) DO UPDATE SET permission_level = excluded.permission_level",
        params![
            request.user_id,
            list_id,
            request.permission_level.as_str()
        ],
    )?;
    Ok(())
}

pub fn delete_list_permission_from_db(
    list_id: ListID,
    user_id: UserID,
    db_connection: &Connection,
) -> ApiResult<()> {
    let removed = db_connection.execute(
        "DELETE FROM list_permissions WHERE list_id = (?1) AND user_id = (?2)",
        params![list_id, user_id],
    )?;
    if removed == 0 {
        return Err(ApiError::NotFound("permission"));
    }
    Ok(())
}
