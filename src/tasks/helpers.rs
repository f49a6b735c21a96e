use rusqlite::{params, Connection, OptionalExtension, Row};

use std::collections::HashMap;

use crate::api_error::ApiResult;
use crate::lists::data::ListID;
use crate::period::DateRange;
use crate::users::data::UserID;

use super::data::*;

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        list_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        duration_minutes: row.get(4)?,
        allow_multiple_completions: row.get(5)?,
        sort_order: row.get(6)?,
    })
}

const TASK_COLUMNS: &str =
    "id, list_id, title, description, duration_minutes, allow_multiple_completions, sort_order";

pub fn get_task_from_db(task_id: TaskID, db_connection: &Connection) -> ApiResult<Option<Task>> {
    let mut statement = db_connection
        .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = (?1)"))?;
    Ok(statement.query_row(params![task_id], task_from_row).optional()?)
}

pub fn get_tasks_for_list(
    list_id: ListID,
    db_connection: &Connection,
) -> ApiResult<Vec<Task>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE list_id = (?1) ORDER BY sort_order, id"
    ))?;
    let rows = statement.query_map(params![list_id], task_from_row)?;

    let mut tasks = vec![];
    for row_result in rows {
        tasks.push(row_result?);
    }

    Ok(tasks)
}

/// Completion counts per task for one list, restricted to the resolved
/// period; `None` means a static list and counts all-time.
fn completion_counts_for_list(
    list_id: ListID,
    period: Option<&DateRange>,
    db_connection: &Connection,
) -> ApiResult<HashMap<TaskID, i64>> {
    let mut counts = HashMap::new();

    match period {
        Some(range) => {
            let mut statement = db_connection.prepare(
                "SELECT task_completions.task_id, COUNT(*) \
                 FROM task_completions JOIN tasks ON tasks.id = task_completions.task_id \
                 WHERE tasks.list_id = (?1) \
                   AND task_completions.completed_at >= (?2) \
                   AND task_completions.completed_at <= (?3) \
                 GROUP BY task_completions.task_id",
            )?;
            let rows = statement.query_map(
                params![list_id, range.start_timestamp(), range.end_timestamp()],
                |row| Ok((row.get::<usize, TaskID>(0)?, row.get::<usize, i64>(1)?)),
            )?;
            for row_result in rows {
                let (task_id, count) = row_result?;
                counts.insert(task_id, count);
            }
        }
        None => {
            let mut statement = db_connection.prepare(
                "SELECT task_completions.task_id, COUNT(*) \
                 FROM task_completions JOIN tasks ON tasks.id = task_completions.task_id \
                 WHERE tasks.list_id = (?1) \
                 GROUP BY task_completions.task_id",
            )?;
            let rows = statement.query_map(params![list_id], |row| {
                Ok((row.get::<usize, TaskID>(0)?, row.get::<usize, i64>(1)?))
            })?;
            for row_result in rows {
                let (task_id, count) = row_result?;
                counts.insert(task_id, count);
            }
        }
    }

    Ok(counts)
}

pub fn get_tasks_with_status(
    list_id: ListID,
    period: Option<&DateRange>,
    db_connection: &Connection,
) -> ApiResult<Vec<TaskWithStatus>> {
    let tasks = get_tasks_for_list(list_id, db_connection)?;
    let counts = completion_counts_for_list(list_id, period, db_connection)?;

    Ok(tasks
        .into_iter()
        .map(|task| {
            let completions_in_period = counts.get(&task.id).copied().unwrap_or(0);
            TaskWithStatus {
                completed: completions_in_period > 0,
                completions_in_period,
                task,
            }
        })
        .collect())
}

pub fn add_task_to_db(
    request: &CreateTaskRequest,
    db_connection: &Connection,
) -> ApiResult<Task> {
    db_connection.execute(
        "INSERT INTO tasks (list_id, title, description, duration_minutes, \
                            allow_multiple_completions, sort_order) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            request.list_id,
            request.title,
            request.description,
            request.duration_minutes.unwrap_or(0),
            request.allow_multiple_completions.unwrap_or(false),
            request.sort_order.unwrap_or(0)
        ],
    )?;
    let id = db_connection.last_insert_rowid();

    Ok(Task {
        id,
        list_id: request.list_id,
        title: request.title.clone(),
        description: request.description.clone(),
        duration_minutes: request.duration_minutes.unwrap_or(0),
        allow_multiple_completions: request.allow_multiple_completions.unwrap_or(false),
        sort_order: request.sort_order.unwrap_or(0),
    })
}

pub fn update_task_in_db(
    task_id: TaskID,
    request: &UpdateTaskRequest,
    db_connection: &Connection,
) -> ApiResult<()> {
    if let Some(title) = &request.title {
        db_connection.execute(
            "UPDATE tasks SET title = (?1) WHERE id = (?2)",
            params![title, task_id],
        )?;
    }
    if let Some(description) = &request.description {
        db_connection.execute(
            "UPDATE tasks SET description = (?1) WHERE id = (?2)",
            params![description, task_id],
        )?;
    }
    if let Some(duration_minutes) = request.duration_minutes {
        db_connection.execute(
            "UPDATE tasks SET duration_minutes = (?1) WHERE id = (?2)",
            params![duration_minutes, task_id],
        )?;
    }
    if let Some(allow_multiple) = request.allow_multiple_completions {
        db_connection.execute(
            "UPDATE tasks SET allow_multiple_completions = (?1) WHERE id = (?2)",
            params![allow_multiple, task_id],
        )?;
    }
    if let Some(sort_order) = request.sort_order {
        db_connection.execute(
            "UPDATE tasks SET sort_order = (?1) WHERE id = (?2)",
            params![sort_order, task_id],
        )?;
    }

    Ok(())
}

pub fn delete_task_from_db(task_id: TaskID, db_connection: &Connection) -> ApiResult<()> {
    db_connection.execute("DELETE FROM tasks WHERE id = (?1)", params![task_id])?;
    Ok(())
}

pub fn reorder_tasks_in_db(
    list_id: ListID,
    task_ids: &[TaskID],
    db_connection: &mut Connection,
) -> ApiResult<()> {
    let transaction = db_connection.transaction()?;

    for (sort_order, task_id) in task_ids.iter().enumerate() {
        transaction.execute(
            "UPDATE tasks SET sort_order = (?1) WHERE id = (?2) AND list_id = (?3)",
            params![sort_order as i64, task_id, list_id],
        )?;
    }

    transaction.commit()?;
    Ok(())
}

pub fn count_completions_in_period(
    task_id: TaskID,
    period: Option<&DateRange>,
    db_connection: &Connection,
) -> ApiResult<i64> {
    let count = match period {
        Some(range) => db_connection.query_row(
            "SELECT COUNT(*) FROM task_completions \
             WHERE task_id = (?1) AND completed_at >= (?2) AND completed_at <= (?3)",
            params![task_id, range.start_timestamp(), range.end_timestamp()],
            |row| row.get(0),
        )?,
        None => db_connection.query_row(
            "SELECT COUNT(*) FROM task_completions WHERE task_id = (?1)",
            params![task_id],
            |row| row.get(0),
        )?,
    };

    Ok(count)
}

pub fn add_completion_to_db(
    task_id: TaskID,
    completed_by: UserID,
    completed_at: &str,
    db_connection: &Connection,
) -> ApiResult<CompletionID> {
    db_connection.execute(
        "INSERT INTO task_completions (task_id, completed_by, completed_at) \
         VALUES (?1, ?2, ?3)",
        params![task_id, completed_by, completed_at],
    )?;
    Ok(db_connection.last_insert_rowid())
}

/// Most recent completion of the task inside the period, regardless of who
/// made it. Undo eligibility is decided against this row.
pub fn latest_completion_in_period(
    task_id: TaskID,
    period: Option<&DateRange>,
    db_connection: &Connection,
) -> ApiResult<Option<Completion>> {
    let map = |row: &Row| -> rusqlite::Result<Completion> {
        Ok(Completion {
            id: row.get(0)?,
            task_id: row.get(1)?,
            completed_by: row.get(2)?,
            completed_by_username: None,
            completed_at: row.get(3)?,
        })
    };

    let completion = match period {
        Some(range) => db_connection
            .query_row(
                "SELECT id, task_id, completed_by, completed_at FROM task_completions \
                 WHERE task_id = (?1) AND completed_at >= (?2) AND completed_at <= (?3) \
                 ORDER BY completed_at DESC, id DESC LIMIT 1",
                params![task_id, range.start_timestamp(), range.end_timestamp()],
                map,
            )
            .optional()?,
        None => db_connection
            .query_row(
                "SELECT id, task_id, completed_by, completed_at FROM task_completions \
                 WHERE task_id = (?1) ORDER BY completed_at DESC, id DESC LIMIT 1",
                params![task_id],
                map,
            )
            .optional()?,
    };

    Ok(completion)
}

pub fn delete_completion_from_db(
    completion_id: CompletionID,
    db_connection: &Connection,
) -> ApiResult<()> {
    db_connection.execute(
        "DELETE FROM task_completions WHERE id = (?1)",
        params![completion_id],
    )?;
    Ok(())
}

/// The full ordered completion log for a task, newest first.
pub fn get_completions_for_task(
    task_id: TaskID,
    db_connection: &Connection,
) -> ApiResult<Vec<Completion>> {
    let mut statement = db_connection.prepare(
        "SELECT task_completions.id, task_completions.task_id, \
                task_completions.completed_by, users.username, \
                task_completions.completed_at \
         FROM task_completions LEFT JOIN users ON users.id = task_completions.completed_by \
         WHERE task_completions.task_id = (?1) \
         ORDER BY task_completions.completed_at DESC, task_completions.id DESC",
    )?;

    let rows = statement.query_map(params![task_id], |row| {
        Ok(Completion {
            id: row.get(0)?,
            task_id: row.get(1)?,
            completed_by: row.get(2)?,
            completed_by_username: row.get(3)?,
            completed_at: row.get(4)?,
        })
    })?;

    let mut completions = vec![];
    for row_result in rows {
        completions.push(row_result?);
    }

    Ok(completions)
}
