use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::api_error::{ApiError, ApiResult};
use crate::lists::data::ListID;
use crate::period::DateRange;
use crate::users::data::UserID;

use super::data::*;
use super::progress::TaskAggregate;

fn goal_from_row(row: &Row) -> rusqlite::Result<(GoalID, UserID, String, String, i64, String, String)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn build_goal(
    parts: (GoalID, UserID, String, String, i64, String, String),
) -> ApiResult<Goal> {
    let (id, user_id, name, calculation, target_value, period, list_ids_json) = parts;

    let calculation_type = CalculationType::parse(&calculation)
        .ok_or_else(|| ApiError::Internal(format!("invalid calculation type: {calculation}")))?;
    let period_type = PeriodType::parse(&period)
        .ok_or_else(|| ApiError::Internal(format!("invalid period type: {period}")))?;
    let list_ids: Vec<ListID> = serde_json::from_str(&list_ids_json)?;

    Ok(Goal {
        id,
        user_id,
        name,
        calculation_type,
        target_value,
        period_type,
        list_ids,
    })
}

const GOAL_COLUMNS: &str =
    "id, user_id, name, calculation_type, target_value, period_type, list_ids";

pub fn get_goal_from_db(goal_id: GoalID, db_connection: &Connection) -> ApiResult<Option<Goal>> {
    let mut statement = db_connection
        .prepare(&format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = (?1)"))?;
    let parts = statement
        .query_row(params![goal_id], goal_from_row)
        .optional()?;
    parts.map(build_goal).transpose()
}

pub fn get_goals_for_user(
    user_id: UserID,
    db_connection: &Connection,
) -> ApiResult<Vec<Goal>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = (?1) ORDER BY id"
    ))?;
    let rows = statement.query_map(params![user_id], goal_from_row)?;

    let mut goals = vec![];
    for row_result in rows {
        goals.push(build_goal(row_result?)?);
    }

    Ok(goals)
}

/// Every user's goals except those whose owner hides them; the requesting
/// user always sees their own.
pub fn get_all_goals_from_db(
    requesting_user: UserID,
    db_connection: &Connection,
) -> ApiResult<Vec<Goal>> {
    let mut statement = db_connection.prepare(
        "SELECT goals.id, goals.user_id, goals.name, goals.calculation_type, \
                goals.target_value, goals.period_type, goals.list_ids \
         FROM goals JOIN users ON users.id = goals.user_id \
         WHERE users.hide_goals = 0 OR goals.user_id = (?1) \
         ORDER BY goals.user_id, goals.id",
    )?;
    let rows = statement.query_map(params![requesting_user], goal_from_row)?;

    let mut goals = vec![];
    for row_result in rows {
        goals.push(build_goal(row_result?)?);
    }

    Ok(goals)
}

pub fn add_goal_to_db(
    request: &CreateGoalRequest,
    user_id: UserID,
    db_connection: &Connection,
) -> ApiResult<Goal> {
    db_connection.execute(
        "INSERT INTO goals (user_id, name, calculation_type, target_value, period_type, list_ids) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            request.name,
            request.calculation_type.as_str(),
            request.target_value,
            request.period_type.as_str(),
            serde_json::to_string(&request.list_ids)?
        ],
    )?;
    let id = db_connection.last_insert_rowid();

    Ok(Goal {
        id,
        user_id,
        name: request.name.clone(),
        calculation_type: request.calculation_type,
        target_value: request.target_value,
        period_type: request.period_type,
        list_ids: request.list_ids.clone(),
    })
}

pub fn update_goal_in_db(
    goal_id: GoalID,
    request: &UpdateGoalRequest,
    db_connection: &Connection,
) -> ApiResult<()> {
    if let Some(name) = &request.name {
        db_connection.execute(
            "UPDATE goals SET name = (?1) WHERE id = (?2)",
            params![name, goal_id],
        )?;
    }
    if let Some(calculation_type) = request.calculation_type {
        db_connection.execute(
            "UPDATE goals SET calculation_type = (?1) WHERE id = (?2)",
            params![calculation_type.as_str(), goal_id],
        )?;
    }
    if let Some(target_value) = request.target_value {
        db_connection.execute(
            "UPDATE goals SET target_value = (?1) WHERE id = (?2)",
            params![target_value, goal_id],
        )?;
    }
    if let Some(period_type) = request.period_type {
        db_connection.execute(
            "UPDATE goals SET period_type = (?1) WHERE id = (?2)",
            params![period_type.as_str(), goal_id],
        )?;
    }
    if let Some(list_ids) = &request.list_ids {
        db_connection.execute(
            "UPDATE goals SET list_ids = (?1) WHERE id = (?2)",
            params![serde_json::to_string(list_ids)?, goal_id],
        )?;
    }

    Ok(())
}

pub fn delete_goal_from_db(goal_id: GoalID, db_connection: &Connection) -> ApiResult<()> {
    db_connection.execute("DELETE FROM goals WHERE id = (?1)", params![goal_id])?;
    Ok(())
}

/// Completion aggregates for every task on the goal's lists, one list at a
/// time; cross-list totals are the union of the per-list aggregates. Ids of
/// lists that no longer exist contribute nothing.
pub fn aggregates_for_lists(
    list_ids: &[ListID],
    period: Option<&DateRange>,
    db_connection: &Connection,
) -> ApiResult<Vec<TaskAggregate>> {
    let mut aggregates = vec![];

    for &list_id in list_ids {
        let mut statement = match period {
            Some(_) => db_connection.prepare(
                "SELECT tasks.id, tasks.duration_minutes, tasks.allow_multiple_completions, \
                        COUNT(task_completions.id) \
                 FROM tasks LEFT JOIN task_completions \
                   ON task_completions.task_id = tasks.id \
                  AND task_completions.completed_at >= (?2) \
                  AND task_completions.completed_at <= (?3) \
                 WHERE tasks.list_id = (?1) \
                 GROUP BY tasks.id",
            )?,
            None => db_connection.prepare(
                "SELECT tasks.id, tasks.duration_minutes, tasks.allow_multiple_completions, \
                        COUNT(task_completions.id) \
                 FROM tasks LEFT JOIN task_completions \
                   ON task_completions.task_id = tasks.id \
                 WHERE tasks.list_id = (?1) \
                 GROUP BY tasks.id",
            )?,
        };

        let map = |row: &Row| -> rusqlite::Result<TaskAggregate> {
            Ok(TaskAggregate {
                task_id: row.get(0)?,
                duration_minutes: row.get(1)?,
                allow_multiple_completions: row.get(2)?,
                completions: row.get(3)?,
            })
        };

        let rows = match period {
            Some(range) => statement.query_map(
                params![list_id, range.start_timestamp(), range.end_timestamp()],
                map,
            )?,
            None => statement.query_map(params![list_id], map)?,
        };

        for row_result in rows {
            aggregates.push(row_result?);
        }
    }

    Ok(aggregates)
}
