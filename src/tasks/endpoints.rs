use chrono::{Local, NaiveDate};
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

use crate::api_error::{ApiError, ApiResult};
use crate::auth::AuthUser;
use crate::data::DBConnection;
use crate::lists::data::ListID;
use crate::lists::helpers::get_list_from_db;
use crate::period::{resolve_period, resolve_period_clamped};
use crate::permissions::{require_list_access, require_task_manager};

use super::data::*;
use super::helpers::*;

fn parse_reference_date(date: Option<&str>) -> ApiResult<NaiveDate> {
    match date {
        None => Ok(Local::now().date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::Validation(vec!["date".to_string()])),
    }
}

#[get("/lists/<list_id>/tasks?<date>")]
pub fn get_list_tasks(
    list_id: ListID,
    date: Option<&str>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Vec<TaskWithStatus>>> {
    let reference = parse_reference_date(date)?;
    let db_connection = db_connection.lock()?;

    let list = get_list_from_db(list_id, &db_connection)?.ok_or(ApiError::NotFound("list"))?;
    require_list_access(&db_connection, user.id, list_id)?;

    // Navigating to a period that has not started yet snaps back to the
    // current one.
    let period = resolve_period_clamped(list.reset_period, reference, Local::now().date_naive());
    get_tasks_with_status(list_id, period.as_ref(), &db_connection).map(Json)
}

#[post("/tasks", format = "json", data = "<request>")]
pub fn add_task(
    request: Json<CreateTaskRequest>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Task>> {
    if request.title.trim().is_empty() {
        return Err(ApiError::Validation(vec!["title".to_string()]));
    }

    let db_connection = db_connection.lock()?;

    if get_list_from_db(request.list_id, &db_connection)?.is_none() {
        return Err(ApiError::NotFound("list"));
    }
    require_task_manager(&db_connection, user.id, request.list_id)?;

    add_task_to_db(&request, &db_connection).map(Json)
}

#[patch("/tasks/<task_id>", format = "json", data = "<request>")]
pub fn update_task(
    task_id: TaskID,
    request: Json<UpdateTaskRequest>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Task>> {
    let db_connection = db_connection.lock()?;

    let task = get_task_from_db(task_id, &db_connection)?.ok_or(ApiError::NotFound("task"))?;
    require_task_manager(&db_connection, user.id, task.list_id)?;

    update_task_in_db(task_id, &request, &db_connection)?;

    get_task_from_db(task_id, &db_connection)?
        .map(Json)
        .ok_or(ApiError::NotFound("task"))
}

#[delete("/tasks/<task_id>")]
pub fn delete_task(
    task_id: TaskID,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<()> {
    let db_connection = db_connection.lock()?;

    let task = get_task_from_db(task_id, &db_connection)?.ok_or(ApiError::NotFound("task"))?;
    require_task_manager(&db_connection, user.id, task.list_id)?;

    delete_task_from_db(task_id, &db_connection)
}

#[post("/tasks/reorder", format = "json", data = "<request>")]
pub fn reorder_tasks(
    request: Json<ReorderTasksRequest>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<()> {
    let mut db_connection = db_connection.lock()?;

    if get_list_from_db(request.list_id, &db_connection)?.is_none() {
        return Err(ApiError::NotFound("list"));
    }
    require_task_manager(&db_connection, user.id, request.list_id)?;

    reorder_tasks_in_db(request.list_id, &request.task_ids, &mut db_connection)
}

/// Marks the task done now. Tasks that do not allow repeat completions
/// reject a second completion within the list's current period.
#[post("/tasks/<task_id>/complete")]
pub fn complete_task(
    task_id: TaskID,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Completion>> {
    let db_connection = db_connection.lock()?;

    let task = get_task_from_db(task_id, &db_connection)?.ok_or(ApiError::NotFound("task"))?;
    let list =
        get_list_from_db(task.list_id, &db_connection)?.ok_or(ApiError::NotFound("list"))?;
    require_list_access(&db_connection, user.id, task.list_id)?;

    let now = Local::now();
    let period = resolve_period(list.reset_period, now.date_naive());

    if !task.allow_multiple_completions
        && count_completions_in_period(task_id, period.as_ref(), &db_connection)? > 0
    {
        return Err(ApiError::AlreadyCompleted);
    }

    let completed_at = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let id = add_completion_to_db(task_id, user.id, &completed_at, &db_connection)?;

    Ok(Json(Completion {
        id,
        task_id,
        completed_by: Some(user.id),
        completed_by_username: Some(user.username),
        completed_at,
    }))
}

/// Removes the most recent completion in the current period. Only the
/// completion's author may undo it; author-less legacy rows fall back to
/// admins and owners.
#[post("/tasks/<task_id>/undo")]
pub fn undo_completion(
    task_id: TaskID,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<()> {
    let db_connection = db_connection.lock()?;

    let task = get_task_from_db(task_id, &db_connection)?.ok_or(ApiError::NotFound("task"))?;
    let list =
        get_list_from_db(task.list_id, &db_connection)?.ok_or(ApiError::NotFound("list"))?;
    require_list_access(&db_connection, user.id, task.list_id)?;

    let period = resolve_period(list.reset_period, Local::now().date_naive());
    let latest = latest_completion_in_period(task_id, period.as_ref(), &db_connection)?
        .ok_or(ApiError::NothingToUndo)?;

    let may_undo = match latest.completed_by {
        Some(author) => author == user.id,
        None => user.role.is_admin(),
    };
    if !may_undo {
        return Err(ApiError::NotYourCompletion);
    }

    delete_completion_from_db(latest.id, &db_connection)
}

#[get("/tasks/<task_id>/completions")]
pub fn get_task_completions(
    task_id: TaskID,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Vec<Completion>>> {
    let db_connection = db_connection.lock()?;

    let task = get_task_from_db(task_id, &db_connection)?.ok_or(ApiError::NotFound("task"))?;
    require_list_access(&db_connection, user.id, task.list_id)?;

    get_completions_for_task(task_id, &db_connection).map(Json)
}
