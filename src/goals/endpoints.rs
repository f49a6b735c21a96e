use chrono::{Local, NaiveDate};
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

use crate::api_error::{ApiError, ApiResult};
use crate::auth::AuthUser;
use crate::data::DBConnection;
use crate::period::resolve_period_clamped;
use crate::users::helpers::get_user_from_db;

use super::data::*;
use super::helpers::*;
use super::progress::{evaluate, GoalProgress};

fn validate_goal_request(request: &CreateGoalRequest) -> ApiResult<()> {
    let mut bad_fields = vec![];
    if request.name.trim().is_empty() {
        bad_fields.push("name".to_string());
    }
    if request.target_value <= 0 {
        bad_fields.push("target_value".to_string());
    }
    if request.list_ids.is_empty() {
        bad_fields.push("list_ids".to_string());
    }

    if bad_fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(bad_fields))
    }
}

#[get("/goals/my-goals")]
pub fn my_goals(user: AuthUser, db_connection: &State<DBConnection>) -> ApiResult<Json<Vec<Goal>>> {
    let db_connection = db_connection.lock()?;
    get_goals_for_user(user.id, &db_connection).map(Json)
}

#[get("/goals/all-goals")]
pub fn all_goals(user: AuthUser, db_connection: &State<DBConnection>) -> ApiResult<Json<Vec<Goal>>> {
    let db_connection = db_connection.lock()?;
    get_all_goals_from_db(user.id, &db_connection).map(Json)
}

#[post("/goals", format = "json", data = "<request>")]
pub fn add_goal(
    request: Json<CreateGoalRequest>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Goal>> {
    validate_goal_request(&request)?;

    let db_connection = db_connection.lock()?;
    add_goal_to_db(&request, user.id, &db_connection).map(Json)
}

#[patch("/goals/<goal_id>", format = "json", data = "<request>")]
pub fn update_goal(
    goal_id: GoalID,
    request: Json<UpdateGoalRequest>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Goal>> {
    let mut bad_fields = vec![];
    if matches!(&request.name, Some(name) if name.trim().is_empty()) {
        bad_fields.push("name".to_string());
    }
    if matches!(request.target_value, Some(target) if target <= 0) {
        bad_fields.push("target_value".to_string());
    }
    if matches!(&request.list_ids, Some(ids) if ids.is_empty()) {
        bad_fields.push("list_ids".to_string());
    }
    if !bad_fields.is_empty() {
        return Err(ApiError::Validation(bad_fields));
    }

    let db_connection = db_connection.lock()?;

    let goal = get_goal_from_db(goal_id, &db_connection)?.ok_or(ApiError::NotFound("goal"))?;
    if goal.user_id != user.id && !user.role.is_admin() {
        return Err(ApiError::access_denied("you can only edit your own goals"));
    }

    update_goal_in_db(goal_id, &request, &db_connection)?;

    get_goal_from_db(goal_id, &db_connection)?
        .map(Json)
        .ok_or(ApiError::NotFound("goal"))
}

#[delete("/goals/<goal_id>")]
pub fn delete_goal(
    goal_id: GoalID,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<()> {
    let db_connection = db_connection.lock()?;

    let goal = get_goal_from_db(goal_id, &db_connection)?.ok_or(ApiError::NotFound("goal"))?;
    if goal.user_id != user.id && !user.role.is_admin() {
        return Err(ApiError::access_denied("you can only delete your own goals"));
    }

    delete_goal_from_db(goal_id, &db_connection)
}

/// Progress for the period containing `date` (today when omitted). A date in
/// a future period falls back to the current one. The response shape is the
/// same for current and historical periods.
#[get("/goals/<goal_id>/progress?<date>")]
pub fn goal_progress(
    goal_id: GoalID,
    date: Option<&str>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<GoalProgress>> {
    let reference = match date {
        None => Local::now().date_naive(),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::Validation(vec!["date".to_string()]))?,
    };

    let db_connection = db_connection.lock()?;

    let goal = get_goal_from_db(goal_id, &db_connection)?.ok_or(ApiError::NotFound("goal"))?;

    if goal.user_id != user.id && !user.role.is_admin() {
        let owner =
            get_user_from_db(goal.user_id, &db_connection)?.ok_or(ApiError::NotFound("user"))?;
        if owner.hide_goals {
            return Err(ApiError::access_denied("this user's goals are private"));
        }
    }

    let today = Local::now().date_naive();
    let period = resolve_period_clamped(goal.period_type.as_reset_period(), reference, today)
        .ok_or_else(|| ApiError::Internal("goal period did not resolve".to_string()))?;

    let aggregates = aggregates_for_lists(&goal.list_ids, Some(&period), &db_connection)?;

    Ok(Json(evaluate(
        goal.calculation_type,
        goal.target_value,
        &aggregates,
    )))
}
