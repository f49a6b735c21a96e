use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, put, State};

use crate::api_error::{ApiError, ApiResult};
use crate::auth::AuthUser;
use crate::data::DBConnection;
use crate::permissions::require_list_owner;
use crate::users::data::UserID;

use super::data::*;
use super::helpers::*;

#[get("/lists")]
pub fn get_lists(
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Vec<ListWithPermission>>> {
    let db_connection = db_connection.lock()?;
    get_lists_for_user(user.id, &db_connection).map(Json)
}

#[post("/lists", format = "json", data = "<request>")]
pub fn add_list(
    request: Json<CreateListRequest>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<List>> {
    if request.name.trim().is_empty() {
        return Err(ApiError::Validation(vec!["name".to_string()]));
    }

    let mut db_connection = db_connection.lock()?;
    let list = add_list_to_db(&request, user.id, &mut db_connection)?;
    tracing::info!(list = %list.name, user = %user.username, "created list");

    Ok(Json(list))
}

#[patch("/lists/<list_id>", format = "json", data = "<request>")]
pub fn update_list(
    list_id: ListID,
    request: Json<UpdateListRequest>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<List>> {
    let db_connection = db_connection.lock()?;

    if get_list_from_db(list_id, &db_connection)?.is_none() {
        return Err(ApiError::NotFound("list"));
    }
    require_list_owner(&db_connection, user.id, list_id)?;

    update_list_in_db(list_id, &request, &db_connection)?;

    get_list_from_db(list_id, &db_connection)?
        .map(Json)
        .ok_or(ApiError::NotFound("list"))
}

#[delete("/lists/<list_id>")]
pub fn delete_list(
    list_id: ListID,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<()> {
    let db_connection = db_connection.lock()?;

    if get_list_from_db(list_id, &db_connection)?.is_none() {
        return Err(ApiError::NotFound("list"));
    }
    require_list_owner(&db_connection, user.id, list_id)?;

    delete_list_from_db(list_id, &db_connection)
}

#[get("/lists/<list_id>/permissions")]
pub fn get_list_permissions(
    list_id: ListID,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Vec<PermissionEntry>>> {
    let db_connection = db_connection.lock()?;

    if get_list_from_db(list_id, &db_connection)?.is_none() {
        return Err(ApiError::NotFound("list"));
    }
    require_list_owner(&db_connection, user.id, list_id)?;

    get_list_permissions_from_db(list_id, &db_connection).map(Json)
}

#[put("/lists/<list_id>/permissions", format = "json", data = "<request>")]
pub fn set_list_permission(
    list_id: ListID,
    request: Json<SetPermissionRequest>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<Vec<PermissionEntry>>> {
    let db_connection = db_connection.lock()?;

    if get_list_from_db(list_id, &db_connection)?.is_none() {
        return Err(ApiError::NotFound("list"));
    }
    require_list_owner(&db_connection, user.id, list_id)?;

    if crate::users::helpers::get_user_from_db(request.user_id, &db_connection)?.is_none() {
        return Err(ApiError::NotFound("user"));
    }

    set_list_permission_in_db(list_id, &request, &db_connection)?;
    get_list_permissions_from_db(list_id, &db_connection).map(Json)
}

#[delete("/lists/<list_id>/permissions/<user_id>")]
pub fn delete_list_permission(
    list_id: ListID,
    user_id: UserID,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<()> {
    let db_connection = db_connection.lock()?;

    if get_list_from_db(list_id, &db_connection)?.is_none() {
        return Err(ApiError::NotFound("list"));
    }
    require_list_owner(&db_connection, user.id, list_id)?;

    // A list must keep its owner; owners hand the list over before leaving.
    if user_id == user.id {
        return Err(ApiError::Validation(vec!["user_id".to_string()]));
    }

    delete_list_permission_from_db(list_id, user_id, &db_connection)
}
