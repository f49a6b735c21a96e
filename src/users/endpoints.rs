use rocket::serde::json::Json;
use rocket::{get, patch, post, State};

use crate::api_error::{ApiError, ApiResult};
use crate::auth::{AuthUser, BearerToken};
use crate::data::DBConnection;

use super::data::*;
use super::helpers::*;

#[post("/auth/register", format = "json", data = "<request>")]
pub fn register(
    request: Json<RegisterRequest>,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<SessionResponse>> {
    validate_register_request(&request)?;

    let db_connection = db_connection.lock()?;

    if get_user_by_username(&request.username, &db_connection)?.is_some() {
        return Err(ApiError::Validation(vec!["username".to_string()]));
    }

    let user = add_user_to_db(&request, &db_connection)?;
    let token = create_session(user.id, &db_connection)?;
    tracing::info!(username = %user.username, "registered user");

    Ok(Json(SessionResponse { token, user }))
}

#[post("/auth/login", format = "json", data = "<request>")]
pub fn login(
    request: Json<LoginRequest>,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<SessionResponse>> {
    let db_connection = db_connection.lock()?;

    let (user, stored_hash) = get_user_by_username(&request.username, &db_connection)?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&request.password, &stored_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = create_session(user.id, &db_connection)?;

    Ok(Json(SessionResponse { token, user }))
}

#[post("/auth/logout")]
pub fn logout(
    token: BearerToken,
    _user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<()> {
    let db_connection = db_connection.lock()?;
    delete_session(&token.0, &db_connection)
}

#[get("/auth/me")]
pub fn me(user: AuthUser, db_connection: &State<DBConnection>) -> ApiResult<Json<User>> {
    let db_connection = db_connection.lock()?;

    get_user_from_db(user.id, &db_connection)?
        .map(Json)
        .ok_or(ApiError::NotFound("user"))
}

#[get("/users")]
pub fn get_users(_user: AuthUser, db_connection: &State<DBConnection>) -> ApiResult<Json<Vec<User>>> {
    let db_connection = db_connection.lock()?;
    get_all_users_from_db(&db_connection).map(Json)
}

#[patch("/users/<user_id>", format = "json", data = "<request>")]
pub fn update_user(
    user_id: UserID,
    request: Json<UpdateUserRequest>,
    user: AuthUser,
    db_connection: &State<DBConnection>,
) -> ApiResult<Json<User>> {
    if user.id != user_id && !user.role.is_admin() {
        return Err(ApiError::access_denied("you can only edit your own account"));
    }
    // Promoting or demoting accounts is reserved for the household owner.
    if request.role.is_some() && user.role != Role::Owner {
        return Err(ApiError::access_denied("only the owner can change roles"));
    }

    let db_connection = db_connection.lock()?;

    if get_user_from_db(user_id, &db_connection)?.is_none() {
        return Err(ApiError::NotFound("user"));
    }

    update_user_in_db(user_id, &request, &db_connection)?;

    get_user_from_db(user_id, &db_connection)?
        .map(Json)
        .ok_or(ApiError::NotFound("user"))
}
