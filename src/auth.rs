//! Bearer-token session guard. Endpoints take an [`AuthUser`] argument and
//! Rocket resolves it from the `Authorization` header before the handler runs.

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::api_error::{ApiError, ApiResult};
use crate::data::DBConnection;
use crate::users::data::{Role, UserID};

#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: UserID,
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = ApiError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match request
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "))
        {
            Some(token) => token,
            None => return Outcome::Error((Status::Unauthorized, ApiError::Unauthorized)),
        };

        let db_connection = match request.rocket().state::<DBConnection>() {
            Some(db_connection) => db_connection,
            None => {
                return Outcome::Error((
                    Status::InternalServerError,
                    ApiError::Internal("database handle not managed".to_string()),
                ))
            }
        };

        match lookup_session(token, db_connection) {
            Ok(Some(user)) => Outcome::Success(user),
            Ok(None) => Outcome::Error((Status::Unauthorized, ApiError::Unauthorized)),
            Err(error) => Outcome::Error((Status::InternalServerError, error)),
        }
    }
}

fn lookup_session(token: &str, db_connection: &DBConnection) -> ApiResult<Option<AuthUser>> {
    let db_connection = db_connection.lock()?;

    let mut statement = db_connection.prepare(
        "SELECT users.id, users.username, users.email, users.role \
         FROM sessions JOIN users ON users.id = sessions.user_id \
         WHERE sessions.token = (?1)",
    )?;

    let user = statement
        .query_row(params![token], |row| {
            let role: String = row.get(3)?;
            Ok(AuthUser {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                role: Role::parse(&role).unwrap_or(Role::User),
            })
        })
        .optional()?;

    Ok(user)
}

/// Extracts the raw bearer token, for logout.
pub fn bearer_token<'r>(request: &'r Request<'_>) -> Option<&'r str> {
    request
        .headers()
        .get_one("Authorization")
        .and_then(|header| header.strip_prefix("Bearer "))
}

pub struct BearerToken(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = ApiError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match bearer_token(request) {
            Some(token) => Outcome::Success(BearerToken(token.to_string())),
            None => Outcome::Error((Status::Unauthorized, ApiError::Unauthorized)),
        }
    }
}
