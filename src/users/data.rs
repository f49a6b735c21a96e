use serde::{Deserialize, Serialize};

pub type UserID = i64;

/// Global account role. A flat enum compared by rank; `owner` and `admin`
/// matter for user administration and the legacy completion-undo fallback,
/// list access is always governed by per-list permission rows.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::Owner)
    }
}

/// Account row as exposed over the API. The password hash never leaves the
/// helpers module.
#[derive(Serialize, Debug, Clone)]
pub struct User {
    pub id: UserID,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub hide_goals: bool,
    pub hide_completed_tasks: bool,
}

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize, Debug)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub hide_goals: Option<bool>,
    pub hide_completed_tasks: Option<bool>,
    pub role: Option<Role>,
}
