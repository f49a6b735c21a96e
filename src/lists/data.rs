use serde::{Deserialize, Serialize};

use crate::period::ResetPeriod;
use crate::permissions::PermissionLevel;
use crate::users::data::UserID;

pub type ListID = i64;

#[derive(Serialize, Debug, Clone)]
pub struct List {
    pub id: ListID,
    pub name: String,
    pub description: Option<String>,
    pub reset_period: ResetPeriod,
    pub created_by: Option<UserID>,
    pub sort_order: i64,
}

/// A list together with the requesting user's own permission on it, which
/// the client uses to decide which controls to render.
#[derive(Serialize, Debug)]
pub struct ListWithPermission {
    #[serde(flatten)]
    pub list: List,
    pub permission: PermissionLevel,
}

#[derive(Deserialize, Debug)]
pub struct CreateListRequest {
    pub name: String,
    pub description: Option<String>,
    pub reset_period: Option<ResetPeriod>,
    pub sort_order: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub reset_period: Option<ResetPeriod>,
    pub sort_order: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct PermissionEntry {
    pub user_id: UserID,
    pub username: String,
    pub permission_level: PermissionLevel,
}

#[derive(Deserialize, Debug)]
pub struct SetPermissionRequest {
    pub user_id: UserID,
    pub permission_level: PermissionLevel,
}
