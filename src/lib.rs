#[macro_use]
extern crate rocket;

pub mod api_error;
pub mod auth;
pub mod data;
pub mod goals;
pub mod lists;
pub mod period;
pub mod permissions;
pub mod tasks;
pub mod users;

use rocket::serde::json::{json, Value};
use rocket::{Build, Rocket};

use data::DBConnection;

#[catch(401)]
fn catch_unauthorized() -> Value {
    json!({ "error": "missing or invalid session token" })
}

#[catch(404)]
fn catch_not_found() -> Value {
    json!({ "error": "not found" })
}

#[catch(422)]
fn catch_unprocessable() -> Value {
    json!({ "error": "malformed request body" })
}

#[catch(500)]
fn catch_internal() -> Value {
    json!({ "error": "internal server error" })
}

/// Assembles the API rocket. The binary adds the static SPA mount on top;
/// tests drive this directly against an in-memory database.
pub fn build_api(db_connection: DBConnection) -> Rocket<Build> {
    rocket::build()
        .manage(db_connection)
        .register(
            "/",
            catchers![
                catch_unauthorized,
                catch_not_found,
                catch_unprocessable,
                catch_internal
            ],
        )
        .mount(
            "/api",
            routes![
                users::endpoints::register,
                users::endpoints::login,
                users::endpoints::logout,
                users::endpoints::me,
                users::endpoints::get_users,
                users::endpoints::update_user,
                lists::endpoints::get_lists,
                lists::endpoints::add_list,
                lists::endpoints::update_list,
                lists::endpoints::delete_list,
                lists::endpoints::get_list_permissions,
                lists::endpoints::set_list_permission,
                lists::endpoints::delete_list_permission,
                tasks::endpoints::get_list_tasks,
                tasks::endpoints::add_task,
                tasks::endpoints::update_task,
                tasks::endpoints::delete_task,
                tasks::endpoints::reorder_tasks,
                tasks::endpoints::complete_task,
                tasks::endpoints::undo_completion,
                tasks::endpoints::get_task_completions,
                goals::endpoints::my_goals,
                goals::endpoints::all_goals,
                goals::endpoints::add_goal,
                goals::endpoints::update_goal,
                goals::endpoints::delete_goal,
                goals::endpoints::goal_progress,
            ],
        )
}
