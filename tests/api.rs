use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::{Client, LocalResponse};
use rusqlite::{params, Connection};
use serde_json::{json, Value};

use std::sync::{Arc, Mutex};

use nest::data::{init_schema, DBConnection};

fn test_client() -> (Client, DBConnection) {
    let connection = Connection::open_in_memory().expect("in-memory database");
    init_schema(&connection).expect("schema");
    let db_connection: DBConnection = Arc::new(Mutex::new(connection));

    let client = Client::tracked(nest::build_api(db_connection.clone())).expect("valid rocket");
    (client, db_connection)
}

fn auth(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

fn body(response: LocalResponse<'_>) -> Value {
    response.into_json().expect("json body")
}

/// Registers a user and returns their bearer token and id.
fn register(client: &Client, username: &str) -> (String, i64) {
    let response = client
        .post("/api/auth/register")
        .header(ContentType::JSON)
        .body(
            json!({
                "username": username,
                "email": format!("{username}@nest.test"),
                "password": "hunter2",
            })
            .to_string(),
        )
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    let session = body(response);
    (
        session["token"].as_str().unwrap().to_string(),
        session["user"]["id"].as_i64().unwrap(),
    )
}

fn create_list(client: &Client, token: &str, name: &str, reset_period: &str) -> i64 {
    let response = client
        .post("/api/lists")
        .header(ContentType::JSON)
        .header(auth(token))
        .body(json!({ "name": name, "reset_period": reset_period }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    body(response)["id"].as_i64().unwrap()
}

fn create_task(client: &Client, token: &str, list_id: i64, title: &str, duration: i64) -> i64 {
    let response = client
        .post("/api/tasks")
        .header(ContentType::JSON)
        .header(auth(token))
        .body(
            json!({
                "list_id": list_id,
                "title": title,
                "duration_minutes": duration,
            })
            .to_string(),
        )
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    body(response)["id"].as_i64().unwrap()
}

fn grant(client: &Client, token: &str, list_id: i64, user_id: i64, level: &str) {
    let response = client
        .put(format!("/api/lists/{list_id}/permissions"))
        .header(ContentType::JSON)
        .header(auth(token))
        .body(json!({ "user_id": user_id, "permission_level": level }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
}

#[test]
fn register_login_and_me() {
    let (client, _db) = test_client();
    let (token, _) = register(&client, "ada");

    let me = client.get("/api/auth/me").header(auth(&token)).dispatch();
    assert_eq!(me.status(), Status::Ok);
    let me = body(me);
    assert_eq!(me["username"], "ada");
    // First account on a fresh install administers the household.
    assert_eq!(me["role"], "owner");

    let login = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(json!({ "username": "ada", "password": "hunter2" }).to_string())
        .dispatch();
    assert_eq!(login.status(), Status::Ok);

    let bad_login = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(json!({ "username": "ada", "password": "wrong" }).to_string())
        .dispatch();
    assert_eq!(bad_login.status(), Status::Unauthorized);
}

#[test]
fn unauthenticated_requests_are_rejected() {
    let (client, _db) = test_client();
    let response = client.get("/api/lists").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn register_validates_fields() {
    let (client, _db) = test_client();
    let response = client
        .post("/api/auth/register")
        .header(ContentType::JSON)
        .body(json!({ "username": "", "email": "nope", "password": "" }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);

    let errors = body(response);
    let fields: Vec<&str> = errors["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["username", "email", "password"]);
}

#[test]
fn lists_are_visible_only_with_a_permission_row() {
    let (client, _db) = test_client();
    let (ada, _) = register(&client, "ada");
    let (brian, brian_id) = register(&client, "brian");

    let list_id = create_list(&client, &ada, "Kitchen", "weekly");

    // Brian has no permission row yet: the list is invisible and locked.
    let lists = body(client.get("/api/lists").header(auth(&brian)).dispatch());
    assert_eq!(lists.as_array().unwrap().len(), 0);
    let tasks = client
        .get(format!("/api/lists/{list_id}/tasks"))
        .header(auth(&brian))
        .dispatch();
    assert_eq!(tasks.status(), Status::Forbidden);

    grant(&client, &ada, list_id, brian_id, "user");

    let lists = body(client.get("/api/lists").header(auth(&brian)).dispatch());
    assert_eq!(lists.as_array().unwrap().len(), 1);
    assert_eq!(lists[0]["permission"], "user");
}

#[test]
fn only_owners_manage_lists_and_admins_manage_tasks() {
    let (client, _db) = test_client();
    let (ada, _) = register(&client, "ada");
    let (brian, brian_id) = register(&client, "brian");

    let list_id = create_list(&client, &ada, "Kitchen", "weekly");
    grant(&client, &ada, list_id, brian_id, "user");

    // A plain user can neither edit the list nor add tasks.
    let edit = client
        .patch(format!("/api/lists/{list_id}"))
        .header(ContentType::JSON)
        .header(auth(&brian))
        .body(json!({ "name": "Brian's kitchen" }).to_string())
        .dispatch();
    assert_eq!(edit.status(), Status::Forbidden);

    let add = client
        .post("/api/tasks")
        .header(ContentType::JSON)
        .header(auth(&brian))
        .body(json!({ "list_id": list_id, "title": "Dishes" }).to_string())
        .dispatch();
    assert_eq!(add.status(), Status::Forbidden);

    // Promoted to admin, Brian can manage tasks but still not the list.
    grant(&client, &ada, list_id, brian_id, "admin");
    let add = client
        .post("/api/tasks")
        .header(ContentType::JSON)
        .header(auth(&brian))
        .body(json!({ "list_id": list_id, "title": "Dishes" }).to_string())
        .dispatch();
    assert_eq!(add.status(), Status::Ok);

    let edit = client
        .patch(format!("/api/lists/{list_id}"))
        .header(ContentType::JSON)
        .header(auth(&brian))
        .body(json!({ "name": "Brian's kitchen" }).to_string())
        .dispatch();
    assert_eq!(edit.status(), Status::Forbidden);

    let permissions = client
        .get(format!("/api/lists/{list_id}/permissions"))
        .header(auth(&brian))
        .dispatch();
    assert_eq!(permissions.status(), Status::Forbidden);
}

#[test]
fn completing_and_undoing_tasks() {
    let (client, _db) = test_client();
    let (ada, _) = register(&client, "ada");
    let list_id = create_list(&client, &ada, "Kitchen", "weekly");
    let task_id = create_task(&client, &ada, list_id, "Dishes", 15);

    let complete = client
        .post(format!("/api/tasks/{task_id}/complete"))
        .header(auth(&ada))
        .dispatch();
    assert_eq!(complete.status(), Status::Ok);

    // Dishes does not allow repeats within the same week.
    let again = client
        .post(format!("/api/tasks/{task_id}/complete"))
        .header(auth(&ada))
        .dispatch();
    assert_eq!(again.status(), Status::BadRequest);

    let tasks = body(
        client
            .get(format!("/api/lists/{list_id}/tasks"))
            .header(auth(&ada))
            .dispatch(),
    );
    assert_eq!(tasks[0]["completed"], true);
    assert_eq!(tasks[0]["completions_in_period"], 1);

    let undo = client
        .post(format!("/api/tasks/{task_id}/undo"))
        .header(auth(&ada))
        .dispatch();
    assert_eq!(undo.status(), Status::Ok);

    // The log is empty again, so there is nothing left to undo.
    let undo = client
        .post(format!("/api/tasks/{task_id}/undo"))
        .header(auth(&ada))
        .dispatch();
    assert_eq!(undo.status(), Status::NotFound);
}

#[test]
fn undo_requires_authorship() {
    let (client, _db) = test_client();
    let (ada, _) = register(&client, "ada");
    let (brian, brian_id) = register(&client, "brian");

    let list_id = create_list(&client, &ada, "Kitchen", "weekly");
    let task_id = create_task(&client, &ada, list_id, "Dishes", 15);
    grant(&client, &ada, list_id, brian_id, "user");

    let complete = client
        .post(format!("/api/tasks/{task_id}/complete"))
        .header(auth(&brian))
        .dispatch();
    assert_eq!(complete.status(), Status::Ok);

    // Even the list owner cannot undo someone else's completion.
    let undo = client
        .post(format!("/api/tasks/{task_id}/undo"))
        .header(auth(&ada))
        .dispatch();
    assert_eq!(undo.status(), Status::Forbidden);

    let completions = body(
        client
            .get(format!("/api/tasks/{task_id}/completions"))
            .header(auth(&ada))
            .dispatch(),
    );
    assert_eq!(completions.as_array().unwrap().len(), 1);
    assert_eq!(completions[0]["completed_by_username"], "brian");

    // The author may.
    let undo = client
        .post(format!("/api/tasks/{task_id}/undo"))
        .header(auth(&brian))
        .dispatch();
    assert_eq!(undo.status(), Status::Ok);
}

#[test]
fn admins_may_undo_legacy_authorless_completions() {
    let (client, db) = test_client();
    let (ada, _) = register(&client, "ada"); // global owner
    let (brian, brian_id) = register(&client, "brian");

    let list_id = create_list(&client, &ada, "Kitchen", "static");
    let task_id = create_task(&client, &ada, list_id, "Dishes", 15);
    grant(&client, &ada, list_id, brian_id, "user");

    {
        let connection = db.lock().unwrap();
        connection
            .execute(
                "INSERT INTO task_completions (task_id, completed_by, completed_at) \
                 VALUES (?1, NULL, '2023-01-05 12:00:00')",
                params![task_id],
            )
            .unwrap();
    }

    // Brian is neither the author (there is none) nor an admin.
    let undo = client
        .post(format!("/api/tasks/{task_id}/undo"))
        .header(auth(&brian))
        .dispatch();
    assert_eq!(undo.status(), Status::Forbidden);

    let undo = client
        .post(format!("/api/tasks/{task_id}/undo"))
        .header(auth(&ada))
        .dispatch();
    assert_eq!(undo.status(), Status::Ok);
}

#[test]
fn static_lists_keep_completions_forever() {
    let (client, db) = test_client();
    let (ada, _) = register(&client, "ada");
    let list_id = create_list(&client, &ada, "Projects", "static");
    let task_id = create_task(&client, &ada, list_id, "Paint fence", 120);

    {
        let connection = db.lock().unwrap();
        connection
            .execute(
                "INSERT INTO task_completions (task_id, completed_by, completed_at) \
                 VALUES (?1, 1, '2020-03-14 10:00:00')",
                params![task_id],
            )
            .unwrap();
    }

    // Years later, and at any reference date, the completion still counts.
    for date in ["2020-03-14", "2024-06-12"] {
        let tasks = body(
            client
                .get(format!("/api/lists/{list_id}/tasks?date={date}"))
                .header(auth(&ada))
                .dispatch(),
        );
        assert_eq!(tasks[0]["completed"], true, "reference date {date}");
    }
}

#[test]
fn weekly_lists_reset_between_weeks() {
    let (client, db) = test_client();
    let (ada, _) = register(&client, "ada");
    let list_id = create_list(&client, &ada, "Kitchen", "weekly");
    let task_id = create_task(&client, &ada, list_id, "Dishes", 15);

    {
        let connection = db.lock().unwrap();
        connection
            .execute(
                "INSERT INTO task_completions (task_id, completed_by, completed_at) \
                 VALUES (?1, 1, '2024-06-11 08:00:00')",
                params![task_id],
            )
            .unwrap();
    }

    // Completed within the 2024-06-10..16 week, clean the week after.
    let in_week = body(
        client
            .get(format!("/api/lists/{list_id}/tasks?date=2024-06-12"))
            .header(auth(&ada))
            .dispatch(),
    );
    assert_eq!(in_week[0]["completed"], true);

    let next_week = body(
        client
            .get(format!("/api/lists/{list_id}/tasks?date=2024-06-19"))
            .header(auth(&ada))
            .dispatch(),
    );
    assert_eq!(next_week[0]["completed"], false);
}

#[test]
fn goal_progress_fixed_time_scenario() {
    let (client, db) = test_client();
    let (ada, _) = register(&client, "ada");
    let list_id = create_list(&client, &ada, "Kitchen", "weekly");
    let dishes = create_task(&client, &ada, list_id, "Dishes", 20);
    let vacuum = create_task(&client, &ada, list_id, "Vacuum", 25);

    {
        let connection = db.lock().unwrap();
        for task_id in [dishes, vacuum] {
            connection
                .execute(
                    "INSERT INTO task_completions (task_id, completed_by, completed_at) \
                     VALUES (?1, 1, '2024-06-11 08:00:00')",
                    params![task_id],
                )
                .unwrap();
        }
    }

    let goal = client
        .post("/api/goals")
        .header(ContentType::JSON)
        .header(auth(&ada))
        .body(
            json!({
                "name": "An hour of chores",
                "calculation_type": "fixed_time",
                "target_value": 60,
                "period_type": "weekly",
                "list_ids": [list_id],
            })
            .to_string(),
        )
        .dispatch();
    assert_eq!(goal.status(), Status::Ok);
    let goal_id = body(goal)["id"].as_i64().unwrap();

    // 20 + 25 minutes toward 60: ceil(45/60*100) = 75, not achieved.
    let progress = body(
        client
            .get(format!("/api/goals/{goal_id}/progress?date=2024-06-12"))
            .header(auth(&ada))
            .dispatch(),
    );
    assert_eq!(progress["completed"], 45);
    assert_eq!(progress["required"], 60);
    assert_eq!(progress["percentage"], 75);
    assert_eq!(progress["isAchieved"], false);

    // The week before, nothing was done.
    let progress = body(
        client
            .get(format!("/api/goals/{goal_id}/progress?date=2024-06-05"))
            .header(auth(&ada))
            .dispatch(),
    );
    assert_eq!(progress["completed"], 0);
    assert_eq!(progress["percentage"], 0);
}

#[test]
fn goal_progress_task_count_rounds_up() {
    let (client, db) = test_client();
    let (ada, _) = register(&client, "ada");
    let list_id = create_list(&client, &ada, "Kitchen", "weekly");
    let dishes = create_task(&client, &ada, list_id, "Dishes", 10);
    let _vacuum = create_task(&client, &ada, list_id, "Vacuum", 10);
    let laundry = create_task(&client, &ada, list_id, "Laundry", 10);

    {
        let connection = db.lock().unwrap();
        for task_id in [dishes, laundry] {
            connection
                .execute(
                    "INSERT INTO task_completions (task_id, completed_by, completed_at) \
                     VALUES (?1, 1, '2024-06-11 08:00:00')",
                    params![task_id],
                )
                .unwrap();
        }
    }

    let goal = client
        .post("/api/goals")
        .header(ContentType::JSON)
        .header(auth(&ada))
        .body(
            json!({
                "name": "Most chores",
                "calculation_type": "percentage_task_count",
                "target_value": 80,
                "period_type": "weekly",
                "list_ids": [list_id],
            })
            .to_string(),
        )
        .dispatch();
    let goal_id = body(goal)["id"].as_i64().unwrap();

    let progress = body(
        client
            .get(format!("/api/goals/{goal_id}/progress?date=2024-06-12"))
            .header(auth(&ada))
            .dispatch(),
    );
    assert_eq!(progress["completed"], 2);
    assert_eq!(progress["required"], 3);
    assert_eq!(progress["percentage"], 67); // ceil(2/3*100), never 66
}

#[test]
fn hidden_goals_stay_private() {
    let (client, _db) = test_client();
    let (ada, ada_id) = register(&client, "ada");
    let (brian, _) = register(&client, "brian");

    let list_id = create_list(&client, &ada, "Kitchen", "weekly");
    let goal = client
        .post("/api/goals")
        .header(ContentType::JSON)
        .header(auth(&ada))
        .body(
            json!({
                "name": "Secret ambitions",
                "calculation_type": "fixed_task_count",
                "target_value": 5,
                "period_type": "weekly",
                "list_ids": [list_id],
            })
            .to_string(),
        )
        .dispatch();
    let goal_id = body(goal)["id"].as_i64().unwrap();

    // Visible to everyone until Ada hides her goals.
    let all = body(client.get("/api/goals/all-goals").header(auth(&brian)).dispatch());
    assert_eq!(all.as_array().unwrap().len(), 1);

    let hide = client
        .patch(format!("/api/users/{ada_id}"))
        .header(ContentType::JSON)
        .header(auth(&ada))
        .body(json!({ "hide_goals": true }).to_string())
        .dispatch();
    assert_eq!(hide.status(), Status::Ok);

    let all = body(client.get("/api/goals/all-goals").header(auth(&brian)).dispatch());
    assert_eq!(all.as_array().unwrap().len(), 0);

    let progress = client
        .get(format!("/api/goals/{goal_id}/progress"))
        .header(auth(&brian))
        .dispatch();
    assert_eq!(progress.status(), Status::Forbidden);

    // Ada still sees her own.
    let mine = body(client.get("/api/goals/my-goals").header(auth(&ada)).dispatch());
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[test]
fn deleting_a_list_cascades_to_tasks_and_completions() {
    let (client, db) = test_client();
    let (ada, _) = register(&client, "ada");
    let list_id = create_list(&client, &ada, "Kitchen", "weekly");
    let task_id = create_task(&client, &ada, list_id, "Dishes", 15);

    let complete = client
        .post(format!("/api/tasks/{task_id}/complete"))
        .header(auth(&ada))
        .dispatch();
    assert_eq!(complete.status(), Status::Ok);

    let delete = client
        .delete(format!("/api/lists/{list_id}"))
        .header(auth(&ada))
        .dispatch();
    assert_eq!(delete.status(), Status::Ok);

    let connection = db.lock().unwrap();
    let tasks: i64 = connection
        .query_row("SELECT COUNT(*) FROM tasks", params![], |row| row.get(0))
        .unwrap();
    let completions: i64 = connection
        .query_row("SELECT COUNT(*) FROM task_completions", params![], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(tasks, 0);
    assert_eq!(completions, 0);
}

#[test]
fn missing_resources_return_not_found() {
    let (client, _db) = test_client();
    let (ada, _) = register(&client, "ada");

    let response = client
        .get("/api/lists/999/tasks")
        .header(auth(&ada))
        .dispatch();
    assert_eq!(response.status(), Status::NotFound);

    let response = client
        .get("/api/goals/999/progress")
        .header(auth(&ada))
        .dispatch();
    assert_eq!(response.status(), Status::NotFound);

    let response = client
        .post("/api/tasks/999/complete")
        .header(auth(&ada))
        .dispatch();
    assert_eq!(response.status(), Status::NotFound);
}
