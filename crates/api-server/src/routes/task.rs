//! Task API endpoints
//!
//! Every handler works on the caller's own task store.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tasknest_core::store::{FilterCounts, FilterCriteria};
use tasknest_core::task::{today, Task, TaskDraft, TaskId, TaskPriority, TaskStatus};

use crate::error::{core_error, route_error, RouteError};
use crate::routes::auth::authorize;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

impl UpdateTaskRequest {
    fn apply_to(self, mut task: Task) -> Task {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        task
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskViewResponse {
    pub criteria: FilterCriteria,
    pub tasks: Vec<Task>,
    pub counts: FilterCounts,
    pub loading: bool,
}

#[derive(Debug, Serialize)]
pub struct EmptyTrashResponse {
    pub removed: u64,
}

fn task_not_found(id: &TaskId) -> RouteError {
    route_error(StatusCode::NOT_FOUND, format!("Task {} not found", id))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks - The caller's whole collection
async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    Ok(Json(user.store().tasks().await))
}

/// GET /api/tasks/view - The collection narrowed by the current criteria
async fn view_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TaskViewResponse>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    let snapshot = user.store().snapshot().await;
    let today = today();

    Ok(Json(TaskViewResponse {
        tasks: snapshot.filtered_on(today),
        counts: snapshot.counts_on(today),
        criteria: snapshot.criteria,
        loading: snapshot.loading,
    }))
}

/// POST /api/tasks - Create a task for the caller
async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<TaskDraft>,
) -> Result<(StatusCode, Json<Task>), RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    let task = user.store().add_task(draft).await.map_err(core_error)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/tasks/{id} - Edit a task
async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    let id = TaskId::from(id);
    let existing = user
        .store()
        .find(&id)
        .await
        .ok_or_else(|| task_not_found(&id))?;

    let task = user
        .store()
        .update_task(req.apply_to(existing))
        .await
        .map_err(core_error)?;
    Ok(Json(task))
}

/// DELETE /api/tasks/{id} - Permanently delete a task
async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    user.store()
        .delete_task(&TaskId::from(id))
        .await
        .map_err(core_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_status(
    state: AppState,
    headers: HeaderMap,
    id: String,
    target: TaskStatus,
) -> Result<Json<Task>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    let id = TaskId::from(id);
    let store = user.store();

    let changed = match target {
        TaskStatus::Completed => store.complete_task(&id).await,
        TaskStatus::Trash => store.trash_task(&id).await,
        TaskStatus::Pending => store.restore_task(&id).await,
    };
    changed.map_err(core_error)?;

    store
        .find(&id)
        .await
        .map(Json)
        .ok_or_else(|| task_not_found(&id))
}

/// POST /api/tasks/{id}/complete
async fn complete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Task>, RouteError> {
    change_status(state, headers, id, TaskStatus::Completed).await
}

/// POST /api/tasks/{id}/trash
async fn trash_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Task>, RouteError> {
    change_status(state, headers, id, TaskStatus::Trash).await
}

/// POST /api/tasks/{id}/restore
async fn restore_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Task>, RouteError> {
    change_status(state, headers, id, TaskStatus::Pending).await
}

/// DELETE /api/trash - Purge every trashed task of the caller
async fn empty_trash(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EmptyTrashResponse>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    let removed = user.store().empty_trash().await.map_err(core_error)?;
    Ok(Json(EmptyTrashResponse { removed }))
}

/// GET /api/tags
async fn list_tags(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<String>>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    Ok(Json(user.store().all_tags().await))
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/view", get(view_tasks))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .route("/api/tasks/{id}/complete", post(complete_task))
        .route("/api/tasks/{id}/trash", post(trash_task))
        .route("/api/tasks/{id}/restore", post(restore_task))
        .route("/api/trash", delete(empty_trash))
        .route("/api/tags", get(list_tags))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::routes::testing::{app, build_state, read_json, register_user, request};

    async fn create(app: &Router, token: &str, body: Value) -> Value {
        let response = app
            .clone()
            .oneshot(request("POST", "/api/tasks", Some(token), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        read_json(response).await
    }

    #[tokio::test]
    async fn create_and_list_tasks() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let token = register_user(&app, "a@example.com").await;

        let task = create(
            &app,
            &token,
            json!({ "title": "Write tests", "priority": "High", "tags": ["dev", " dev "] }),
        )
        .await;
        assert_eq!(task["title"], "Write tests");
        assert_eq!(task["status"], "Pending");
        assert_eq!(task["tags"], json!(["dev"]));
        assert!(task["dueDate"].is_string());

        let response = app
            .oneshot(request("GET", "/api/tasks", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let tasks = read_json(response).await;
        assert_eq!(tasks.as_array().unwrap().len(), 1);
        assert_eq!(tasks[0]["id"], task["id"]);
    }

    #[tokio::test]
    async fn blank_title_is_bad_request() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let token = register_user(&app, "a@example.com").await;

        let response = app
            .oneshot(request(
                "POST",
                "/api/tasks",
                Some(&token),
                Some(json!({ "title": "   " })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tasks_require_authentication() {
        let (state, _tmp) = build_state().await;
        let response = app(state)
            .oneshot(request("GET", "/api/tasks", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn users_never_see_each_others_tasks() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let alice = register_user(&app, "alice@example.com").await;
        let bob = register_user(&app, "bob@example.com").await;

        let task = create(&app, &alice, json!({ "title": "Alice's" })).await;
        let id = task["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", "/api/tasks", Some(&bob), None))
            .await
            .unwrap();
        assert_eq!(read_json(response).await, json!([]));

        let response = app
            .oneshot(request(
                "POST",
                &format!("/api/tasks/{}/complete", id),
                Some(&bob),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let token = register_user(&app, "a@example.com").await;
        let task = create(&app, &token, json!({ "title": "Draft", "description": "keep" })).await;
        let id = task["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/api/tasks/{}", id),
                Some(&token),
                Some(json!({ "title": "Final", "dueDate": "2030-01-02" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = read_json(response).await;
        assert_eq!(updated["title"], "Final");
        assert_eq!(updated["description"], "keep");
        assert_eq!(updated["dueDate"], "2030-01-02");
        assert_eq!(updated["createdAt"], task["createdAt"]);

        let response = app
            .oneshot(request(
                "PUT",
                "/api/tasks/does-not-exist",
                Some(&token),
                Some(json!({ "title": "Nope" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lifecycle_through_trash() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let token = register_user(&app, "a@example.com").await;
        let keep = create(&app, &token, json!({ "title": "Keep", "tags": ["home"] })).await;
        let junk = create(&app, &token, json!({ "title": "Junk" })).await;
        let junk_id = junk["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/tasks/{}/complete", junk_id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(read_json(response).await["status"], "Completed");

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/tasks/{}/trash", junk_id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(read_json(response).await["status"], "Trash");

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/tasks/{}/complete", junk_id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(request("DELETE", "/api/trash", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(read_json(response).await["removed"], 1);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/tasks", Some(&token), None))
            .await
            .unwrap();
        let tasks = read_json(response).await;
        assert_eq!(tasks.as_array().unwrap().len(), 1);
        assert_eq!(tasks[0]["id"], keep["id"]);

        let response = app
            .oneshot(request("GET", "/api/tags", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(read_json(response).await, json!(["home"]));
    }

    #[tokio::test]
    async fn restore_and_delete() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let token = register_user(&app, "a@example.com").await;
        let task = create(&app, &token, json!({ "title": "Oops" })).await;
        let id = task["id"].as_str().unwrap();

        for action in ["trash", "restore"] {
            let response = app
                .clone()
                .oneshot(request(
                    "POST",
                    &format!("/api/tasks/{}/{}", id, action),
                    Some(&token),
                    None,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("/api/tasks/{}", id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request(
                "DELETE",
                &format!("/api/tasks/{}", id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn view_applies_criteria() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let token = register_user(&app, "a@example.com").await;
        create(&app, &token, json!({ "title": "Buy milk" })).await;
        create(&app, &token, json!({ "title": "Write essay" })).await;

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                "/api/criteria",
                Some(&token),
                Some(json!({ "search": "MILK" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request("GET", "/api/tasks/view", Some(&token), None))
            .await
            .unwrap();
        let view = read_json(response).await;
        assert_eq!(view["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(view["tasks"][0]["title"], "Buy milk");
        assert_eq!(view["counts"]["all"], 2);
        assert_eq!(view["criteria"]["search"], "MILK");
    }
}
