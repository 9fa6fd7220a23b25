use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Form, Json, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Result, TodoAppError};
use crate::todo::{validate_text, TodoItem, TodoStats, TodoStore};
use crate::ui::{self, Notice};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TodoStore>,
}

impl AppState {
    pub fn new(store: TodoStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Deserialize)]
struct PageQuery {
    added: Option<String>,
}

#[derive(Deserialize)]
struct AddTodoForm {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AddTodoRequest {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct ListResponse {
    items: Vec<TodoItem>,
    completed: usize,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/todos", post(add_todo))
        .route("/todos/:id/toggle", post(toggle_todo))
        .route("/todos/:id/delete", post(delete_todo))
        .route("/health", get(health))
        .route("/api/todos", get(api_list).post(api_add))
        .route("/api/todos/:id/toggle", post(api_toggle))
        .route("/api/todos/:id", axum::routing::delete(api_delete))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    let notice = query
        .added
        .filter(|text| !text.is_empty())
        .map(|text| Notice::Success(format!("Added: {text}")));
    render_list(&state, StatusCode::OK, notice.as_ref()).await
}

async fn add_todo(State(state): State<AppState>, Form(form): Form<AddTodoForm>) -> Response {
    let text = match validate_text(&form.text) {
        Ok(text) => text,
        Err(err) => {
            let notice = Notice::Error(err.to_string());
            return render_list(&state, StatusCode::UNPROCESSABLE_ENTITY, Some(&notice)).await;
        }
    };
    match state.store.add(text).await {
        Ok(item) => {
            let location = format!("/?added={}", urlencoding::encode(&item.text));
            Redirect::to(&location).into_response()
        }
        Err(err) => page_error(err),
    }
}

async fn toggle_todo(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.store.toggle(id).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(err) => page_error(err),
    }
}

async fn delete_todo(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.store.delete(id).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(err) => page_error(err),
    }
}

async fn render_list(state: &AppState, status: StatusCode, notice: Option<&Notice>) -> Response {
    match state.store.list().await {
        Ok(items) => (status, Html(ui::render_page(&items, notice))).into_response(),
        Err(err) => page_error(err),
    }
}

fn page_error(err: TodoAppError) -> Response {
    tracing::error!(error = %err, "todo operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CACHE_CONTROL, "no-store")],
        Html(ui::render_error_page(&err.to_string())),
    )
        .into_response()
}

async fn api_list(State(state): State<AppState>) -> Response {
    match state.store.list().await {
        Ok(items) => {
            let stats = TodoStats::from_items(&items);
            let body = ListResponse {
                items,
                completed: stats.completed,
                total: stats.total,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => api_error(err),
    }
}

async fn api_add(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddTodoRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return api_error(TodoAppError::Validation(rejection.body_text())),
    };
    let text = match validate_text(&payload.text) {
        Ok(text) => text,
        Err(err) => return api_error(err),
    };
    match state.store.add(text).await {
        Ok(item) => (StatusCode::CREATED, Json(json!({ "item": item }))).into_response(),
        Err(err) => api_error(err),
    }
}

async fn api_toggle(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.store.toggle(id).await {
        Ok(item) => (StatusCode::OK, Json(json!({ "item": item }))).into_response(),
        Err(err) => api_error(err),
    }
}

async fn api_delete(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.store.delete(id).await {
        Ok(deleted) => (StatusCode::OK, Json(json!({ "deleted": deleted }))).into_response(),
        Err(err) => api_error(err),
    }
}

fn api_error(err: TodoAppError) -> Response {
    let status = match err {
        TodoAppError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => {
            tracing::error!(error = %err, "todo operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

pub async fn run_with_shutdown<F>(host: &str, port: u16, data_file: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(TodoStore::new(data_file));
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TodoAppError::Runtime(e.to_string()))?;
    tracing::info!(%addr, data_file, "todo app listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| TodoAppError::Runtime(e.to_string()))?;

    Ok(())
}
