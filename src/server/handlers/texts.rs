use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    response::Json,
};
use serde_json::{Map, Value};

use super::system::AppState;
use crate::analysis::{analyze_value, StatName, StatisticsRecord};
use crate::error::{AppError, AppResult};
use crate::server::auth::Viewer;
use crate::server::response::ApiResponse;
use crate::service::{TextInput, TextView};
use crate::storage::Text;

// ==================== Request parsing ====================

pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> AppResult<Map<String, Value>> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(AppError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

fn text_id(path: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::BadRequest("ID must be a number".to_string()))
}

/// Optional string field; `null` counts as absent
fn string_field(body: &Map<String, Value>, field: &str, label: &str) -> AppResult<Option<String>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AppError::InvalidInput(format!("{} must be a string", label))),
    }
}

fn text_input(body: &Map<String, Value>) -> AppResult<TextInput> {
    Ok(TextInput {
        title: string_field(body, "title", "Title")?,
        content: string_field(body, "content", "Content")?,
    })
}

// ==================== Handlers ====================

pub async fn create_text(
    State(state): State<AppState>,
    viewer: Viewer,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<ApiResponse<Text>> {
    let input = text_input(&json_body(body)?)?;
    let text = state.texts.create(input, viewer.id).await?;
    Ok(ApiResponse::created("Text created successfully", text))
}

pub async fn list_texts(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<Text>>> {
    let texts = state.texts.list_all().await?;
    Ok(ApiResponse::cached("All texts retrieved", texts))
}

pub async fn get_text(
    State(state): State<AppState>,
    viewer: Viewer,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<ApiResponse<TextView>> {
    let id = text_id(path)?;
    let view = state.texts.get_by_id(id, viewer.id).await?;
    Ok(ApiResponse::cached("Text retrieved successfully", view))
}

pub async fn update_text(
    State(state): State<AppState>,
    viewer: Viewer,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<ApiResponse<Text>> {
    let id = text_id(path)?;
    let input = text_input(&json_body(body)?)?;
    let text = state.texts.update(id, input, viewer.id).await?;
    Ok(ApiResponse::ok("Text updated successfully", text))
}

pub async fn delete_text(
    State(state): State<AppState>,
    viewer: Viewer,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<ApiResponse<()>> {
    let id = text_id(path)?;
    state.texts.delete(id, viewer.id).await?;
    Ok(ApiResponse::message("Text deleted successfully"))
}

/// `GET /api/v1/texts/{stat}/{id}`
pub async fn get_statistic(
    State(state): State<AppState>,
    viewer: Viewer,
    Path((stat, id)): Path<(String, String)>,
) -> AppResult<ApiResponse<Map<String, Value>>> {
    let stat: StatName = stat
        .parse()
        .map_err(|_| AppError::NotFound("Statistic".to_string()))?;
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::BadRequest("ID must be a number".to_string()))?;

    let entry = state.texts.get_statistic(id, stat, viewer.id).await?;
    Ok(ApiResponse::cached(
        format!("{} retrieved successfully", stat.readable()),
        entry,
    ))
}

/// Analyze `{ "text": ... }` without storing anything
pub async fn analyze_text(
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<ApiResponse<StatisticsRecord>> {
    let body = json_body(body)?;
    let text = body
        .get("text")
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::MissingField("Text".to_string()))?;
    let report = analyze_value(text)?;
    Ok(ApiResponse::ok("Text analyzed successfully", report))
}
