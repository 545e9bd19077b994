use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::catalog::{self, BatchOutcome, BatchResult, CatalogError, FailureClass};
use crate::model::Spell;
use crate::store::SpellStore;

pub type AppState<S> = Arc<S>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct BatchItemResponse {
    pub message: String,
    pub responsecode: u16,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub count: usize,
    pub responsecode: u16,
    pub responsemessage: String,
    pub data: Vec<BatchItemResponse>,
}

fn failure_status(class: FailureClass) -> StatusCode {
    match class {
        FailureClass::InvalidInput => StatusCode::BAD_REQUEST,
        FailureClass::Conflict => StatusCode::CONFLICT,
        FailureClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<BatchResult> for BatchResponse {
    fn from(result: BatchResult) -> Self {
        let (status, message) = if result.some_failed() {
            (
                StatusCode::BAD_REQUEST,
                "Some errors occurred while processing input. See data for details.",
            )
        } else {
            (StatusCode::CREATED, "Spell(s) added")
        };

        let data = result
            .outcomes
            .into_iter()
            .map(|outcome| match outcome {
                BatchOutcome::Created => BatchItemResponse {
                    message: "spell added".to_string(),
                    responsecode: StatusCode::CREATED.as_u16(),
                },
                BatchOutcome::Failed { message, class } => BatchItemResponse {
                    message,
                    responsecode: failure_status(class).as_u16(),
                },
            })
            .collect();

        Self {
            count: result.count,
            responsecode: status.as_u16(),
            responsemessage: message.to_string(),
            data,
        }
    }
}

pub async fn get_spell<S: SpellStore>(
    State(store): State<AppState<S>>,
    Path(name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Spell>, (StatusCode, Json<ErrorResponse>)> {
    match catalog::find_spell(store.as_ref(), &name, &params).await {
        Ok(Some(spell)) => Ok(Json(spell)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("spell not found")),
        )),
        Err(e @ CatalogError::AmbiguousMatch) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(&e.to_string())),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&e.to_string())),
        )),
    }
}

pub async fn post_spell<S: SpellStore>(
    State(store): State<AppState<S>>,
    RequestJson(spell): RequestJson<Spell>,
) -> Result<(StatusCode, Json<Spell>), (StatusCode, Json<ErrorResponse>)> {
    match catalog::create_spell(store.as_ref(), &spell).await {
        Ok(()) => Ok((StatusCode::CREATED, Json(spell))),
        Err(e @ CatalogError::Invalid(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(&e.to_string())),
        )),
        Err(e @ CatalogError::AlreadyExists) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(&e.to_string())),
        )),
        // AmbiguousMatch here means the pre-flight lookup hit inconsistent
        // data, not a client mistake; it falls through as internal.
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&e.to_string())),
        )),
    }
}

pub async fn post_spell_batch<S: SpellStore>(
    State(store): State<AppState<S>>,
    RequestJson(request): RequestJson<BatchRequest>,
) -> (StatusCode, Json<BatchResponse>) {
    let result = catalog::create_many(store.as_ref(), request.data).await;
    let response = BatchResponse::from(result);
    let status =
        StatusCode::from_u16(response.responsecode).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

pub async fn delete_spell<S: SpellStore>(
    State(store): State<AppState<S>>,
    Path(name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<(StatusCode, Json<MessageResponse>), (StatusCode, Json<ErrorResponse>)> {
    match catalog::delete_spell(store.as_ref(), &name, &params).await {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(MessageResponse {
                message: "spell removed".to_string(),
            }),
        )),
        Err(e @ CatalogError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(&e.to_string())),
        )),
        // The client supplied a filter loose enough to match several
        // spells; narrowing with `system` resolves it.
        Err(e @ CatalogError::AmbiguousMatch) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(&e.to_string())),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&e.to_string())),
        )),
    }
}

pub async fn list_spells<S: SpellStore>(
    State(store): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Spell>>, (StatusCode, Json<ErrorResponse>)> {
    match catalog::list_spells(store.as_ref(), &params).await {
        Ok(spells) => Ok(Json(spells)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&e.to_string())),
        )),
    }
}

pub async fn get_spell_metadata<S: SpellStore>(
    State(store): State<AppState<S>>,
    Path(field): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    match catalog::distinct_values(store.as_ref(), &field).await {
        Ok(values) => {
            let mut body = serde_json::Map::new();
            body.insert(field, serde_json::json!(values));
            Ok(Json(Value::Object(body)))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&e.to_string())),
        )),
    }
}

pub async fn list_spell_metadata<S: SpellStore>(
    State(store): State<AppState<S>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<String>>, (StatusCode, Json<ErrorResponse>)> {
    match catalog::distinct_field_names(store.as_ref(), &params).await {
        Ok(names) => Ok(Json(names)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(&e.to_string())),
        )),
    }
}
