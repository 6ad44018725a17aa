//! Route handlers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::VaultError;
use crate::model::{Car, CarPatch, NewCar};
use crate::service::CarService;

/// Error returned by handlers; renders as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError(pub VaultError);

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(VaultError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Build the router for `service`
pub fn router(service: Arc<CarService>) -> Router {
    let api = Router::new()
        .route("/cars", get(list_cars).post(create_car))
        .route("/cars/brand/:brand", get(cars_by_brand))
        .route("/cars/:id", get(get_car).put(update_car).delete(delete_car));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Run a service call on the blocking pool
async fn blocking<T, F>(service: Arc<CarService>, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&CarService) -> crate::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|e| {
            ApiError(VaultError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("service task failed: {}", e),
            )))
        })?
        .map_err(ApiError)
}

async fn health(State(service): State<Arc<CarService>>) -> impl IntoResponse {
    Json(json!({ "ok": true, "cache": service.cache_enabled() }))
}

async fn list_cars(State(service): State<Arc<CarService>>) -> ApiResult<Json<Vec<Car>>> {
    blocking(service, |s| s.get_all()).await.map(Json)
}

async fn get_car(
    State(service): State<Arc<CarService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Car>> {
    blocking(service, move |s| s.get_by_id(&id)).await.map(Json)
}

async fn create_car(
    State(service): State<Arc<CarService>>,
    body: Result<Json<NewCar>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Car>)> {
    let Json(new) = body?;
    let car = blocking(service, move |s| s.create(new)).await?;
    Ok((StatusCode::CREATED, Json(car)))
}

async fn update_car(
    State(service): State<Arc<CarService>>,
    Path(id): Path<String>,
    body: Result<Json<CarPatch>, JsonRejection>,
) -> ApiResult<Json<Car>> {
    let Json(patch) = body?;
    blocking(service, move |s| s.update(&id, patch)).await.map(Json)
}

async fn delete_car(
    State(service): State<Arc<CarService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = id.clone();
    blocking(service, move |s| s.delete(&id)).await?;
    Ok(Json(json!({ "message": format!("car {} deleted", deleted) })))
}

async fn cars_by_brand(
    State(service): State<Arc<CarService>>,
    Path(brand): Path<String>,
) -> ApiResult<Json<Vec<Car>>> {
    blocking(service, move |s| s.find_by_brand(&brand)).await.map(Json)
}
