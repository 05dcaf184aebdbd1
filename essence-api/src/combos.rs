use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use essence_catalog::{Combo, ComboPatch, NewCombo};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::admin_auth_middleware;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let admin = middleware::from_fn_with_state(state.clone(), admin_auth_middleware);

    Router::new()
        .route(
            "/api/combos",
            get(list_combos).merge(post(create_combo).route_layer(admin.clone())),
        )
        .route(
            "/api/combos/{id}",
            get(get_combo).merge(put(update_combo).delete(delete_combo).route_layer(admin)),
        )
}

/// POST /api/combos
async fn create_combo(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<NewCombo>, AppError>,
) -> Result<(StatusCode, Json<Combo>), AppError> {
    let combo = state.combos.create(payload).await?;
    Ok((StatusCode::CREATED, Json(combo)))
}

/// GET /api/combos
async fn list_combos(State(state): State<AppState>) -> Result<Json<Vec<Combo>>, AppError> {
    Ok(Json(state.combos.list().await?))
}

/// GET /api/combos/{id}
async fn get_combo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Combo>, AppError> {
    Ok(Json(state.combos.get(id).await?))
}

/// PUT /api/combos/{id}
async fn update_combo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    WithRejection(Json(patch), _): WithRejection<Json<ComboPatch>, AppError>,
) -> Result<Json<Combo>, AppError> {
    Ok(Json(state.combos.update(id, patch).await?))
}

/// DELETE /api/combos/{id}
async fn delete_combo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Combo>, AppError> {
    Ok(Json(state.combos.delete(id).await?))
}
