use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use essence_catalog::{NewProduct, PriceQuote, PriceRequest, Product, ProductPatch};
use essence_core::{CatalogSearchParams, SearchPage};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::{admin_auth_middleware, bearer_token, is_admin_token};
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let admin = middleware::from_fn_with_state(state.clone(), admin_auth_middleware);

    // Slug lookups and id mutations share one path segment.
    Router::new()
        .route(
            "/api/products",
            get(search_products).merge(post(create_product).route_layer(admin.clone())),
        )
        .route("/api/products/categories", get(list_categories))
        .route(
            "/api/products/{key}",
            get(get_product).merge(
                put(update_product)
                    .delete(delete_product)
                    .route_layer(admin.clone()),
            ),
        )
        .route("/api/products/{key}/price", get(quote_product))
        .route("/api/products/{key}/toggle", patch(toggle_product).route_layer(admin))
}

/// POST /api/products
async fn create_product(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<NewProduct>, AppError>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = state.catalog.create(payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/products
///
/// A valid admin token widens the search to inactive products.
async fn search_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Query(params), _): WithRejection<Query<CatalogSearchParams>, AppError>,
) -> Result<Json<SearchPage<Product>>, AppError> {
    let privileged = bearer_token(&headers).is_some_and(|token| is_admin_token(&state.auth.secret, token));
    debug!("Product search (privileged: {})", privileged);

    let page = state.catalog.search(&params, privileged).await?;
    Ok(Json(page))
}

/// GET /api/products/categories
async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.catalog.get_categories().await?))
}

/// GET /api/products/{slug}
async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(state.catalog.get_by_slug(&slug).await?))
}

/// GET /api/products/{slug}/price
async fn quote_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    WithRejection(Query(request), _): WithRejection<Query<PriceRequest>, AppError>,
) -> Result<Json<PriceQuote>, AppError> {
    Ok(Json(state.catalog.quote(&slug, &request).await?))
}

/// PUT /api/products/{id}
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    WithRejection(Json(patch), _): WithRejection<Json<ProductPatch>, AppError>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(state.catalog.update(id, patch).await?))
}

/// DELETE /api/products/{id}
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(state.catalog.soft_delete(id).await?))
}

/// PATCH /api/products/{id}/toggle
async fn toggle_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(state.catalog.toggle_active(id).await?))
}
