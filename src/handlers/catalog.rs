use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    models::{CatalogFilter, NewProductoServicio, ProductoServicio},
    AppState,
};

use super::extract::{Json, Path, Query};

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub tipo: Option<String>,
    pub subtipo: Option<String>,
}

/// POST /productoservicios
/// Add a price-list entry. `importe` is stored with exactly two decimals.
pub async fn create_product(
    State(state): State<AppState>,
    Json(product): Json<NewProductoServicio>,
) -> Result<(StatusCode, Json<ProductoServicio>)> {
    let product = product.normalized()?;
    let created = state.store.create_product(product).await?;
    tracing::info!(
        "Price list entry {} ({}) at {}",
        created.codigo_prestacion,
        created.nombre_prestacion,
        created.importe
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /productoservicios/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductoServicio>> {
    state
        .store
        .get_product(id)
        .await?
        .ok_or(Error::not_found("ProductoServicio", id))
        .map(Json)
}

/// GET /productoservicios?tipo=&subtipo=
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<ProductoServicio>>> {
    let mut filter = CatalogFilter::new();
    if let Some(tipo) = query.tipo.as_deref().filter(|t| !t.is_empty()) {
        filter = filter.with_tipo(tipo);
    }
    if let Some(subtipo) = query.subtipo.as_deref().filter(|s| !s.is_empty()) {
        filter = filter.with_subtipo(subtipo);
    }

    Ok(Json(state.store.list_products(filter).await?))
}
