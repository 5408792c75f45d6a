//! Building endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use cleanit_database::{Building, BuildingFilter, Page, UpdateBuildingRequest};
use cleanit_operations::NewBuilding;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::AuthUser;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct BuildingResponse {
    pub id: String,
    pub owner_id: String,
    pub company_id: Option<String>,
    pub name: String,
    pub address: String,
    pub building_type: Option<String>,
    pub floors_above: i64,
    pub floors_below: i64,
    pub total_floors: i64,
    pub parking_spaces: i64,
    pub cleaning_areas: Vec<String>,
    pub special_notes: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Building> for BuildingResponse {
    fn from(building: Building) -> Self {
        Self {
            total_floors: building.total_floors(),
            id: building.public_id,
            owner_id: building.owner_id,
            company_id: building.company_id,
            name: building.name,
            address: building.address,
            building_type: building.building_type,
            floors_above: building.floors_above,
            floors_below: building.floors_below,
            parking_spaces: building.parking_spaces,
            cleaning_areas: building.cleaning_areas,
            special_notes: building.special_notes,
            is_active: building.is_active,
            created_at: building.created_at,
            updated_at: building.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBuildingBody {
    /// Required when a manager or admin registers the building
    pub owner_id: Option<String>,
    pub company_id: Option<String>,
    pub name: String,
    pub address: String,
    pub building_type: Option<String>,
    #[serde(default)]
    pub floors_above: i64,
    #[serde(default)]
    pub floors_below: i64,
    #[serde(default)]
    pub parking_spaces: i64,
    #[serde(default)]
    pub cleaning_areas: Vec<String>,
    pub special_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBuildingBody {
    pub name: Option<String>,
    pub address: Option<String>,
    pub company_id: Option<String>,
    pub building_type: Option<String>,
    pub floors_above: Option<i64>,
    pub floors_below: Option<i64>,
    pub parking_spaces: Option<i64>,
    pub cleaning_areas: Option<Vec<String>>,
    pub special_notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBuildingsQuery {
    pub owner_id: Option<String>,
    pub company_id: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create building routes
pub fn create_building_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/buildings", get(list_buildings).post(create_building))
        .route("/api/buildings/:building_id", get(get_building).put(update_building))
}

#[utoipa::path(
    get,
    path = "/api/buildings",
    tag = "Buildings",
    params(ListBuildingsQuery),
    responses(
        (status = 200, description = "Buildings visible to the caller", body = Vec<BuildingResponse>),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    )
)]
pub async fn list_buildings(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListBuildingsQuery>,
) -> GatewayResult<Json<Vec<BuildingResponse>>> {
    let filter = BuildingFilter {
        owner_id: query.owner_id,
        company_id: query.company_id,
        include_inactive: query.include_inactive,
    };

    let buildings = state
        .building_service()
        .list(&auth.user, filter, Page::new(query.limit, query.offset))
        .await?;

    Ok(Json(buildings.into_iter().map(BuildingResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/buildings",
    tag = "Buildings",
    request_body = CreateBuildingBody,
    responses(
        (status = 201, description = "Building registered", body = BuildingResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    )
)]
pub async fn create_building(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateBuildingBody>,
) -> GatewayResult<(StatusCode, Json<BuildingResponse>)> {
    let building = state
        .building_service()
        .create(
            &auth.user,
            NewBuilding {
                owner_id: body.owner_id,
                company_id: body.company_id,
                name: body.name,
                address: body.address,
                building_type: body.building_type,
                floors_above: body.floors_above,
                floors_below: body.floors_below,
                parking_spaces: body.parking_spaces,
                cleaning_areas: body.cleaning_areas,
                special_notes: body.special_notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(building.into())))
}

#[utoipa::path(
    get,
    path = "/api/buildings/{building_id}",
    tag = "Buildings",
    params(("building_id" = String, Path, description = "Building id")),
    responses(
        (status = 200, description = "The building", body = BuildingResponse),
        (status = 403, description = "Building belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Building not found", body = ErrorResponse)
    )
)]
pub async fn get_building(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(building_id): Path<String>,
) -> GatewayResult<Json<BuildingResponse>> {
    let building = state.building_service().get(&auth.user, &building_id).await?;
    Ok(Json(building.into()))
}

#[utoipa::path(
    put,
    path = "/api/buildings/{building_id}",
    tag = "Buildings",
    params(("building_id" = String, Path, description = "Building id")),
    request_body = UpdateBuildingBody,
    responses(
        (status = 200, description = "Updated building", body = BuildingResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Building not found", body = ErrorResponse)
    )
)]
pub async fn update_building(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(building_id): Path<String>,
    Json(body): Json<UpdateBuildingBody>,
) -> GatewayResult<Json<BuildingResponse>> {
    let building = state
        .building_service()
        .update(
            &auth.user,
            &building_id,
            UpdateBuildingRequest {
                name: body.name,
                address: body.address,
                company_id: body.company_id,
                building_type: body.building_type,
                floors_above: body.floors_above,
                floors_below: body.floors_below,
                parking_spaces: body.parking_spaces,
                cleaning_areas: body.cleaning_areas,
                special_notes: body.special_notes,
                is_active: body.is_active,
            },
        )
        .await?;

    Ok(Json(building.into()))
}
