//! Company endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use cleanit_database::{Company, CreateCompanyRequest, Page};
use cleanit_operations::{ManagerAccount, NewCompany};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::users::{SetActiveBody, UserResponse};
use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::AuthUser;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyResponse {
    pub id: String,
    pub name: String,
    pub business_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub worker_count: i64,
    pub building_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Company> for CompanyResponse {
    fn from(company: Company) -> Self {
        Self {
            id: company.public_id,
            name: company.name,
            business_number: company.business_number,
            phone: company.phone,
            address: company.address,
            is_active: company.is_active,
            worker_count: company.worker_count,
            building_count: company.building_count,
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManagerBody {
    pub login_id: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub contact_email: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompanyBody {
    pub name: String,
    pub business_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// First manager account, created in the same transaction
    pub manager: ManagerBody,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanySignupResponse {
    pub company: CompanyResponse,
    pub manager: UserResponse,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCompaniesQuery {
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create company routes
pub fn create_company_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/companies", get(list_companies).post(create_company))
        .route("/api/companies/:company_id", get(get_company))
        .route("/api/companies/:company_id/active", post(set_company_active))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    params(ListCompaniesQuery),
    responses(
        (status = 200, description = "Visible companies", body = Vec<CompanyResponse>),
        (status = 403, description = "Missing view_company", body = ErrorResponse)
    )
)]
pub async fn list_companies(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListCompaniesQuery>,
) -> GatewayResult<Json<Vec<CompanyResponse>>> {
    let companies = state
        .company_service()
        .list(&auth.user, query.include_inactive, Page::new(query.limit, query.offset))
        .await?;

    Ok(Json(companies.into_iter().map(CompanyResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyBody,
    responses(
        (status = 201, description = "Company and manager created", body = CompanySignupResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Missing manage_companies", body = ErrorResponse),
        (status = 409, description = "Manager login id already in use", body = ErrorResponse)
    )
)]
pub async fn create_company(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateCompanyBody>,
) -> GatewayResult<(StatusCode, Json<CompanySignupResponse>)> {
    let manager = body.manager;
    let (company, manager) = state
        .company_service()
        .create_with_manager(
            &auth.user,
            NewCompany {
                company: CreateCompanyRequest {
                    name: body.name,
                    business_number: body.business_number,
                    phone: body.phone,
                    address: body.address,
                },
                manager: ManagerAccount {
                    login_id: manager.login_id,
                    password: manager.password,
                    name: manager.name,
                    phone: manager.phone,
                    contact_email: manager.contact_email,
                    department: manager.department,
                    position: manager.position,
                },
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CompanySignupResponse {
            company: company.into(),
            manager: manager.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/companies/{company_id}",
    tag = "Companies",
    params(("company_id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "The company", body = CompanyResponse),
        (status = 403, description = "Another company", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    )
)]
pub async fn get_company(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(company_id): Path<String>,
) -> GatewayResult<Json<CompanyResponse>> {
    let company = state.company_service().get(&auth.user, &company_id).await?;
    Ok(Json(company.into()))
}

#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/active",
    tag = "Companies",
    params(("company_id" = String, Path, description = "Company id")),
    request_body = SetActiveBody,
    responses(
        (status = 200, description = "Activation updated", body = CompanyResponse),
        (status = 403, description = "Missing manage_companies", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    )
)]
pub async fn set_company_active(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(company_id): Path<String>,
    Json(body): Json<SetActiveBody>,
) -> GatewayResult<Json<CompanyResponse>> {
    let company = state
        .company_service()
        .set_active(&auth.user, &company_id, body.is_active)
        .await?;
    Ok(Json(company.into()))
}
