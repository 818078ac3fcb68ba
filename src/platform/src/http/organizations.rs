use std::sync::Arc;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing;
use axum::Router;
use common::http::Json;
use common::http::Path;

use crate::organizations::CreateOrganizationRequest;
use crate::organizations::DataResponse;
use crate::organizations::EmptyResponse;
use crate::organizations::Organization;
use crate::organizations::OrganizationNode;
use crate::organizations::Organizations;
use crate::organizations::UpdateOrganizationRequest;
use crate::Result;

async fn create(
    Extension(provider): Extension<Arc<Organizations>>,
    Json(request): Json<CreateOrganizationRequest>,
) -> Result<Json<DataResponse<OrganizationNode>>> {
    Ok(Json(DataResponse {
        data: provider.create(request).await?,
    }))
}

async fn get_by_id(
    Extension(provider): Extension<Arc<Organizations>>,
    Path(org_id): Path<i64>,
) -> Result<Json<DataResponse<OrganizationNode>>> {
    Ok(Json(DataResponse {
        data: provider.get_by_id(org_id).await?,
    }))
}

async fn list(
    Extension(provider): Extension<Arc<Organizations>>,
) -> Result<Json<Vec<Organization>>> {
    Ok(Json(provider.list().await?))
}

async fn update(
    Extension(provider): Extension<Arc<Organizations>>,
    Path(org_id): Path<i64>,
    Json(request): Json<UpdateOrganizationRequest>,
) -> Result<(StatusCode, Json<DataResponse<Organization>>)> {
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: provider.update(org_id, request).await?,
        }),
    ))
}

async fn delete(
    Extension(provider): Extension<Arc<Organizations>>,
    Path(org_id): Path<i64>,
) -> Result<Json<EmptyResponse>> {
    provider.delete(org_id).await?;

    Ok(Json(EmptyResponse {}))
}

pub fn attach_routes(router: Router) -> Router {
    router
        .route("/organization", routing::post(create))
        .route(
            "/organization/:org_id",
            routing::get(get_by_id).delete(delete).put(update),
        )
        .route("/organizations", routing::get(list))
}
