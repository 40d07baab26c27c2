use actix_web::{HttpResponse, delete, get, post, web};
use resmon_service::ResourceService;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResource {
    pub url: String,
}

#[derive(Serialize)]
struct Data<T> {
    data: T,
}

fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Data { data })
}

#[get("/resources")]
pub async fn list_resources(service: web::Data<ResourceService>) -> Result<HttpResponse, ApiError> {
    Ok(ok(service.get_resources().await?))
}

/// Registers a url once its validation probe comes back healthy
#[post("/resources")]
pub async fn create_resource(
    service: web::Data<ResourceService>,
    body: web::Json<CreateResource>,
) -> Result<HttpResponse, ApiError> {
    Ok(ok(service.create_resource(&body.url).await?))
}

#[get("/resources/{resource_id}")]
pub async fn get_resource(
    service: web::Data<ResourceService>,
    resource_id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(ok(service.get_resource(resource_id.into_inner()).await?))
}

#[delete("/resources/{resource_id}")]
pub async fn delete_resource(
    service: web::Data<ResourceService>,
    resource_id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    service.delete_resource(resource_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "detail": "Resource was successfully deleted" })))
}

#[get("/resources/{resource_id}/statuses")]
pub async fn get_statuses(
    service: web::Data<ResourceService>,
    resource_id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(ok(service.get_statuses_by_resource(resource_id.into_inner()).await?))
}
