use actix_web::web::ServiceConfig;

mod health;
mod resources;

pub fn routes(cfg: &mut ServiceConfig) {
    cfg.service(health::health_route)
        .service(resources::list_resources)
        .service(resources::create_resource)
        .service(resources::get_resource)
        .service(resources::delete_resource)
        .service(resources::get_statuses);
}
