pub mod attachments;
pub mod multipart;
pub mod project_handlers;
pub mod proposal_handlers;
pub mod role_handlers;

use actix_web::{
    Error, HttpRequest, HttpResponse, ResponseError, web,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    middleware::Next,
};

use crate::errors::AppError;

/// Whether a mutation may go through with this Content-Type. Bodyless
/// requests (DELETE, the project creation POST) pass.
pub fn acceptable_content_type(method: &Method, content_type: &str, has_body: bool) -> bool {
    let mutating = *method == Method::POST
        || *method == Method::PUT
        || *method == Method::PATCH
        || *method == Method::DELETE;
    if !mutating || !has_body {
        return true;
    }
    content_type.starts_with("application/json") || content_type.starts_with("multipart/form-data")
}

/// Rejects mutation bodies that are neither JSON nor multipart.
async fn require_api_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let has_body = req
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|len| len > 0)
        .unwrap_or_else(|| req.headers().contains_key("transfer-encoding"));

    if !acceptable_content_type(req.method(), content_type, has_body) {
        let response = AppError::validation(
            "Content-Type must be application/json or multipart/form-data",
        )
        .error_response();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> Error {
    AppError::validation(format!("Invalid JSON body: {err}")).into()
}

fn path_error(err: actix_web::error::PathError, _req: &HttpRequest) -> Error {
    AppError::validation(format!("Invalid path: {err}")).into()
}

/// Configure the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error));
    cfg.service(
        web::scope("/proposals")
            .wrap(actix_web::middleware::from_fn(require_api_content_type))
            .route("", web::post().to(proposal_handlers::create))
            .route("/{id}", web::get().to(proposal_handlers::read))
            .route("/{id}", web::patch().to(proposal_handlers::patch))
            .route("/{id}", web::put().to(proposal_handlers::update))
            .route("/{id}", web::delete().to(proposal_handlers::delete)),
    );
    cfg.service(
        web::scope("/projects")
            .wrap(actix_web::middleware::from_fn(require_api_content_type))
            .route("/from-proposal/{id}", web::post().to(project_handlers::from_proposal))
            .route("/{id}", web::get().to(project_handlers::read))
            .route("/{id}", web::put().to(attachments::update_project))
            .route("/{id}/tasks", web::post().to(project_handlers::create_task)),
    );
    cfg.service(
        web::scope("/tasks")
            .wrap(actix_web::middleware::from_fn(require_api_content_type))
            .route("/{id}", web::put().to(attachments::update_task)),
    );
    cfg.service(
        web::scope("/roles")
            .wrap(actix_web::middleware::from_fn(require_api_content_type))
            .route("", web::get().to(role_handlers::list))
            .route("", web::post().to(role_handlers::create))
            .route("/{id}", web::get().to(role_handlers::read))
            .route("/{id}", web::put().to(role_handlers::update))
            .route("/{id}", web::delete().to(role_handlers::delete)),
    );
}
