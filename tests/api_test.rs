//! Request-level checks of the API that fail before touching the database.
//! The pool is lazy and never connects.

use actix_web::{App, http::StatusCode, test, web};
use sqlx::postgres::PgPoolOptions;

use homedesk::config::Config;
use homedesk::errors::{ApiErrorBody, AppError, ErrorKind, classify_response};
use homedesk::handlers;
use homedesk::models::attachment::FileStore;

macro_rules! api_app {
    () => {{
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://homedesk@127.0.0.1:1/unused")
            .unwrap();
        test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(FileStore::new("/nonexistent", "/uploads")))
                .app_data(web::Data::new(Config::default()))
                .service(web::scope("/api").configure(handlers::configure)),
        )
        .await
    }};
}

async fn error_of(resp: actix_web::dev::ServiceResponse) -> (StatusCode, ApiErrorBody) {
    let status = resp.status();
    let body: ApiErrorBody = test::read_body_json(resp).await;
    (status, body)
}

#[actix_rt::test]
async fn test_plain_text_mutation_is_rejected() {
    let app = api_app!();
    let req = test::TestRequest::post()
        .uri("/api/roles")
        .insert_header(("content-type", "text/plain"))
        .set_payload("name=x")
        .to_request();
    let (status, body) = error_of(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "validation_error");
}

#[actix_rt::test]
async fn test_role_without_actions_is_rejected_by_the_server() {
    let app = api_app!();
    let req = test::TestRequest::post()
        .uri("/api/roles")
        .set_json(serde_json::json!({
            "name": "Empty",
            "permissions": [{"page": "Proposals", "url": "/proposals", "actions": {}}]
        }))
        .to_request();
    let (status, body) = error_of(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.message.contains("Select at least one permission"));

    // the client classifies this body back into the same error
    let err = classify_response(status.as_u16(), &serde_json::to_string(&body).unwrap());
    assert!(matches!(err, AppError::Validation(_)));
}

#[actix_rt::test]
async fn test_malformed_json_maps_to_validation() {
    let app = api_app!();
    let req = test::TestRequest::post()
        .uri("/api/proposals")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"customerName\": ")
        .to_request();
    let (status, body) = error_of(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ErrorKind::from_str_opt(&body.error), Some(ErrorKind::Validation));
}

#[actix_rt::test]
async fn test_empty_patch_is_rejected() {
    let app = api_app!();
    let req = test::TestRequest::patch()
        .uri("/api/proposals/3")
        .set_json(serde_json::json!({}))
        .to_request();
    let (status, body) = error_of(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.message, "Nothing to update");
}

#[actix_rt::test]
async fn test_non_numeric_id_is_a_validation_error() {
    let app = api_app!();
    let req = test::TestRequest::get().uri("/api/roles/abc").to_request();
    let (status, _) = error_of(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
