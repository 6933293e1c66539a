pub(crate) mod sample_data;

use super::*;
use crate::data_store::store_mock::StoreMock;
use crate::web::AppState;
use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::{http, test, App};
use std::sync::Arc;

const APP_SECRET: &str = "123456";

fn create_state() -> AppState {
    let data_store_mock = StoreMock::default();
    sample_data::fill_sample_data(&data_store_mock);
    AppState::with_store(Arc::new(data_store_mock), APP_SECRET)
}

fn session_header(user_id: crate::data_store::UserId) -> (String, String) {
    (
        "X-SESSION-TOKEN".to_string(),
        SessionToken::new(user_id).as_string(APP_SECRET),
    )
}

fn bearer_header(user_id: crate::data_store::UserId) -> (http::header::HeaderName, String) {
    (
        http::header::AUTHORIZATION,
        format!(
            "Bearer {}",
            SessionToken::new(user_id).as_string(APP_SECRET)
        ),
    )
}

async fn error_message(res: ServiceResponse) -> String {
    let body = res.into_body().try_into_bytes().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    value["error"].as_str().unwrap().to_owned()
}

#[actix_web::test]
async fn test_list_guests() {
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(create_state())),
    )
    .await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}/guests", sample_data::EVENT_ID))
        .append_header(session_header(sample_data::CLIENT_ID))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let body = res.into_body().try_into_bytes().unwrap();
    let result: Vec<villa_planner_api_types::Guest> = serde_json::from_slice(&body).unwrap();
    assert_eq!(result.len(), 4);
    // Ordered by last name
    assert_eq!(result[0].last_name, "Bianchi");
    assert_eq!(result[3].last_name, "Verdi");
}

#[actix_web::test]
async fn test_occupancy() {
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(create_state())),
    )
    .await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}/occupancy", sample_data::EVENT_ID))
        .append_header(session_header(sample_data::ADMIN_ID))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let body = res.into_body().try_into_bytes().unwrap();
    let result: Vec<villa_planner_api_types::ApartmentOccupancy> =
        serde_json::from_slice(&body).unwrap();
    assert_eq!(result.len(), 4);
    assert_eq!(result[0].apartment_id, "apt_1");
    assert_eq!(result[0].status, villa_planner_api_types::OccupancyStatus::Full);
    assert_eq!(result[1].status, villa_planner_api_types::OccupancyStatus::Partial);
    assert_eq!(result[2].status, villa_planner_api_types::OccupancyStatus::Free);
    assert_eq!(result[3].label, "Woodcutter's House");
}

#[actix_web::test]
async fn test_event_access() {
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(create_state())),
    )
    .await;
    let uri = format!("/api/v1/events/{}", sample_data::EVENT_ID);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri(&uri)
        .append_header(session_header(sample_data::STRANGER_ID))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&uri)
        .append_header(session_header(sample_data::CLIENT_ID))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let body = res.into_body().try_into_bytes().unwrap();
    let event: villa_planner_api_types::Event = serde_json::from_slice(&body).unwrap();
    assert_eq!(event.name, "Anna & Marco");
    assert_eq!(event.status, villa_planner_api_types::EventStatus::Draft);
}

#[actix_web::test]
async fn test_create_user_and_event_requires_token() {
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(create_state())),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/create-user-and-event")
        .set_json(json!({"email": "new@example.com", "password": "secret123", "event_name": "X"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNAUTHORIZED);
    assert_eq!(
        error_message(res).await,
        "Missing Authorization Bearer token"
    );
}

#[actix_web::test]
async fn test_create_user_and_event_authenticates_before_parsing() {
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(create_state())),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/create-user-and-event")
        .insert_header(http::header::ContentType::json())
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/create-user-and-event")
        .append_header(bearer_header(sample_data::ADMIN_ID))
        .insert_header(http::header::ContentType::json())
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
    assert!(error_message(res)
        .await
        .starts_with("Invalid JSON request data"));
}

#[actix_web::test]
async fn test_create_user_and_event_requires_admin() {
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(create_state())),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/create-user-and-event")
        .append_header(bearer_header(sample_data::CLIENT_ID))
        .set_json(json!({"email": "new@example.com", "password": "secret123", "event_name": "X"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_create_user_and_event_missing_fields() {
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(create_state())),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/create-user-and-event")
        .append_header(bearer_header(sample_data::ADMIN_ID))
        .set_json(json!({"email": "  ", "password": "secret123", "event_name": "Wedding"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(res).await,
        "Missing fields: email/password/event_name"
    );

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/create-user-and-event")
        .append_header(bearer_header(sample_data::ADMIN_ID))
        .set_json(json!({"email": "new@example.com", "password": "123", "event_name": "Wedding"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
}
