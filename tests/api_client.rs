mod common;

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;

use common::{auth_response, mesa, reserva, MockBackend, Route};
use reservas_cliente::api::{ReservationQuery, TableQuery};
use reservas_cliente::models::{GuestReservation, ReservationStatus, Role, TableStatus};
use reservas_cliente::AppError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[actix_web::test]
async fn test_login_returns_session_and_sends_credentials() {
    let backend = MockBackend::start(vec![Route::post(
        "/api/auth/login/",
        auth_response(7, "mesero1", "mesero"),
    )])
    .await;

    let session = backend.client().login("mesero1", "secreta123").await.unwrap();
    assert_eq!(session.token, "token-mesero1");
    assert_eq!(session.role, Role::Waiter);
    assert_eq!(session.role_display_name, "Mesero");
    assert_eq!(session.full_name, "Ana Rojas");

    let sent = backend.requests_to("POST", "/api/auth/login/");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body["password"], "secreta123");
    assert!(sent[0].authorization.is_none());

    backend.stop().await;
}

#[actix_web::test]
async fn test_error_message_comes_from_server_body() {
    let backend = MockBackend::start(vec![
        Route::new(
            "POST",
            "/api/auth/register/",
            400,
            json!({ "email": ["Ya existe un usuario con este email"] }),
        ),
        Route::new("GET", "/api/mesas/", 500, json!("boom")),
    ])
    .await;
    let client = backend.client();

    let registration = reservas_cliente::models::Registration {
        username: "ana".to_string(),
        email: "ana@correo.cl".to_string(),
        password: "secreta123".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Rojas".to_string(),
        phone: "+56 9 1234 5678".to_string(),
        tax_id: "11.111.111-1".to_string(),
    };
    let error = client.register(&registration).await.unwrap_err();
    assert_eq!(error.user_message(), "Ya existe un usuario con este email");

    let error = client.list_tables(&TableQuery::default()).await.unwrap_err();
    match error {
        AppError::Request { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("HTTP 500"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    backend.stop().await;
}

#[actix_web::test]
async fn test_unauthorized_maps_to_dedicated_error() {
    let backend = MockBackend::start(vec![Route::new(
        "GET",
        "/api/reservas/mis-reservas/",
        401,
        json!({ "detail": "Token inválido" }),
    )])
    .await;

    let error = backend.authed_client().my_reservations().await.unwrap_err();
    assert!(matches!(error, AppError::Unauthorized(ref m) if m == "Token inválido"));

    let sent = backend.requests_to("GET", "/api/reservas/mis-reservas/");
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer token-de-prueba"));

    backend.stop().await;
}

#[actix_web::test]
async fn test_lists_accept_plain_and_paginated_bodies() {
    let backend = MockBackend::start(vec![
        Route::get(
            "/api/mesas/",
            json!([mesa(1, 4, 4, "disponible"), mesa(2, 7, 6, "limpieza")]),
        ),
        Route::get(
            "/api/reservas/",
            json!({ "count": 1, "next": null, "results": [reserva(3, "2026-10-24", "20:00:00", "pendiente")] }),
        ),
    ])
    .await;
    let client = backend.authed_client();

    let tables = client
        .list_tables(&TableQuery::availability(date(2026, 10, 24), NaiveTime::from_hms_opt(20, 0, 0).unwrap(), 4))
        .await
        .unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[1].status, TableStatus::Cleaning);

    let sent = backend.requests_to("GET", "/api/mesas/");
    assert!(sent[0].query.contains("fecha=2026-10-24"));
    assert!(sent[0].query.contains("hora=20%3A00"));
    assert!(sent[0].query.contains("personas=4"));

    let reservations = client
        .list_reservations(&ReservationQuery::for_date(date(2026, 10, 24)))
        .await
        .unwrap();
    assert_eq!(reservations.len(), 1);
    assert_eq!(reservations[0].table_label, "Mesa 4");
    assert_eq!(reservations[0].time, NaiveTime::from_hms_opt(20, 0, 0).unwrap());

    backend.stop().await;
}

#[actix_web::test]
async fn test_list_all_follows_pages() {
    let backend = MockBackend::start(vec![Route::get(
        "/api/reservas/",
        json!({
            "count": 3,
            "next": "http://backend/api/reservas/?page=2",
            "results": [reserva(1, "2026-10-02", "13:00", "activa"), reserva(2, "2026-10-02", "14:00", "pendiente")]
        }),
    )
    .then(
        200,
        json!({ "count": 3, "next": null, "results": [reserva(3, "2026-10-30", "21:00", "completada")] }),
    )])
    .await;

    let all = backend
        .authed_client()
        .list_reservations_all(&ReservationQuery::for_range(date(2026, 10, 1), date(2026, 10, 31)))
        .await
        .unwrap();
    assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);

    let sent = backend.requests_to("GET", "/api/reservas/");
    assert_eq!(sent.len(), 2);
    assert!(sent[0].query.contains("page=1"));
    assert!(sent[1].query.contains("page=2"));
    assert!(sent[1].query.contains("fecha_inicio=2026-10-01"));

    backend.stop().await;
}

#[actix_web::test]
async fn test_guest_reservation_never_sends_token() {
    let backend = MockBackend::start(vec![Route::post(
        "/api/reservas/publica/",
        reserva(9, "2026-10-24", "20:00", "pendiente"),
    )])
    .await;

    let data = GuestReservation {
        client_name: "Ana Rojas".to_string(),
        tax_id: "11.111.111-1".to_string(),
        phone: "+56 9 1234 5678".to_string(),
        email: "ana@correo.cl".to_string(),
        date: date(2026, 10, 24),
        time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        party_size: 4,
        notes: None,
    };
    let created = backend.authed_client().create_guest_reservation(&data).await.unwrap();
    assert_eq!(created.id, 9);

    let sent = backend.requests_to("POST", "/api/reservas/publica/");
    assert!(sent[0].authorization.is_none());
    assert_eq!(sent[0].body["hora"], "20:00");
    assert_eq!(sent[0].body["num_personas"], 4);
    assert!(sent[0].body.get("notas").is_none());

    backend.stop().await;
}

#[actix_web::test]
async fn test_status_update_rejects_mismatched_echo() {
    let backend = MockBackend::start(vec![Route::patch(
        "/api/reservas/5/estado/",
        reserva(5, "2026-10-24", "20:00", "pendiente"),
    )])
    .await;

    let error = backend
        .authed_client()
        .update_reservation_status(5, ReservationStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::InvalidResponse(_)));

    let sent = backend.requests_to("PATCH", "/api/reservas/5/estado/");
    assert_eq!(sent[0].body, json!({ "estado": "activa" }));

    backend.stop().await;
}
