mod common;

use axum::http::StatusCode;
use common::{
    TestUser, assign, call, create_brigade, create_guard, create_park, create_user, date, future,
    setup_app,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

async fn balances(pool: &PgPool, user_id: Uuid) -> (i32, i32, i32) {
    sqlx::query_as::<_, (i32, i32, i32)>(
        "SELECT vacation_days, personal_days, compensation_hours FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn offer(pool: &PgPool, user_id: Uuid, hours: i32, on: &str) {
    sqlx::query("UPDATE users SET offered_hours = $1, offered_at = $2 WHERE id = $3")
        .bind(hours)
        .bind(date(on))
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

// Leave requests

#[sqlx::test(migrations = "./migrations")]
async fn test_vacation_confirm_and_cancel_adjust_balance(pool: PgPool) {
    let mando = create_user(&pool, "00000001R", "mando").await;
    let ana = create_user(&pool, "00000002W", "bombero").await;
    let app = setup_app(pool.clone());

    let (status, body) = call(
        &app,
        "POST",
        "/api/requests",
        &ana.token,
        Some(json!({ "kind": "vacaciones", "start_date": "2025-08-01", "end_date": "2025-08-05" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pendiente");
    let id = id_of(&body);

    // Pending requests do not touch the balance.
    assert_eq!(balances(&pool, ana.id).await.0, 22);

    let (status, _) = call(&app, "POST", &format!("/api/requests/{}/confirm", id), &ana.token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, "POST", &format!("/api/requests/{}/confirm", id), &mando.token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmada");
    assert_eq!(body["reviewed_by"], mando.id.to_string());
    assert_eq!(balances(&pool, ana.id).await.0, 17);

    let (status, body) = call(&app, "POST", &format!("/api/requests/{}/cancel", id), &ana.token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelada");
    assert_eq!(balances(&pool, ana.id).await.0, 22);

    let (status, _) = call(&app, "POST", &format!("/api/requests/{}/cancel", id), &ana.token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_request_rules(pool: PgPool) {
    let ana = create_user(&pool, "00000002W", "bombero").await;
    let app = setup_app(pool);

    let (status, _) = call(
        &app,
        "POST",
        "/api/requests",
        &ana.token,
        Some(json!({ "kind": "vacaciones", "start_date": "2025-08-05", "end_date": "2025-08-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/requests",
        &ana.token,
        Some(json!({ "kind": "vacaciones", "start_date": "2025-01-01", "end_date": "2025-02-28" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(
        &app,
        "POST",
        "/api/requests",
        &ana.token,
        Some(json!({ "kind": "salida_personal", "start_date": "2025-08-01", "end_date": "2025-08-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        "POST",
        "/api/requests",
        &ana.token,
        Some(json!({
            "kind": "salida_personal",
            "start_date": "2025-08-01",
            "end_date": "2025-08-01",
            "hours": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["hours"], 3);

    // Overlaps the pending hourly request.
    let (status, _) = call(
        &app,
        "POST",
        "/api/requests",
        &ana.token,
        Some(json!({ "kind": "licencia", "start_date": "2025-07-30", "end_date": "2025-08-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_request_visibility(pool: PgPool) {
    let mando = create_user(&pool, "00000001R", "mando").await;
    let ana = create_user(&pool, "00000002W", "bombero").await;
    let luis = create_user(&pool, "00000003A", "bombero").await;
    let app = setup_app(pool);

    let leave = json!({ "kind": "licencia", "start_date": "2025-08-01", "end_date": "2025-08-01" });
    let (_, body) = call(&app, "POST", "/api/requests", &ana.token, Some(leave.clone())).await;
    let ana_request = id_of(&body);
    call(&app, "POST", "/api/requests", &luis.token, Some(leave)).await;

    let (_, body) = call(&app, "GET", "/api/requests", &ana.token, None).await;
    assert_eq!(body["meta"]["total"], 1);

    let (_, body) = call(&app, "GET", "/api/requests", &mando.token, None).await;
    assert_eq!(body["meta"]["total"], 2);

    let (status, _) = call(&app, "GET", &format!("/api/requests/{}", ana_request), &luis.token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "POST", &format!("/api/requests/{}/cancel", ana_request), &luis.token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, "POST", &format!("/api/requests/{}/deny", ana_request), &mando.token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "denegada");
}

// Shift changes

struct SwapFixture {
    mando: TestUser,
    ana: TestUser,
    luis: TestUser,
    brigade_a: Uuid,
    brigade_b: Uuid,
}

async fn swap_fixture(pool: &PgPool) -> SwapFixture {
    let mando = create_user(pool, "00000001R", "mando").await;
    let ana = create_user(pool, "00000002W", "bombero").await;
    let luis = create_user(pool, "00000003A", "bombero").await;
    let park = create_park(pool, "Parque Norte").await;
    let brigade_a = create_brigade(pool, park, "A").await;
    let brigade_b = create_brigade(pool, park, "B").await;
    assign(pool, ana.id, brigade_a, date("2025-01-01")).await;
    assign(pool, luis.id, brigade_b, date("2025-01-01")).await;
    SwapFixture {
        mando,
        ana,
        luis,
        brigade_a,
        brigade_b,
    }
}

async fn brigade_of(app: &axum::Router, token: &str, user_id: Uuid, on: chrono::NaiveDate) -> Value {
    let (_, body) = call(
        app,
        "GET",
        &format!("/api/users/{}/brigade?date={}", user_id, on),
        token,
        None,
    )
    .await;
    body["brigade_id"].clone()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_simple_swap_is_applied_on_approval(pool: PgPool) {
    let f = swap_fixture(&pool).await;
    let app = setup_app(pool);
    let day = future(10);

    let (status, body) = call(
        &app,
        "POST",
        "/api/shift-changes",
        &f.ana.token,
        Some(json!({ "counterpart_id": f.luis.id, "date": day })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "en_tramite");
    assert_eq!(body["requester_brigade_id"], f.brigade_a.to_string());
    assert_eq!(body["counterpart_brigade_id"], f.brigade_b.to_string());
    let id = id_of(&body);

    // Approval needs both employees to agree first.
    let (status, _) = call(&app, "POST", &format!("/api/shift-changes/{}/approve", id), &f.mando.token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, "POST", &format!("/api/shift-changes/{}/accept", id), &f.ana.token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, "POST", &format!("/api/shift-changes/{}/accept", id), &f.luis.token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "aceptado_por_empleados");

    let (status, body) = call(&app, "POST", &format!("/api/shift-changes/{}/approve", id), &f.mando.token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "aceptado");
    assert_eq!(body["decided_by"], f.mando.id.to_string());

    let a = json!(f.brigade_a.to_string());
    let b = json!(f.brigade_b.to_string());
    assert_eq!(brigade_of(&app, &f.mando.token, f.ana.id, day).await, b);
    assert_eq!(brigade_of(&app, &f.mando.token, f.luis.id, day).await, a);
    assert_eq!(brigade_of(&app, &f.mando.token, f.ana.id, future(11)).await, a);
    assert_eq!(brigade_of(&app, &f.mando.token, f.luis.id, future(11)).await, b);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mirror_swap_moves_each_on_their_day(pool: PgPool) {
    let f = swap_fixture(&pool).await;
    let app = setup_app(pool);

    let (_, body) = call(
        &app,
        "POST",
        "/api/shift-changes",
        &f.ana.token,
        Some(json!({ "counterpart_id": f.luis.id, "date": future(10), "mirror_date": future(14) })),
    )
    .await;
    let id = id_of(&body);
    call(&app, "POST", &format!("/api/shift-changes/{}/accept", id), &f.luis.token, None).await;
    let (status, _) = call(&app, "POST", &format!("/api/shift-changes/{}/approve", id), &f.mando.token, None).await;
    assert_eq!(status, StatusCode::OK);

    let a = json!(f.brigade_a.to_string());
    let b = json!(f.brigade_b.to_string());
    // Luis covers brigade A on the first day, Ana covers B on the mirror day.
    assert_eq!(brigade_of(&app, &f.mando.token, f.luis.id, future(10)).await, a);
    assert_eq!(brigade_of(&app, &f.mando.token, f.ana.id, future(10)).await, a);
    assert_eq!(brigade_of(&app, &f.mando.token, f.ana.id, future(14)).await, b);
    assert_eq!(brigade_of(&app, &f.mando.token, f.luis.id, future(14)).await, b);
    assert_eq!(brigade_of(&app, &f.mando.token, f.ana.id, future(15)).await, a);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_shift_change_validations_and_visibility(pool: PgPool) {
    let f = swap_fixture(&pool).await;
    let eva = create_user(&pool, "00000004G", "bombero").await;
    let app = setup_app(pool);

    let (status, _) = call(
        &app,
        "POST",
        "/api/shift-changes",
        &f.ana.token,
        Some(json!({ "counterpart_id": f.ana.id, "date": future(10) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/shift-changes",
        &f.ana.token,
        Some(json!({ "counterpart_id": f.luis.id, "date": "2020-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/shift-changes",
        &f.ana.token,
        Some(json!({ "counterpart_id": f.luis.id, "date": future(10), "mirror_date": "2020-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Eva belongs to no brigade.
    let (status, _) = call(
        &app,
        "POST",
        "/api/shift-changes",
        &f.ana.token,
        Some(json!({ "counterpart_id": eva.id, "date": future(10) })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = call(
        &app,
        "POST",
        "/api/shift-changes",
        &f.ana.token,
        Some(json!({ "counterpart_id": f.luis.id, "date": future(10) })),
    )
    .await;
    let id = id_of(&body);

    let (status, _) = call(&app, "GET", &format!("/api/shift-changes/{}", id), &eva.token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = call(&app, "GET", "/api/shift-changes", &eva.token, None).await;
    assert_eq!(body["meta"]["total"], 0);

    let (_, body) = call(&app, "GET", "/api/shift-changes", &f.luis.token, None).await;
    assert_eq!(body["meta"]["total"], 1);

    let (status, body) = call(&app, "POST", &format!("/api/shift-changes/{}/reject", id), &f.luis.token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rechazado");

    let (status, _) = call(&app, "POST", &format!("/api/shift-changes/{}/accept", id), &f.luis.token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// Requirements

#[sqlx::test(migrations = "./migrations")]
async fn test_requirement_recalls_best_candidate(pool: PgPool) {
    let mando = create_user(&pool, "00000001R", "mando").await;
    let ana = create_user(&pool, "00000002W", "bombero").await;
    let luis = create_user(&pool, "00000003A", "bombero").await;
    let eva = create_user(&pool, "00000004G", "bombero").await;
    let park = create_park(&pool, "Parque Norte").await;
    let a = create_brigade(&pool, park, "A").await;
    let b = create_brigade(&pool, park, "B").await;
    assign(&pool, ana.id, b, date("2025-01-01")).await;
    assign(&pool, luis.id, b, date("2025-01-01")).await;
    assign(&pool, eva.id, a, date("2025-01-01")).await;
    offer(&pool, ana.id, 12, "2025-05-02").await;
    offer(&pool, luis.id, 24, "2025-05-03").await;
    offer(&pool, eva.id, 48, "2025-05-01").await;
    create_guard(&pool, a, date("2025-06-10")).await;
    let app = setup_app(pool.clone());

    let (status, body) = call(
        &app,
        "GET",
        "/api/requirements/available?date=2025-06-10",
        &mando.token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    // Eva is on duty with brigade A that day.
    assert_eq!(ids, vec![luis.id.to_string(), ana.id.to_string()]);

    let (status, body) = call(
        &app,
        "POST",
        "/api/requirements",
        &mando.token,
        Some(json!({ "user_id": luis.id, "brigade_id": a, "date": "2025-06-10", "hours": 24 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = id_of(&body);

    let offered = sqlx::query_scalar::<_, i32>("SELECT offered_hours FROM users WHERE id = $1")
        .bind(luis.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(offered, 0);

    let a_json = json!(a.to_string());
    let b_json = json!(b.to_string());
    assert_eq!(brigade_of(&app, &mando.token, luis.id, date("2025-06-10")).await, a_json);
    assert_eq!(brigade_of(&app, &mando.token, luis.id, date("2025-06-11")).await, b_json);

    // Already required that day.
    let (status, _) = call(
        &app,
        "POST",
        "/api/requirements",
        &mando.token,
        Some(json!({ "user_id": luis.id, "brigade_id": a, "date": "2025-06-10", "hours": 12 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = call(&app, "GET", "/api/requirements?from=2025-06-01&to=2025-06-30", &mando.token, None).await;
    assert_eq!(body["meta"]["total"], 1);

    let (status, _) = call(&app, "DELETE", &format!("/api/requirements/{}", id), &mando.token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_requirement_needs_a_guard_and_permission(pool: PgPool) {
    let mando = create_user(&pool, "00000001R", "mando").await;
    let ana = create_user(&pool, "00000002W", "bombero").await;
    let park = create_park(&pool, "Parque Norte").await;
    let a = create_brigade(&pool, park, "A").await;
    offer(&pool, ana.id, 12, "2025-05-02").await;
    let app = setup_app(pool);

    let dto = json!({ "user_id": ana.id, "brigade_id": a, "date": "2025-06-10", "hours": 12 });

    let (status, _) = call(&app, "POST", "/api/requirements", &ana.token, Some(dto.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "POST", "/api/requirements", &mando.token, Some(dto)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_available_candidates_filtered_by_park(pool: PgPool) {
    let mando = create_user(&pool, "00000001R", "mando").await;
    let ana = create_user(&pool, "00000002W", "bombero").await;
    let luis = create_user(&pool, "00000003A", "bombero").await;
    let norte = create_park(&pool, "Parque Norte").await;
    let sur = create_park(&pool, "Parque Sur").await;
    let a = create_brigade(&pool, norte, "A").await;
    let b = create_brigade(&pool, sur, "B").await;
    assign(&pool, ana.id, a, date("2025-01-01")).await;
    assign(&pool, luis.id, b, date("2025-01-01")).await;
    offer(&pool, ana.id, 12, "2025-05-02").await;
    offer(&pool, luis.id, 24, "2025-05-03").await;
    let app = setup_app(pool);

    let ids = |body: &Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, body) = call(&app, "GET", "/api/requirements/available?date=2025-06-10", &mando.token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![luis.id.to_string(), ana.id.to_string()]);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/requirements/available?date=2025-06-10&park_id={}", norte),
        &mando.token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![ana.id.to_string()]);
}
