// src/handlers/washers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, rbac::AdminUser},
    models::{
        auth::User,
        washer::{
            Attendance, AttendancePayload, CreateWasherPayload, SalaryInfo, SalaryPayload,
            UpdateWasherPayload, WasherStatusPayload, WasherSummary,
        },
    },
};

// GET /api/washers
#[utoipa::path(
    get,
    path = "/api/washers",
    tag = "Washers",
    responses(
        (status = 200, description = "Lavadores com presença de hoje", body = [WasherSummary])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_washers(State(app_state): State<AppState>) -> Result<Json<Vec<WasherSummary>>, AppError> {
    let washers = app_state.washer_service.list_washers().await?;
    Ok(Json(washers))
}

// POST /api/washers
#[utoipa::path(
    post,
    path = "/api/washers",
    tag = "Washers",
    request_body = CreateWasherPayload,
    responses(
        (status = 201, description = "Lavador cadastrado", body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Somente administradores"),
        (status = 409, description = "E-mail ou telefone já cadastrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_washer(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreateWasherPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let washer = app_state.washer_service.create_washer(&payload).await?;
    Ok((StatusCode::CREATED, Json(washer)))
}

// GET /api/washers/{userId}
#[utoipa::path(
    get,
    path = "/api/washers/{userId}",
    tag = "Washers",
    params(("userId" = i64, Path, description = "ID público do lavador")),
    responses(
        (status = 200, description = "Lavador", body = User),
        (status = 404, description = "Lavador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_washer(
    State(app_state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let washer = app_state.washer_service.get_washer(user_id).await?;
    Ok(Json(washer))
}

// PUT /api/washers/{userId}
#[utoipa::path(
    put,
    path = "/api/washers/{userId}",
    tag = "Washers",
    params(("userId" = i64, Path, description = "ID público do lavador")),
    request_body = UpdateWasherPayload,
    responses(
        (status = 200, description = "Lavador atualizado", body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Lavador não encontrado"),
        (status = 409, description = "E-mail ou telefone já cadastrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_washer(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateWasherPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let washer = app_state.washer_service.update_washer(user_id, payload).await?;
    Ok(Json(washer))
}

// DELETE /api/washers/{userId}
#[utoipa::path(
    delete,
    path = "/api/washers/{userId}",
    tag = "Washers",
    params(("userId" = i64, Path, description = "ID público do lavador")),
    responses(
        (status = 204, description = "Lavador removido"),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Lavador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_washer(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.washer_service.delete_washer(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/washers/{userId}/status
#[utoipa::path(
    post,
    path = "/api/washers/{userId}/status",
    tag = "Washers",
    params(("userId" = i64, Path, description = "ID público do lavador")),
    request_body = WasherStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = User),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Lavador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_status(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<WasherStatusPayload>,
) -> Result<Json<User>, AppError> {
    let washer = app_state.washer_service.set_status(user_id, payload.status).await?;
    Ok(Json(washer))
}

// GET /api/washers/{userId}/salary
#[utoipa::path(
    get,
    path = "/api/washers/{userId}/salary",
    tag = "Washers",
    params(("userId" = i64, Path, description = "ID público do lavador")),
    responses(
        (status = 200, description = "Salário base vigente", body = SalaryInfo),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Lavador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_salary(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<SalaryInfo>, AppError> {
    let salary = app_state.washer_service.salary(user_id).await?;
    Ok(Json(salary))
}

// POST /api/washers/{userId}/salary
#[utoipa::path(
    post,
    path = "/api/washers/{userId}/salary",
    tag = "Washers",
    params(("userId" = i64, Path, description = "ID público do lavador")),
    request_body = SalaryPayload,
    responses(
        (status = 200, description = "Salário atualizado", body = SalaryInfo),
        (status = 400, description = "Valor negativo ou data inválida"),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Lavador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_salary(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<SalaryPayload>,
) -> Result<Json<SalaryInfo>, AppError> {
    let salary = app_state.washer_service.set_salary(user_id, &payload).await?;
    Ok(Json(salary))
}

// POST /api/washers/{userId}/attendance
#[utoipa::path(
    post,
    path = "/api/washers/{userId}/attendance",
    tag = "Washers",
    params(("userId" = i64, Path, description = "ID público do lavador")),
    request_body = AttendancePayload,
    responses(
        (status = 200, description = "Ponto registrado", body = Attendance),
        (status = 400, description = "Entrada/saída já marcada ou saída sem entrada"),
        (status = 403, description = "Lavador marcando ponto de outro"),
        (status = 404, description = "Lavador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_attendance(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<AttendancePayload>,
) -> Result<Json<Attendance>, AppError> {
    let record = app_state
        .washer_service
        .mark_attendance(&claims, user_id, payload.kind)
        .await?;
    Ok(Json(record))
}

// GET /api/washers/{userId}/attendance
#[utoipa::path(
    get,
    path = "/api/washers/{userId}/attendance",
    tag = "Washers",
    params(("userId" = i64, Path, description = "ID público do lavador")),
    responses(
        (status = 200, description = "Registros de ponto, mais recentes primeiro", body = [Attendance]),
        (status = 404, description = "Lavador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_attendance(
    State(app_state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Attendance>>, AppError> {
    let records = app_state.washer_service.attendance(user_id).await?;
    Ok(Json(records))
}
