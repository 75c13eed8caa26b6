// src/handlers/schedule.rs

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::StaffUser,
    models::schedule::{AssignWasherPayload, AssignmentResponse, ScheduleQuery, ScheduleResponse},
};

// GET /api/schedule/washes
#[utoipa::path(
    get,
    path = "/api/schedule/washes",
    tag = "Schedule",
    params(ScheduleQuery),
    responses(
        (status = 200, description = "Agenda consolidada da janela", body = ScheduleResponse),
        (status = 400, description = "Datas ausentes, inválidas ou invertidas"),
        (status = 404, description = "Lavador do filtro não existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_scheduled_washes(
    State(app_state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let response = app_state.schedule_service.list_washes(&query).await?;
    Ok(Json(response))
}

// POST /api/schedule/assign
#[utoipa::path(
    post,
    path = "/api/schedule/assign",
    tag = "Schedule",
    request_body = AssignWasherPayload,
    responses(
        (status = 200, description = "Lavador atribuído (veja autoAssigned / washerResolved)", body = AssignmentResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_washer(
    State(app_state): State<AppState>,
    _staff: StaffUser,
    Json(payload): Json<AssignWasherPayload>,
) -> Result<Json<AssignmentResponse>, AppError> {
    payload.validate()?;

    let outcome = app_state.schedule_service.assign(&payload).await?;
    Ok(Json(outcome))
}
