// src/handlers/expenses.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{AdminUser, RequireRole},
    models::expense::{Expense, ExpensePayload, ExpenseQuery, PeriodQuery, SalaryQuery, SalaryReport},
};

// =============================================================================
//  ÁREA 1: DESPESAS
// =============================================================================

// GET /api/expenses
#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "Expenses",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Despesas, mais recentes primeiro", body = [Expense]),
        (status = 400, description = "Datas inválidas"),
        (status = 403, description = "Somente administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_expenses(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = app_state.expense_service.list(&query).await?;
    Ok(Json(expenses))
}

// POST /api/expenses
#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "Expenses",
    request_body = ExpensePayload,
    responses(
        (status = 201, description = "Despesa lançada", body = Expense),
        (status = 400, description = "Dados inválidos ou valor negativo"),
        (status = 403, description = "Somente administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_expense(
    State(app_state): State<AppState>,
    RequireRole { 0: claims, .. }: AdminUser,
    Json(payload): Json<ExpensePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let expense = app_state.expense_service.create(&claims, &payload).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

// PUT /api/expenses/{id}
#[utoipa::path(
    put,
    path = "/api/expenses/{id}",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "ID da despesa")),
    request_body = ExpensePayload,
    responses(
        (status = 200, description = "Despesa atualizada", body = Expense),
        (status = 400, description = "Dados inválidos ou valor negativo"),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Despesa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_expense(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpensePayload>,
) -> Result<Json<Expense>, AppError> {
    payload.validate()?;

    let expense = app_state.expense_service.update(id, &payload).await?;
    Ok(Json(expense))
}

// DELETE /api/expenses/{id}
#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "ID da despesa")),
    responses(
        (status = 204, description = "Despesa removida"),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Despesa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_expense(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.expense_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: FOLHA
// =============================================================================

// GET /api/expenses/washer/{userId}
#[utoipa::path(
    get,
    path = "/api/expenses/washer/{userId}",
    tag = "Expenses",
    params(
        ("userId" = i64, Path, description = "ID público do lavador"),
        PeriodQuery
    ),
    responses(
        (status = 200, description = "Despesas do lavador no mês", body = [Expense]),
        (status = 400, description = "Mês ou ano inválido"),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Lavador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn washer_expenses(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = app_state.expense_service.washer_expenses(user_id, &query).await?;
    Ok(Json(expenses))
}

// GET /api/expenses/salary-calculation
#[utoipa::path(
    get,
    path = "/api/expenses/salary-calculation",
    tag = "Expenses",
    params(SalaryQuery),
    responses(
        (status = 200, description = "Folha do mês por lavador", body = SalaryReport),
        (status = 400, description = "Mês ou ano inválido"),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Lavador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn salary_calculation(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<SalaryQuery>,
) -> Result<Json<SalaryReport>, AppError> {
    let report = app_state.expense_service.salary_report(&query).await?;
    Ok(Json(report))
}
