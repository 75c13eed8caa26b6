// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::LeadFilter,
    middleware::rbac::{AdminUser, StaffUser},
    models::lead::{
        CompleteWashPayload, CreateLeadPayload, CreateSubscriptionPayload, IndexedWashHistoryEntry,
        Lead, LeadStatus, LeadType, LogWashPayload, MonthlySubscription, ReschedulePayload,
        UpdateLeadPayload,
    },
    models::schedule::AssignmentResponse,
    scheduling::subscription::SubscriptionOutcome,
    services::lead_service::CreatedLead,
};

// =============================================================================
//  ÁREA 1: CADASTRO
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeadListQuery {
    pub status: Option<LeadStatus>,
    pub lead_type: Option<LeadType>,
    /// Nome, telefone ou bairro (parcial, sem diferenciar maiúsculas)
    pub search: Option<String>,
}

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Lead),
        (status = 200, description = "Telefone já cadastrado como avulso; devolve o existente", body = Lead),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Telefone já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    _staff: StaffUser,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = match app_state.lead_service.create_lead(payload).await? {
        CreatedLead::New(lead) => (StatusCode::CREATED, Json(lead)),
        CreatedLead::Existing(lead) => (StatusCode::OK, Json(lead)),
    };
    Ok(response)
}

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(LeadListQuery),
    responses(
        (status = 200, description = "Clientes, mais recentes primeiro", body = [Lead])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<Vec<Lead>>, AppError> {
    let filter = LeadFilter {
        status: query.status,
        lead_type: query.lead_type,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let leads = app_state.lead_service.list_leads(&filter).await?;
    Ok(Json(leads))
}

// GET /api/leads/{leadId}
#[utoipa::path(
    get,
    path = "/api/leads/{leadId}",
    tag = "Leads",
    params(("leadId" = i64, Path, description = "ID público do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Lead),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    Path(lead_id): Path<i64>,
) -> Result<Json<Lead>, AppError> {
    let lead = app_state.lead_service.get_lead(lead_id).await?;
    Ok(Json(lead))
}

// PUT /api/leads/{leadId}
#[utoipa::path(
    put,
    path = "/api/leads/{leadId}",
    tag = "Leads",
    params(("leadId" = i64, Path, description = "ID público do cliente")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Perfil atualizado", body = Lead),
        (status = 404, description = "Cliente não encontrado"),
        (status = 409, description = "Telefone já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    _staff: StaffUser,
    Path(lead_id): Path<i64>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<Json<Lead>, AppError> {
    payload.validate()?;

    let lead = app_state.lead_service.update_lead(lead_id, payload).await?;
    Ok(Json(lead))
}

// DELETE /api/leads/{leadId}
#[utoipa::path(
    delete,
    path = "/api/leads/{leadId}",
    tag = "Leads",
    params(("leadId" = i64, Path, description = "ID público do cliente")),
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 403, description = "Somente administradores"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(lead_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.lead_service.delete_lead(lead_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: HISTÓRICO DE LAVAGENS
// =============================================================================

// GET /api/leads/{leadId}/wash-history
#[utoipa::path(
    get,
    path = "/api/leads/{leadId}/wash-history",
    tag = "Leads",
    params(("leadId" = i64, Path, description = "ID público do cliente")),
    responses(
        (status = 200, description = "Histórico, mais recentes primeiro", body = [IndexedWashHistoryEntry]),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_wash_history(
    State(app_state): State<AppState>,
    Path(lead_id): Path<i64>,
) -> Result<Json<Vec<IndexedWashHistoryEntry>>, AppError> {
    let history = app_state.lead_service.wash_history(lead_id).await?;
    Ok(Json(history))
}

// POST /api/leads/{leadId}/wash-history
#[utoipa::path(
    post,
    path = "/api/leads/{leadId}/wash-history",
    tag = "Leads",
    params(("leadId" = i64, Path, description = "ID público do cliente")),
    request_body = LogWashPayload,
    responses(
        (status = 201, description = "Lavagem registrada", body = AssignmentResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn log_wash(
    State(app_state): State<AppState>,
    Path(lead_id): Path<i64>,
    Json(payload): Json<LogWashPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let outcome = app_state.lead_service.log_wash(lead_id, payload).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

// PUT /api/leads/{leadId}/wash-history/{index}/start
#[utoipa::path(
    put,
    path = "/api/leads/{leadId}/wash-history/{index}/start",
    tag = "Leads",
    params(
        ("leadId" = i64, Path, description = "ID público do cliente"),
        ("index" = usize, Path, description = "Posição no histórico")
    ),
    responses(
        (status = 200, description = "Lavagem em andamento", body = Lead),
        (status = 400, description = "Transição inválida"),
        (status = 404, description = "Cliente ou entrada não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_wash(
    State(app_state): State<AppState>,
    Path((lead_id, index)): Path<(i64, usize)>,
) -> Result<Json<Lead>, AppError> {
    let lead = app_state.lead_service.start_wash(lead_id, index).await?;
    Ok(Json(lead))
}

// =============================================================================
//  ÁREA 3: ASSINATURA MENSAL
// =============================================================================

// POST /api/leads/{leadId}/monthly-subscription
#[utoipa::path(
    post,
    path = "/api/leads/{leadId}/monthly-subscription",
    tag = "Leads",
    params(("leadId" = i64, Path, description = "ID público do cliente")),
    request_body = CreateSubscriptionPayload,
    responses(
        (status = 201, description = "Assinatura criada", body = SubscriptionOutcome),
        (status = 400, description = "Plano inválido ou assinatura já ativa"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_subscription(
    State(app_state): State<AppState>,
    _staff: StaffUser,
    Path(lead_id): Path<i64>,
    Json(payload): Json<CreateSubscriptionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let outcome = app_state
        .lead_service
        .create_subscription(lead_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

// GET /api/leads/{leadId}/monthly-subscription
#[utoipa::path(
    get,
    path = "/api/leads/{leadId}/monthly-subscription",
    tag = "Leads",
    params(("leadId" = i64, Path, description = "ID público do cliente")),
    responses(
        (status = 200, description = "Assinatura mensal", body = MonthlySubscription),
        (status = 404, description = "Cliente ou assinatura não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_subscription(
    State(app_state): State<AppState>,
    Path(lead_id): Path<i64>,
) -> Result<Json<MonthlySubscription>, AppError> {
    let subscription = app_state.lead_service.get_subscription(lead_id).await?;
    Ok(Json(subscription))
}

// =============================================================================
//  ÁREA 4: CONCLUSÃO E REAGENDAMENTO
// =============================================================================

// PUT /api/leads/{leadId}/complete
#[utoipa::path(
    put,
    path = "/api/leads/{leadId}/complete",
    tag = "Leads",
    params(("leadId" = i64, Path, description = "ID público do cliente")),
    request_body = CompleteWashPayload,
    responses(
        (status = 200, description = "Lavagem concluída", body = Lead),
        (status = 400, description = "Transição inválida ou horários invertidos"),
        (status = 404, description = "Cliente ou ocorrência não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_wash(
    State(app_state): State<AppState>,
    Path(lead_id): Path<i64>,
    Json(payload): Json<CompleteWashPayload>,
) -> Result<Json<Lead>, AppError> {
    payload.validate()?;

    let lead = app_state.lead_service.complete_wash(lead_id, payload).await?;
    Ok(Json(lead))
}

// PUT /api/leads/{leadId}/reschedule
#[utoipa::path(
    put,
    path = "/api/leads/{leadId}/reschedule",
    tag = "Leads",
    params(("leadId" = i64, Path, description = "ID público do cliente")),
    request_body = ReschedulePayload,
    responses(
        (status = 200, description = "Ocorrência reagendada", body = AssignmentResponse),
        (status = 400, description = "Ocorrência encerrada ou data inválida"),
        (status = 404, description = "Cliente ou ocorrência não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn reschedule(
    State(app_state): State<AppState>,
    _staff: StaffUser,
    Path(lead_id): Path<i64>,
    Json(payload): Json<ReschedulePayload>,
) -> Result<Json<AssignmentResponse>, AppError> {
    payload.validate()?;

    let outcome = app_state.lead_service.reschedule(lead_id, payload).await?;
    Ok(Json(outcome))
}
