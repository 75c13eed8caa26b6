// src/services/schedule_service.rs

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadRepository, UserRepository},
    models::{
        lead::Lead,
        schedule::{AssignWasherPayload, AssignmentResponse, ScheduleQuery, ScheduleResponse, ScheduledWashView},
        washer::WasherRef,
    },
    scheduling::{
        auto_assign,
        pipeline::build_calendar,
        BusinessCalendar, DateWindow,
    },
    services::lead_service::LeadService,
};

#[derive(Clone)]
pub struct ScheduleService {
    lead_repo: LeadRepository,
    user_repo: UserRepository,
    lead_service: LeadService,
    calendar: BusinessCalendar,
    pool: PgPool,
}

impl ScheduleService {
    pub fn new(
        lead_repo: LeadRepository,
        user_repo: UserRepository,
        lead_service: LeadService,
        calendar: BusinessCalendar,
        pool: PgPool,
    ) -> Self {
        Self { lead_repo, user_repo, lead_service, calendar, pool }
    }

    /// Agenda consolidada da janela pedida.
    pub async fn list_washes(&self, query: &ScheduleQuery) -> Result<ScheduleResponse, AppError> {
        let window = DateWindow::parse(
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            &self.calendar,
        )?;

        // Filtro por lavador desconhecido é erro do cliente, não agenda vazia
        let washer_filter = match query.washer_id {
            Some(user_id) => Some(
                self.user_repo
                    .find_washer(&self.pool, user_id, false)
                    .await?
                    .ok_or(AppError::WasherNotFound)?
                    .id,
            ),
            None => None,
        };

        // A consulta SQL tem folga de um dia; aqui o corte fica exato
        let leads: Vec<Lead> = self
            .lead_repo
            .find_in_window(&window)
            .await?
            .into_iter()
            .filter(|lead| window.record_may_match(lead))
            .collect();
        let resolved = build_calendar(&leads, &window, washer_filter, &self.calendar);

        let mut washer_ids: Vec<Uuid> = resolved.iter().filter_map(|item| item.washer).collect();
        washer_ids.sort_unstable();
        washer_ids.dedup();
        let washers: HashMap<Uuid, WasherRef> = self
            .user_repo
            .find_by_ids(&washer_ids)
            .await?
            .iter()
            .map(|user| (user.id, WasherRef::from(user)))
            .collect();

        let by_id: HashMap<Uuid, &Lead> = leads.iter().map(|lead| (lead.id, lead)).collect();
        let data: Vec<ScheduledWashView> = resolved
            .iter()
            .filter_map(|item| {
                let lead = by_id.get(&item.occurrence.lead)?;
                let washer = item.washer.and_then(|id| washers.get(&id).cloned());
                Some(ScheduledWashView::new(lead, item, washer))
            })
            .collect();

        tracing::debug!(
            start = %window.start,
            end = %window.end,
            leads = leads.len(),
            washes = data.len(),
            "agenda consolidada"
        );

        Ok(ScheduleResponse {
            count: data.len(),
            data,
            date_range: window,
        })
    }

    /// Atribui um lavador a um cliente numa data. Lavador inexistente não é
    /// erro: a entrada é criada/atualizada sem lavador e `washerResolved`
    /// volta `false`.
    pub async fn assign(&self, payload: &AssignWasherPayload) -> Result<AssignmentResponse, AppError> {
        let now = Utc::now();
        let target_date = self.calendar.parse_instant(&payload.target_date)?;
        let washer = self.lead_service.resolve_washer(Some(payload.washer_id)).await?;
        let calendar = self.calendar;
        let wash_type = payload.wash_type.as_deref();

        let (lead, outcome) = self
            .lead_service
            .mutate(payload.customer_id, |lead| {
                auto_assign::assign_to_date(lead, washer, target_date, wash_type, &calendar, now)
            })
            .await?;

        tracing::info!(
            lead_id = lead.lead_id,
            washer_id = payload.washer_id,
            date = %outcome.assignment_date,
            auto_assigned = outcome.auto_assigned,
            washer_resolved = outcome.washer_resolved,
            "lavador atribuído"
        );
        self.lead_service.respond(&lead, outcome).await
    }
}
