// src/services/lead_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{counter_repo::LEAD_COUNTER, lead_repo::ProfileChanges, CounterRepository, LeadFilter, LeadRepository, UserRepository},
    models::{
        lead::{
            history_newest_first, CompleteWashPayload, CreateLeadPayload, CreateSubscriptionPayload,
            IndexedWashHistoryEntry, Lead, LeadStatus, LeadType, LogWashPayload, MonthlySubscription,
            OneTimeWash, OneTimeWashStatus, ReschedulePayload, UpdateLeadPayload, WashHistoryEntry,
            WashStatus,
        },
        schedule::{AssignmentResponse, ScheduledWashView},
        washer::WasherRef,
    },
    scheduling::{
        auto_assign::{self, default_wash_amount, AssignmentOutcome},
        completion::{self, CompletionDetails},
        pipeline,
        subscription::{self, SubscriptionOutcome},
        BusinessCalendar, OccurrenceRef, OccurrenceSource, ScheduleError,
    },
};

/// Resultado do POST /api/leads: telefone repetido de cliente avulso
/// devolve o registro existente.
pub enum CreatedLead {
    New(Lead),
    Existing(Lead),
}

#[derive(Clone)]
pub struct LeadService {
    lead_repo: LeadRepository,
    user_repo: UserRepository,
    counter_repo: CounterRepository,
    calendar: BusinessCalendar,
    pool: PgPool,
}

impl LeadService {
    pub fn new(
        lead_repo: LeadRepository,
        user_repo: UserRepository,
        counter_repo: CounterRepository,
        calendar: BusinessCalendar,
        pool: PgPool,
    ) -> Self {
        Self { lead_repo, user_repo, counter_repo, calendar, pool }
    }

    // =========================================================================
    //  APOIO
    // =========================================================================

    pub async fn get_lead(&self, lead_id: i64) -> Result<Lead, AppError> {
        self.lead_repo
            .find_by_lead_id(lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)
    }

    /// `userId` público -> id interno. Lavador inexistente vira `None`
    /// (resultado parcial, não erro).
    pub async fn resolve_washer(&self, washer_id: Option<i64>) -> Result<Option<Uuid>, AppError> {
        let Some(washer_id) = washer_id else {
            return Ok(None);
        };
        let washer = self.user_repo.find_washer(&self.pool, washer_id, false).await?;
        if washer.is_none() {
            tracing::warn!(washer_id, "lavador não encontrado, entrada gravada sem lavador");
        }
        Ok(washer.map(|w| w.id))
    }

    fn parse_optional(&self, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ScheduleError> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| self.calendar.parse_instant(s))
            .transpose()
    }

    /// Entrada gravada como aparece na agenda, com o lavador efetivo.
    pub async fn occurrence_view(&self, lead: &Lead, target: OccurrenceRef) -> Result<Option<ScheduledWashView>, AppError> {
        let Some(item) = pipeline::resolve_one(lead, target, &self.calendar) else {
            return Ok(None);
        };
        let washer = match item.washer {
            Some(id) => self.user_repo.find_by_id(id).await?.as_ref().map(WasherRef::from),
            None => None,
        };
        Ok(Some(ScheduledWashView::new(lead, &item, washer)))
    }

    pub async fn respond(&self, lead: &Lead, outcome: AssignmentOutcome) -> Result<AssignmentResponse, AppError> {
        let wash = self.occurrence_view(lead, outcome.occurrence).await?;
        Ok(AssignmentResponse { outcome, wash })
    }

    /// Lê, altera em memória e grava com compare-and-swap. Conflito de
    /// versão sobe como `WriteConflict`; quem chama decide se tenta de novo.
    pub async fn mutate<T, F>(&self, lead_id: i64, change: F) -> Result<(Lead, T), AppError>
    where
        F: FnOnce(&mut Lead) -> Result<T, ScheduleError>,
    {
        let mut lead = self.get_lead(lead_id).await?;
        let result = change(&mut lead)?;
        let saved = self.lead_repo.save_washes(&self.pool, &lead).await?;
        Ok((saved, result))
    }

    // =========================================================================
    //  ÁREA 1: CADASTRO
    // =========================================================================

    pub async fn create_lead(&self, payload: CreateLeadPayload) -> Result<CreatedLead, AppError> {
        if let Some(existing) = self.lead_repo.find_by_phone(&payload.phone).await? {
            if existing.lead_type == LeadType::OneTime && payload.lead_type == LeadType::OneTime {
                tracing::info!(lead_id = existing.lead_id, "telefone já cadastrado, devolvendo cliente existente");
                return Ok(CreatedLead::Existing(existing));
            }
            return Err(AppError::PhoneAlreadyExists);
        }

        let now = Utc::now();
        let default_washer = self.resolve_washer(payload.assigned_washer_id).await?;
        let wash_washer = match &payload.one_time_wash {
            Some(input) => self.resolve_washer(input.washer_id).await?,
            None => None,
        };
        let subscription_washer = match &payload.monthly_subscription {
            Some(sub) => self.resolve_washer(sub.washer_id).await?,
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let lead_id = self.counter_repo.next_value(&mut *tx, LEAD_COUNTER).await?;

        let mut lead = Lead {
            id: Uuid::new_v4(),
            lead_id,
            lead_type: payload.lead_type,
            lead_source: payload.lead_source,
            status: LeadStatus::New,
            customer_name: payload.customer_name.trim().to_string(),
            phone: payload.phone.trim().to_string(),
            area: payload.area.trim().to_string(),
            car_model: payload.car_model,
            vehicle_number: payload.vehicle_number,
            notes: payload.notes,
            latitude: payload.latitude,
            longitude: payload.longitude,
            assigned_washer: default_washer,
            one_time_wash: None,
            monthly_subscription: None,
            wash_history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        if let Some(input) = payload.one_time_wash {
            lead.one_time_wash = Some(OneTimeWash {
                wash_type: input.wash_type,
                amount: input.amount.unwrap_or_else(default_wash_amount),
                scheduled_date: self.parse_optional(input.scheduled_date.as_deref())?,
                washer: wash_washer,
                status: OneTimeWashStatus::Pending,
                service_type: input.service_type,
                duration: None,
                paid: false,
                feedback: None,
                assigned_at: wash_washer.map(|_| now),
            });
            let target = OccurrenceRef::new(OccurrenceSource::OneTimeWash, 0);
            auto_assign::apply_policy(&mut lead, target, wash_washer, &self.calendar, now)?;
        }

        if let Some(sub) = &payload.monthly_subscription {
            subscription::attach_subscription(&mut lead, sub, subscription_washer, &self.calendar, now)?;
        }

        let created = self.lead_repo.create(&mut *tx, &lead).await?;
        tx.commit().await?;

        tracing::info!(lead_id = created.lead_id, lead_type = created.lead_type.label(), "cliente criado");
        Ok(CreatedLead::New(created))
    }

    pub async fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, AppError> {
        self.lead_repo.list(filter).await
    }

    pub async fn update_lead(&self, lead_id: i64, payload: UpdateLeadPayload) -> Result<Lead, AppError> {
        let changes = ProfileChanges {
            customer_name: payload.customer_name,
            phone: payload.phone,
            area: payload.area,
            car_model: payload.car_model,
            vehicle_number: payload.vehicle_number,
            notes: payload.notes,
            lead_source: payload.lead_source,
            status: payload.status,
            latitude: payload.latitude,
            longitude: payload.longitude,
        };
        self.lead_repo
            .update_profile(lead_id, &changes)
            .await?
            .ok_or(AppError::LeadNotFound)
    }

    pub async fn delete_lead(&self, lead_id: i64) -> Result<(), AppError> {
        if !self.lead_repo.delete(lead_id).await? {
            return Err(AppError::LeadNotFound);
        }
        tracing::info!(lead_id, "cliente removido");
        Ok(())
    }

    // =========================================================================
    //  ÁREA 2: HISTÓRICO DE LAVAGENS
    // =========================================================================

    pub async fn wash_history(&self, lead_id: i64) -> Result<Vec<IndexedWashHistoryEntry>, AppError> {
        let lead = self.get_lead(lead_id).await?;
        Ok(history_newest_first(&lead.wash_history))
    }

    pub async fn log_wash(&self, lead_id: i64, payload: LogWashPayload) -> Result<AssignmentResponse, AppError> {
        let now = Utc::now();
        let washer = self.resolve_washer(payload.washer_id).await?;
        let date = self.parse_optional(payload.date.as_deref())?;

        let entry = WashHistoryEntry {
            wash_type: payload.wash_type.trim().to_string(),
            washer,
            amount: payload.amount.unwrap_or_else(default_wash_amount),
            date,
            feedback: payload.feedback,
            paid: payload.paid,
            wash_status: WashStatus::Pending,
            service_type: payload.service_type,
            start_time: None,
            end_time: None,
            duration: None,
        };

        let calendar = self.calendar;
        let (lead, mut outcome) = self
            .mutate(lead_id, |lead| auto_assign::log_wash(lead, entry, &calendar, now))
            .await?;
        outcome.washer_resolved = payload.washer_id.is_none() || washer.is_some();
        self.respond(&lead, outcome).await
    }

    pub async fn start_wash(&self, lead_id: i64, index: usize) -> Result<Lead, AppError> {
        let now = Utc::now();
        let (lead, ()) = self
            .mutate(lead_id, |lead| completion::start_wash(lead, index, now))
            .await?;
        Ok(lead)
    }

    // =========================================================================
    //  ÁREA 3: ASSINATURA MENSAL
    // =========================================================================

    pub async fn create_subscription(
        &self,
        lead_id: i64,
        payload: CreateSubscriptionPayload,
    ) -> Result<SubscriptionOutcome, AppError> {
        let now = Utc::now();
        let washer = self.resolve_washer(payload.washer_id).await?;
        let calendar = self.calendar;

        let (lead, mut outcome) = self
            .mutate(lead_id, |lead| {
                subscription::attach_subscription(lead, &payload, washer, &calendar, now)
            })
            .await?;
        outcome.washer_resolved = payload.washer_id.is_none() || washer.is_some();

        tracing::info!(
            lead_id = lead.lead_id,
            washes = outcome.subscription.scheduled_washes.len(),
            auto_assigned = outcome.auto_assigned,
            "assinatura mensal criada"
        );
        Ok(outcome)
    }

    pub async fn get_subscription(&self, lead_id: i64) -> Result<MonthlySubscription, AppError> {
        self.get_lead(lead_id)
            .await?
            .monthly_subscription
            .ok_or(AppError::SubscriptionNotFound)
    }

    // =========================================================================
    //  ÁREA 4: CONCLUSÃO E REAGENDAMENTO
    // =========================================================================

    pub async fn complete_wash(&self, lead_id: i64, payload: CompleteWashPayload) -> Result<Lead, AppError> {
        let now = Utc::now();
        let washer = self.resolve_washer(payload.washer_id).await?;
        let details = CompletionDetails {
            washer,
            paid: payload.paid,
            feedback: payload.feedback,
            start_time: self.parse_optional(payload.start_time.as_deref())?,
            end_time: self.parse_optional(payload.end_time.as_deref())?,
            duration: payload.duration,
        };
        let target = OccurrenceRef::new(payload.source, payload.index);
        let calendar = self.calendar;

        let (lead, ()) = self
            .mutate(lead_id, |lead| completion::complete_occurrence(lead, target, details, &calendar, now))
            .await?;

        tracing::info!(lead_id, source = %target.source, index = target.index, "lavagem concluída");
        Ok(lead)
    }

    pub async fn reschedule(&self, lead_id: i64, payload: ReschedulePayload) -> Result<AssignmentResponse, AppError> {
        let now = Utc::now();
        let new_date = self.calendar.parse_instant(&payload.new_date)?;
        let target = OccurrenceRef::new(payload.source, payload.index);
        let calendar = self.calendar;

        let (lead, outcome) = self
            .mutate(lead_id, |lead| {
                auto_assign::reschedule(lead, target, new_date, payload.wash_type.as_deref(), &calendar, now)
            })
            .await?;
        self.respond(&lead, outcome).await
    }
}
