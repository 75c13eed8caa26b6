// src/scheduling/auto_assign.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::status::resolve_washer;
use super::{BusinessCalendar, OccurrenceRef, OccurrenceSource, ScheduleError};
use crate::models::lead::{
    Lead, LeadStatus, LeadType, OneTimeWash, OneTimeWashStatus, ScheduledWashStatus, ServiceType,
    WashHistoryEntry,
};

pub const DEFAULT_WASH_TYPE: &str = "Basic";

pub fn default_wash_amount() -> Decimal {
    Decimal::from(100)
}

/// Resultado de uma atribuição. Lavador não encontrado não é erro:
/// a entrada é gravada e os flags contam o que aconteceu.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub occurrence: OccurrenceRef,
    pub auto_assigned: bool,
    pub washer_resolved: bool,
    pub assignment_date: NaiveDate,
}

/// Hoje ou amanhã, no fuso do negócio.
pub fn is_imminent(day: NaiveDate, calendar: &BusinessCalendar, now: DateTime<Utc>) -> bool {
    let today = calendar.today(now);
    day == today || today.succ_opt() == Some(day)
}

/// Para ocorrências de hoje/amanhã com lavador, grava o lavador na própria
/// entrada e como padrão do cliente, e converte o cliente.
/// Devolve `true` quando propagou.
pub fn apply_policy(
    lead: &mut Lead,
    target: OccurrenceRef,
    washer: Option<Uuid>,
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> Result<bool, ScheduleError> {
    let Some(washer) = washer else {
        return Ok(false);
    };
    let Some(date) = target.date_in(lead)? else {
        return Ok(false);
    };
    if !is_imminent(calendar.day_of(date), calendar, now) {
        return Ok(false);
    }

    target.set_washer(lead, washer, now)?;
    lead.assigned_washer = Some(washer);
    lead.status = LeadStatus::Converted;
    Ok(true)
}

// Entrada já existente no dia alvo, na ordem mensal -> avulsa -> histórico
fn find_on_day(lead: &Lead, day: NaiveDate, calendar: &BusinessCalendar) -> Option<OccurrenceRef> {
    let on_day = |date: Option<DateTime<Utc>>| date.is_some_and(|d| calendar.day_of(d) == day);

    if let Some(sub) = &lead.monthly_subscription {
        let found = sub
            .scheduled_washes
            .iter()
            .position(|w| w.status == ScheduledWashStatus::Scheduled && on_day(w.scheduled_date));
        if let Some(index) = found {
            return Some(OccurrenceRef::new(OccurrenceSource::MonthlySubscription, index));
        }
    }

    let open_one_time = lead
        .one_time_wash
        .as_ref()
        .is_some_and(|w| !w.status.is_terminal() && on_day(Some(w.scheduled_date.unwrap_or(lead.created_at))));
    if open_one_time {
        return Some(OccurrenceRef::new(OccurrenceSource::OneTimeWash, 0));
    }

    lead.wash_history
        .iter()
        .position(|e| !e.wash_status.is_terminal() && on_day(e.date))
        .map(|index| OccurrenceRef::new(OccurrenceSource::WashHistory, index))
}

/// Atribui um lavador (se houver) a uma data: atualiza a entrada do dia ou
/// cria uma nova, e então aplica a política de auto-atribuição.
pub fn assign_to_date(
    lead: &mut Lead,
    washer: Option<Uuid>,
    target_date: DateTime<Utc>,
    wash_type: Option<&str>,
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> Result<AssignmentOutcome, ScheduleError> {
    let day = calendar.day_of(target_date);
    let wash_type = wash_type.map(str::trim).filter(|t| !t.is_empty());

    let target = match find_on_day(lead, day, calendar) {
        Some(existing) => existing,
        None if lead.lead_type == LeadType::OneTime && lead.one_time_wash.is_none() => {
            lead.one_time_wash = Some(OneTimeWash {
                wash_type: wash_type.map(str::to_string),
                amount: default_wash_amount(),
                scheduled_date: Some(target_date),
                washer: None,
                status: OneTimeWashStatus::Pending,
                service_type: ServiceType::Exterior,
                duration: None,
                paid: false,
                feedback: None,
                assigned_at: None,
            });
            OccurrenceRef::new(OccurrenceSource::OneTimeWash, 0)
        }
        None => {
            lead.wash_history.push(WashHistoryEntry::pending(
                wash_type.unwrap_or(DEFAULT_WASH_TYPE),
                default_wash_amount(),
                target_date,
            ));
            OccurrenceRef::new(OccurrenceSource::WashHistory, lead.wash_history.len() - 1)
        }
    };

    // O lavador escolhido fica sempre na entrada, mesmo fora de hoje/amanhã
    if let Some(washer) = washer {
        target.set_washer(lead, washer, now)?;
    }
    let auto_assigned = apply_policy(lead, target, washer, calendar, now)?;

    Ok(AssignmentOutcome {
        occurrence: target,
        auto_assigned,
        washer_resolved: washer.is_some(),
        assignment_date: day,
    })
}

/// Registra uma lavagem no histórico e aplica a política com o lavador
/// efetivo (o da entrada ou o padrão do cliente).
pub fn log_wash(
    lead: &mut Lead,
    mut entry: WashHistoryEntry,
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> Result<AssignmentOutcome, ScheduleError> {
    let date = *entry.date.get_or_insert(now);
    let washer = resolve_washer(entry.washer, lead.assigned_washer);
    lead.wash_history.push(entry);

    let target = OccurrenceRef::new(OccurrenceSource::WashHistory, lead.wash_history.len() - 1);
    let auto_assigned = apply_policy(lead, target, washer, calendar, now)?;

    Ok(AssignmentOutcome {
        occurrence: target,
        auto_assigned,
        washer_resolved: washer.is_some(),
        assignment_date: calendar.day_of(date),
    })
}

/// Move uma entrada em aberto para outra data e reaplica a política com o
/// lavador efetivo da entrada.
pub fn reschedule(
    lead: &mut Lead,
    target: OccurrenceRef,
    new_date: DateTime<Utc>,
    wash_type: Option<&str>,
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> Result<AssignmentOutcome, ScheduleError> {
    if !target.is_open_in(lead)? {
        return Err(ScheduleError::invalid_transition(target.source.as_str(), "closed", "rescheduled"));
    }
    let wash_type = wash_type.map(str::trim).filter(|t| !t.is_empty());
    let not_found = ScheduleError::OccurrenceNotFound(target.source, target.index);

    match target.source {
        OccurrenceSource::OneTimeWash => {
            let wash = lead.one_time_wash.as_mut().ok_or(not_found)?;
            wash.scheduled_date = Some(new_date);
            if let Some(t) = wash_type {
                wash.wash_type = Some(t.to_string());
            }
        }
        OccurrenceSource::MonthlySubscription => {
            let wash = lead
                .monthly_subscription
                .as_mut()
                .and_then(|sub| sub.scheduled_washes.get_mut(target.index))
                .ok_or(not_found)?;
            wash.scheduled_date = Some(new_date);
        }
        OccurrenceSource::WashHistory => {
            let entry = lead.wash_history.get_mut(target.index).ok_or(not_found)?;
            entry.date = Some(new_date);
            if let Some(t) = wash_type {
                entry.wash_type = t.to_string();
            }
        }
        OccurrenceSource::Lead => return Err(ScheduleError::ReadOnlySource(target.source)),
    }

    let washer = resolve_washer(target.washer_in(lead)?, lead.assigned_washer);
    let auto_assigned = apply_policy(lead, target, washer, calendar, now)?;

    Ok(AssignmentOutcome {
        occurrence: target,
        auto_assigned,
        washer_resolved: washer.is_some(),
        assignment_date: calendar.day_of(new_date),
    })
}
