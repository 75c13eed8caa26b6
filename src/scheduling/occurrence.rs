// src/scheduling/occurrence.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ScheduleError;
use crate::models::lead::{Lead, OneTimeWashStatus, ScheduledWashStatus, WashStatus};

// De onde veio a ocorrência dentro do registro do cliente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum OccurrenceSource {
    OneTimeWash,
    MonthlySubscription,
    WashHistory,
    /// Ocorrência sintética: cliente com lavador e sem nenhuma lavagem
    Lead,
}

impl OccurrenceSource {
    /// Maior vence na deduplicação.
    pub fn priority(&self) -> u8 {
        match self {
            OccurrenceSource::MonthlySubscription => 3,
            OccurrenceSource::OneTimeWash => 2,
            OccurrenceSource::WashHistory => 1,
            OccurrenceSource::Lead => 0,
        }
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            OccurrenceSource::OneTimeWash => "onetime",
            OccurrenceSource::MonthlySubscription => "monthly",
            OccurrenceSource::WashHistory => "history",
            OccurrenceSource::Lead => "lead",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OccurrenceSource::OneTimeWash => "oneTimeWash",
            OccurrenceSource::MonthlySubscription => "monthlySubscription",
            OccurrenceSource::WashHistory => "washHistory",
            OccurrenceSource::Lead => "lead",
        }
    }
}

impl fmt::Display for OccurrenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status bruto, como está gravado na estrutura de origem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawStatus {
    OneTime(OneTimeWashStatus),
    Scheduled(ScheduledWashStatus),
    History(WashStatus),
    Assigned,
}

impl RawStatus {
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            RawStatus::OneTime(OneTimeWashStatus::Completed)
                | RawStatus::Scheduled(ScheduledWashStatus::Completed)
                | RawStatus::History(WashStatus::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RawStatus::OneTime(s) => s.as_str(),
            RawStatus::Scheduled(s) => s.as_str(),
            RawStatus::History(s) => s.as_str(),
            RawStatus::Assigned => "assigned",
        }
    }
}

impl From<OneTimeWashStatus> for RawStatus {
    fn from(status: OneTimeWashStatus) -> Self {
        RawStatus::OneTime(status)
    }
}

impl From<ScheduledWashStatus> for RawStatus {
    fn from(status: ScheduledWashStatus) -> Self {
        RawStatus::Scheduled(status)
    }
}

impl From<WashStatus> for RawStatus {
    fn from(status: WashStatus) -> Self {
        RawStatus::History(status)
    }
}

// A ordem de declaração é a ordem de desempate no calendário
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Assigned,
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// `Lead::id` do cliente dono da ocorrência
    pub lead: Uuid,
    pub source: OccurrenceSource,
    pub sequence_index: usize,
    pub wash_type: String,
    pub date: DateTime<Utc>,
    pub washer: Option<Uuid>,
    pub raw_status: RawStatus,
}

impl Occurrence {
    pub fn reference(&self) -> OccurrenceRef {
        OccurrenceRef {
            source: self.source,
            index: self.sequence_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOccurrence {
    pub occurrence: Occurrence,
    /// Lavador efetivo (próprio ou o padrão do cliente)
    pub washer: Option<Uuid>,
    pub status: DisplayStatus,
}

/// Aponta para uma entrada concreta dentro do registro do cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceRef {
    pub source: OccurrenceSource,
    #[serde(default)]
    pub index: usize,
}

impl OccurrenceRef {
    pub fn new(source: OccurrenceSource, index: usize) -> Self {
        Self { source, index }
    }

    fn not_found(&self) -> ScheduleError {
        ScheduleError::OccurrenceNotFound(self.source, self.index)
    }

    /// Data da entrada apontada. `Ok(None)` quando a entrada existe mas
    /// não tem data legível.
    pub fn date_in(&self, lead: &Lead) -> Result<Option<DateTime<Utc>>, ScheduleError> {
        match self.source {
            OccurrenceSource::OneTimeWash => {
                let wash = lead
                    .one_time_wash
                    .as_ref()
                    .filter(|_| self.index == 0)
                    .ok_or_else(|| self.not_found())?;
                Ok(Some(wash.scheduled_date.unwrap_or(lead.created_at)))
            }
            OccurrenceSource::MonthlySubscription => lead
                .monthly_subscription
                .as_ref()
                .and_then(|sub| sub.scheduled_washes.get(self.index))
                .map(|wash| wash.scheduled_date)
                .ok_or_else(|| self.not_found()),
            OccurrenceSource::WashHistory => lead
                .wash_history
                .get(self.index)
                .map(|entry| entry.date)
                .ok_or_else(|| self.not_found()),
            OccurrenceSource::Lead => Err(ScheduleError::ReadOnlySource(self.source)),
        }
    }

    /// Lavador gravado na própria entrada.
    pub fn washer_in(&self, lead: &Lead) -> Result<Option<Uuid>, ScheduleError> {
        match self.source {
            OccurrenceSource::OneTimeWash => lead
                .one_time_wash
                .as_ref()
                .filter(|_| self.index == 0)
                .map(|wash| wash.washer)
                .ok_or_else(|| self.not_found()),
            OccurrenceSource::MonthlySubscription => lead
                .monthly_subscription
                .as_ref()
                .and_then(|sub| sub.scheduled_washes.get(self.index))
                .map(|wash| wash.washer)
                .ok_or_else(|| self.not_found()),
            OccurrenceSource::WashHistory => lead
                .wash_history
                .get(self.index)
                .map(|entry| entry.washer)
                .ok_or_else(|| self.not_found()),
            OccurrenceSource::Lead => Ok(lead.assigned_washer),
        }
    }

    pub fn set_washer(&self, lead: &mut Lead, washer: Uuid, now: DateTime<Utc>) -> Result<(), ScheduleError> {
        let not_found = self.not_found();
        match self.source {
            OccurrenceSource::OneTimeWash => {
                let wash = lead
                    .one_time_wash
                    .as_mut()
                    .filter(|_| self.index == 0)
                    .ok_or(not_found)?;
                wash.washer = Some(washer);
                wash.assigned_at = Some(now);
            }
            OccurrenceSource::MonthlySubscription => {
                let wash = lead
                    .monthly_subscription
                    .as_mut()
                    .and_then(|sub| sub.scheduled_washes.get_mut(self.index))
                    .ok_or(not_found)?;
                wash.washer = Some(washer);
            }
            OccurrenceSource::WashHistory => {
                let entry = lead.wash_history.get_mut(self.index).ok_or(not_found)?;
                entry.washer = Some(washer);
            }
            OccurrenceSource::Lead => lead.assigned_washer = Some(washer),
        }
        Ok(())
    }

    /// Entrada ainda pode ser alterada (não concluída nem cancelada).
    pub fn is_open_in(&self, lead: &Lead) -> Result<bool, ScheduleError> {
        let not_found = self.not_found();
        match self.source {
            OccurrenceSource::OneTimeWash => lead
                .one_time_wash
                .as_ref()
                .filter(|_| self.index == 0)
                .map(|wash| !wash.status.is_terminal())
                .ok_or(not_found),
            OccurrenceSource::MonthlySubscription => lead
                .monthly_subscription
                .as_ref()
                .and_then(|sub| sub.scheduled_washes.get(self.index))
                .map(|wash| !wash.status.is_terminal())
                .ok_or(not_found),
            OccurrenceSource::WashHistory => lead
                .wash_history
                .get(self.index)
                .map(|entry| !entry.wash_status.is_terminal())
                .ok_or(not_found),
            OccurrenceSource::Lead => Err(ScheduleError::ReadOnlySource(self.source)),
        }
    }

    /// Identificador estável exposto na agenda: `monthly_<lead>_<índice>`.
    pub fn public_id(&self, lead: Uuid) -> String {
        format!("{}_{}_{}", self.source.id_prefix(), lead, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::fixtures;

    #[test]
    fn display_status_orders_assigned_first() {
        assert!(DisplayStatus::Assigned < DisplayStatus::Pending);
        assert!(DisplayStatus::Pending < DisplayStatus::Completed);
    }

    #[test]
    fn source_serializes_camel_case() {
        let json = serde_json::to_string(&OccurrenceSource::MonthlySubscription).unwrap();
        assert_eq!(json, "\"monthlySubscription\"");

        let parsed: OccurrenceRef = serde_json::from_str(r#"{"source":"washHistory","index":2}"#).unwrap();
        assert_eq!(parsed, OccurrenceRef::new(OccurrenceSource::WashHistory, 2));
    }

    #[test]
    fn missing_entry_is_not_found() {
        let lead = fixtures::lead("Asha");
        let err = OccurrenceRef::new(OccurrenceSource::WashHistory, 0)
            .date_in(&lead)
            .unwrap_err();
        assert_eq!(err, ScheduleError::OccurrenceNotFound(OccurrenceSource::WashHistory, 0));
    }
}
