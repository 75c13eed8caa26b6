// src/scheduling/window.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{BusinessCalendar, Occurrence, ScheduleError};
use crate::models::lead::Lead;

/// Janela fechada `[start, end]` usada pela agenda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ScheduleError> {
        if start > end {
            return Err(ScheduleError::InvertedWindow);
        }
        Ok(Self { start, end })
    }

    /// Monta a janela a partir da query string. Valores vazios contam
    /// como ausentes.
    pub fn parse(
        start: Option<&str>,
        end: Option<&str>,
        calendar: &BusinessCalendar,
    ) -> Result<Self, ScheduleError> {
        let (Some(start), Some(end)) = (present(start), present(end)) else {
            return Err(ScheduleError::DatesRequired);
        };
        Self::new(calendar.parse_instant(start)?, calendar.parse_instant(end)?)
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn filter_occurrences(&self, occurrences: Vec<Occurrence>) -> Vec<Occurrence> {
        occurrences
            .into_iter()
            .filter(|o| self.contains(o.date))
            .collect()
    }

    /// Versão em memória do filtro grosso aplicado na consulta SQL.
    /// Pode aceitar registros a mais, nunca a menos.
    pub fn record_may_match(&self, lead: &Lead) -> bool {
        let one_time = lead
            .one_time_wash
            .as_ref()
            .is_some_and(|w| self.contains(w.scheduled_date.unwrap_or(lead.created_at)));

        let monthly = lead.monthly_subscription.as_ref().is_some_and(|sub| {
            sub.scheduled_washes
                .iter()
                .filter_map(|w| w.scheduled_date)
                .any(|d| self.contains(d))
        });

        let history = lead
            .wash_history
            .iter()
            .filter_map(|e| e.date)
            .any(|d| self.contains(d));

        // A ocorrência sintética cai na meia-noite local do dia da criação,
        // que fica no máximo a um dia de distância de `created_at`.
        // Nos extremos do calendário a folga satura.
        let slack = Duration::days(1);
        let from = self.start.checked_sub_signed(slack).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let to = self.end.checked_add_signed(slack).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let synthetic = lead.assigned_washer.is_some()
            && lead.has_no_wash_entries()
            && from <= lead.created_at
            && lead.created_at <= to;

        one_time || monthly || history || synthetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::WashHistoryEntry;
    use crate::scheduling::fixtures::{lead, ts};
    use crate::scheduling::normalizer::normalize;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn inverted_window_is_rejected() {
        let err = DateWindow::new(ts(2026, 10, 2, 0), ts(2026, 10, 1, 0)).unwrap_err();
        assert_eq!(err, ScheduleError::InvertedWindow);
    }

    #[test]
    fn missing_or_blank_dates_are_required() {
        let cal = BusinessCalendar::default();
        assert_eq!(DateWindow::parse(None, Some("2026-10-01"), &cal), Err(ScheduleError::DatesRequired));
        assert_eq!(DateWindow::parse(Some("  "), Some("2026-10-01"), &cal), Err(ScheduleError::DatesRequired));
    }

    #[test]
    fn bounds_are_inclusive() {
        let window = DateWindow::new(ts(2026, 10, 1, 0), ts(2026, 10, 7, 0)).unwrap();
        assert!(window.contains(ts(2026, 10, 1, 0)));
        assert!(window.contains(ts(2026, 10, 7, 0)));
        // Sem normalização de fim de dia: 10:00 do último dia fica fora
        assert!(!window.contains(ts(2026, 10, 7, 10)));
    }

    #[test]
    fn filter_keeps_exactly_the_in_range_occurrences() {
        let mut l = lead("Ravi");
        l.wash_history = (1..=9)
            .map(|d| WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, d, 10)))
            .collect();
        let window = DateWindow::new(ts(2026, 10, 3, 0), ts(2026, 10, 5, 23)).unwrap();

        let kept = window.filter_occurrences(normalize(&l, &BusinessCalendar::default()));
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|o| window.contains(o.date)));
        assert!(window.record_may_match(&l));
    }

    #[test]
    fn coarse_match_covers_synthetic_occurrence() {
        let calendar = BusinessCalendar::parse_offset("+05:30").unwrap();
        let mut l = lead("Anil");
        l.assigned_washer = Some(Uuid::new_v4());
        let synthetic_date = normalize(&l, &calendar)[0].date;

        let window = DateWindow::new(synthetic_date, synthetic_date).unwrap();
        assert!(window.record_may_match(&l));

        let far = DateWindow::new(ts(2026, 12, 1, 0), ts(2026, 12, 2, 0)).unwrap();
        assert!(!far.record_may_match(&l));
    }

    #[test]
    fn slack_saturates_at_calendar_edges() {
        let mut l = lead("Anil");
        l.assigned_washer = Some(Uuid::new_v4());

        let cal = BusinessCalendar::default();
        let window = DateWindow::parse(Some("2026-01-01"), Some("+262142-12-31"), &cal).unwrap();
        assert!(window.record_may_match(&l));

        let edges = DateWindow::new(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC).unwrap();
        assert!(edges.record_may_match(&l));
    }
}
