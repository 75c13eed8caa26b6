// src/scheduling/pipeline.rs

use uuid::Uuid;

use super::normalizer::normalize;
use super::priority::dedupe_and_sort;
use super::status::resolve;
use super::{BusinessCalendar, DateWindow, OccurrenceRef, ResolvedOccurrence};
use crate::models::lead::Lead;

/// Agenda consolidada: normaliza, filtra pela janela, resolve lavador e
/// status, deduplica e ordena.
///
/// O filtro de lavador compara com o lavador *efetivo* (o da ocorrência ou,
/// na falta dele, o padrão do cliente).
pub fn build_calendar(
    leads: &[Lead],
    window: &DateWindow,
    washer_filter: Option<Uuid>,
    calendar: &BusinessCalendar,
) -> Vec<ResolvedOccurrence> {
    let resolved: Vec<ResolvedOccurrence> = leads
        .iter()
        .flat_map(|lead| {
            window
                .filter_occurrences(normalize(lead, calendar))
                .into_iter()
                .map(move |occurrence| resolve(occurrence, lead))
        })
        .filter(|item| washer_filter.is_none_or(|w| item.washer == Some(w)))
        .collect();

    dedupe_and_sort(resolved, calendar)
}

/// A entrada apontada por `target` como a agenda a mostraria, sem janela
/// nem deduplicação. `None` para entradas sem data legível.
pub fn resolve_one(lead: &Lead, target: OccurrenceRef, calendar: &BusinessCalendar) -> Option<ResolvedOccurrence> {
    normalize(lead, calendar)
        .into_iter()
        .find(|occurrence| occurrence.reference() == target)
        .map(|occurrence| resolve(occurrence, lead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::{LeadType, MonthlySubscription, ScheduledWash, WashHistoryEntry, WashStatus};
    use crate::scheduling::fixtures::{lead, ts};
    use crate::scheduling::{DisplayStatus, OccurrenceSource};
    use rust_decimal::Decimal;

    fn monthly_lead(name: &str) -> Lead {
        let mut l = lead(name);
        l.lead_type = LeadType::Monthly;
        l.monthly_subscription = Some(MonthlySubscription {
            package_type: "Basic".into(),
            custom_plan_name: String::new(),
            total_washes: 3,
            total_interior_washes: 1,
            used_interior_washes: 0,
            completed_washes: 0,
            monthly_price: Decimal::from(300),
            start_date: ts(2026, 10, 1, 0),
            end_date: ts(2026, 10, 31, 0),
            scheduled_washes: vec![
                ScheduledWash::stub(1, ts(2026, 10, 1, 10)),
                ScheduledWash::stub(2, ts(2026, 10, 11, 10)),
                ScheduledWash::stub(3, ts(2026, 10, 21, 10)),
            ],
            is_active: true,
        });
        // Espelho no histórico do mesmo dia da lavagem 2
        l.wash_history = vec![WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, 11, 8))];
        l
    }

    #[test]
    fn merges_monthly_and_history_mirror() {
        let l = monthly_lead("Ravi");
        let window = DateWindow::new(ts(2026, 10, 10, 0), ts(2026, 10, 12, 0)).unwrap();

        let out = build_calendar(std::slice::from_ref(&l), &window, None, &BusinessCalendar::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].occurrence.source, OccurrenceSource::MonthlySubscription);
        assert_eq!(out[0].occurrence.sequence_index, 1);
        assert_eq!(out[0].status, DisplayStatus::Pending);
    }

    #[test]
    fn washer_filter_uses_effective_washer() {
        let washer = Uuid::new_v4();
        let mut with_default = monthly_lead("Ravi");
        with_default.assigned_washer = Some(washer);
        let mut other = monthly_lead("Sita");
        other.wash_history[0].washer = Some(Uuid::new_v4());

        let window = DateWindow::new(ts(2026, 10, 1, 0), ts(2026, 10, 31, 0)).unwrap();
        let out = build_calendar(&[with_default.clone(), other], &window, Some(washer), &BusinessCalendar::default());

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|i| i.occurrence.lead == with_default.id));
        assert!(out.iter().all(|i| i.status == DisplayStatus::Assigned));
    }

    #[test]
    fn completed_history_shows_as_completed() {
        let mut l = lead("Asha");
        let mut entry = WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, 5, 10));
        entry.wash_status = WashStatus::Completed;
        l.wash_history = vec![entry];

        let window = DateWindow::new(ts(2026, 10, 1, 0), ts(2026, 10, 31, 0)).unwrap();
        let out = build_calendar(&[l], &window, None, &BusinessCalendar::default());
        assert_eq!(out[0].status, DisplayStatus::Completed);
    }

    #[test]
    fn resolve_one_skips_dedupe() {
        let washer = Uuid::new_v4();
        let mut l = monthly_lead("Ravi");
        l.assigned_washer = Some(washer);
        let target = OccurrenceRef::new(OccurrenceSource::WashHistory, 0);

        let item = resolve_one(&l, target, &BusinessCalendar::default()).unwrap();
        assert_eq!(item.occurrence.reference(), target);
        assert_eq!(item.washer, Some(washer));
        assert_eq!(item.status, DisplayStatus::Assigned);

        let missing = OccurrenceRef::new(OccurrenceSource::WashHistory, 5);
        assert!(resolve_one(&l, missing, &BusinessCalendar::default()).is_none());
    }
}
