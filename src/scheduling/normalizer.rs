// src/scheduling/normalizer.rs

use super::{BusinessCalendar, Occurrence, OccurrenceSource, RawStatus};
use crate::models::lead::Lead;

/// Achata as três estruturas de lavagem do cliente numa lista de ocorrências.
///
/// Entradas sem data legível não geram ocorrência. Cliente sem nenhuma
/// lavagem mas com lavador padrão gera uma ocorrência sintética no dia
/// da criação do registro.
pub fn normalize(lead: &Lead, calendar: &BusinessCalendar) -> Vec<Occurrence> {
    let mut out = Vec::new();

    if let Some(wash) = &lead.one_time_wash {
        out.push(Occurrence {
            lead: lead.id,
            source: OccurrenceSource::OneTimeWash,
            sequence_index: 0,
            wash_type: wash
                .wash_type
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| lead.lead_type.label().to_string()),
            date: wash.scheduled_date.unwrap_or(lead.created_at),
            washer: wash.washer,
            raw_status: RawStatus::from(wash.status),
        });
    }

    if let Some(sub) = &lead.monthly_subscription {
        for (index, wash) in sub.scheduled_washes.iter().enumerate() {
            let Some(date) = wash.scheduled_date else {
                continue;
            };
            out.push(Occurrence {
                lead: lead.id,
                source: OccurrenceSource::MonthlySubscription,
                sequence_index: index,
                wash_type: sub.package_type.clone(),
                date,
                washer: wash.washer,
                raw_status: RawStatus::from(wash.status),
            });
        }
    }

    for (index, entry) in lead.wash_history.iter().enumerate() {
        let Some(date) = entry.date else {
            continue;
        };
        out.push(Occurrence {
            lead: lead.id,
            source: OccurrenceSource::WashHistory,
            sequence_index: index,
            wash_type: entry.wash_type.clone(),
            date,
            washer: entry.washer,
            raw_status: RawStatus::from(entry.wash_status),
        });
    }

    let washer = lead.assigned_washer.filter(|_| lead.has_no_wash_entries());
    let synthetic_date = calendar.start_of_day(calendar.day_of(lead.created_at));
    if let (Some(washer), Some(date)) = (washer, synthetic_date) {
        out.push(Occurrence {
            lead: lead.id,
            source: OccurrenceSource::Lead,
            sequence_index: 0,
            wash_type: lead.lead_type.label().to_string(),
            date,
            washer: Some(washer),
            raw_status: RawStatus::Assigned,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::{
        LeadType, MonthlySubscription, OneTimeWash, OneTimeWashStatus, ScheduledWash, ServiceType,
        WashHistoryEntry,
    };
    use crate::scheduling::fixtures::{lead, ts};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn one_time(date: Option<chrono::DateTime<chrono::Utc>>) -> OneTimeWash {
        OneTimeWash {
            wash_type: None,
            amount: Decimal::from(100),
            scheduled_date: date,
            washer: None,
            status: OneTimeWashStatus::Pending,
            service_type: ServiceType::Exterior,
            duration: None,
            paid: false,
            feedback: None,
            assigned_at: None,
        }
    }

    fn subscription(washes: Vec<ScheduledWash>) -> MonthlySubscription {
        MonthlySubscription {
            package_type: "Premium".into(),
            custom_plan_name: String::new(),
            total_washes: 4,
            total_interior_washes: 2,
            used_interior_washes: 0,
            completed_washes: 0,
            monthly_price: Decimal::from(400),
            start_date: ts(2026, 10, 1, 0),
            end_date: ts(2026, 10, 31, 0),
            scheduled_washes: washes,
            is_active: true,
        }
    }

    #[test]
    fn counts_every_dated_entry() {
        let mut l = lead("Ravi");
        l.one_time_wash = Some(one_time(Some(ts(2026, 10, 5, 10))));
        l.monthly_subscription = Some(subscription(vec![
            ScheduledWash::stub(1, ts(2026, 10, 2, 10)),
            ScheduledWash::stub(2, ts(2026, 10, 9, 10)),
        ]));
        l.wash_history = vec![
            WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, 2, 10)),
            WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, 3, 10)),
            WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, 4, 10)),
        ];

        let occurrences = normalize(&l, &BusinessCalendar::default());
        assert_eq!(occurrences.len(), 1 + 2 + 3);
        assert!(occurrences.iter().all(|o| o.source != OccurrenceSource::Lead));

        let monthly: Vec<_> = occurrences
            .iter()
            .filter(|o| o.source == OccurrenceSource::MonthlySubscription)
            .collect();
        assert_eq!(monthly[1].sequence_index, 1);
        assert_eq!(monthly[1].wash_type, "Premium");
    }

    #[test]
    fn one_time_without_date_uses_creation_and_lead_type() {
        let mut l = lead("Meera");
        l.one_time_wash = Some(one_time(None));

        let occurrences = normalize(&l, &BusinessCalendar::default());
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].date, l.created_at);
        assert_eq!(occurrences[0].wash_type, LeadType::OneTime.label());
    }

    #[test]
    fn undated_entries_are_skipped() {
        let mut l = lead("Kiran");
        let mut undated = ScheduledWash::stub(1, ts(2026, 10, 2, 10));
        undated.scheduled_date = None;
        l.monthly_subscription = Some(subscription(vec![undated]));
        let mut entry = WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, 2, 10));
        entry.date = None;
        l.wash_history = vec![entry];

        assert!(normalize(&l, &BusinessCalendar::default()).is_empty());
    }

    #[test]
    fn synthetic_occurrence_for_assigned_empty_lead() {
        let calendar = BusinessCalendar::parse_offset("+05:30").unwrap();
        let washer = Uuid::new_v4();
        let mut l = lead("Anil");
        l.assigned_washer = Some(washer);

        let occurrences = normalize(&l, &calendar);
        assert_eq!(occurrences.len(), 1);
        let synthetic = &occurrences[0];
        assert_eq!(synthetic.source, OccurrenceSource::Lead);
        assert_eq!(synthetic.washer, Some(washer));
        assert_eq!(synthetic.raw_status, RawStatus::Assigned);
        // 2026-10-01 09:00 UTC -> dia local 2026-10-01, meia-noite IST = 18:30 UTC do dia anterior
        assert_eq!(Some(synthetic.date), calendar.start_of_day(calendar.day_of(l.created_at)));
        assert_eq!(synthetic.date, ts(2026, 9, 30, 18) + chrono::Duration::minutes(30));
    }

    #[test]
    fn empty_lead_without_washer_yields_nothing() {
        assert!(normalize(&lead("Nobody"), &BusinessCalendar::default()).is_empty());
    }
}
