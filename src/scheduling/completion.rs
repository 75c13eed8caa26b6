// src/scheduling/completion.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::auto_assign::default_wash_amount;
use super::subscription::package_wash_price;
use super::{BusinessCalendar, OccurrenceRef, OccurrenceSource, ScheduleError};
use crate::models::lead::{
    Lead, LeadStatus, OneTimeWashStatus, ScheduledWashStatus, WashHistoryEntry, WashStatus,
};

/// Dados informados ao concluir uma lavagem. Lavador já resolvido para id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionDetails {
    pub washer: Option<Uuid>,
    pub paid: Option<bool>,
    pub feedback: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Minutos
    pub duration: Option<i64>,
}

fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64, ScheduleError> {
    if end < start {
        return Err(ScheduleError::InvertedTimeRange);
    }
    let seconds = (end - start).num_seconds();
    Ok((seconds + 30) / 60)
}

// O que foi concluído, para refletir na estrutura irmã
struct Completed {
    wash_type: String,
    date: DateTime<Utc>,
    washer: Option<Uuid>,
    amount: Decimal,
    paid: bool,
    feedback: Option<String>,
    duration: Option<i64>,
}

// Direção do reflexo de uma conclusão
enum Reflection {
    IntoHistory(Completed),
    IntoSchedule(Completed),
}

/// Conclui a entrada apontada por `target`.
///
/// Avulsa e mensal são espelhadas no histórico (que é a fonte da receita):
/// a primeira entrada em aberto do mesmo dia e mesmo tipo é concluída; sem
/// ela, uma nova entrada concluída é anexada na data da lavagem.
///
/// No sentido inverso, concluir pelo histórico fecha a lavagem mensal (ou a
/// avulsa) em aberto do mesmo dia e mesmo tipo, já que é a mesma lavagem.
pub fn complete_occurrence(
    lead: &mut Lead,
    target: OccurrenceRef,
    details: CompletionDetails,
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> Result<(), ScheduleError> {
    let measured = match (details.start_time, details.end_time) {
        (Some(start), Some(end)) => Some(minutes_between(start, end)?),
        _ => None,
    };
    let duration = measured.or(details.duration);
    let not_found = ScheduleError::OccurrenceNotFound(target.source, target.index);

    let reflection = match target.source {
        OccurrenceSource::OneTimeWash => {
            let label = lead.lead_type.label();
            let created_at = lead.created_at;
            let wash = lead
                .one_time_wash
                .as_mut()
                .filter(|_| target.index == 0)
                .ok_or(not_found)?;
            wash.status.transition_to(OneTimeWashStatus::Completed)?;
            wash.washer = details.washer.or(wash.washer);
            wash.paid = details.paid.unwrap_or(wash.paid);
            if details.feedback.is_some() {
                wash.feedback = details.feedback.clone();
            }
            wash.duration = duration.or(wash.duration);
            if wash.amount.is_zero() {
                wash.amount = default_wash_amount();
            }
            Some(Reflection::IntoHistory(Completed {
                wash_type: wash.wash_type.clone().unwrap_or_else(|| label.to_string()),
                date: wash.scheduled_date.unwrap_or(created_at),
                washer: wash.washer,
                amount: wash.amount,
                paid: wash.paid,
                feedback: wash.feedback.clone(),
                duration: wash.duration,
            }))
        }
        OccurrenceSource::MonthlySubscription => {
            let sub = lead.monthly_subscription.as_mut().ok_or(not_found.clone())?;
            let package_type = sub.package_type.clone();
            let wash = sub.scheduled_washes.get_mut(target.index).ok_or(not_found)?;
            wash.status.transition_to(ScheduledWashStatus::Completed)?;
            wash.completed_date = Some(details.end_time.unwrap_or(now));
            wash.washer = details.washer.or(wash.washer);
            wash.paid = details.paid.unwrap_or(wash.paid);
            if details.feedback.is_some() {
                wash.feedback = details.feedback.clone();
            }
            wash.duration = duration.or(wash.duration);
            if wash.amount.is_zero() {
                wash.amount = package_wash_price(&package_type);
            }
            let completed = Completed {
                wash_type: package_type,
                date: wash.scheduled_date.unwrap_or(now),
                washer: wash.washer,
                amount: wash.amount,
                paid: wash.paid,
                feedback: wash.feedback.clone(),
                duration: wash.duration,
            };
            sub.record_completion();
            Some(Reflection::IntoHistory(completed))
        }
        OccurrenceSource::WashHistory => {
            let entry = lead.wash_history.get_mut(target.index).ok_or(not_found)?;
            entry.wash_status.transition_to(WashStatus::Completed)?;
            if details.start_time.is_some() {
                entry.start_time = details.start_time;
            }
            let end = details.end_time.unwrap_or(now);
            entry.end_time = Some(end);
            entry.duration = match (duration, entry.start_time) {
                (Some(minutes), _) => Some(minutes),
                (None, Some(start)) => Some(minutes_between(start, end)?),
                (None, None) => entry.duration,
            };
            entry.washer = details.washer.or(entry.washer);
            entry.paid = details.paid.unwrap_or(entry.paid);
            if details.feedback.is_some() {
                entry.feedback = details.feedback;
            }
            if entry.amount.is_zero() {
                entry.amount = default_wash_amount();
            }
            entry.date.map(|date| {
                Reflection::IntoSchedule(Completed {
                    wash_type: entry.wash_type.clone(),
                    date,
                    washer: entry.washer,
                    amount: entry.amount,
                    paid: entry.paid,
                    feedback: entry.feedback.clone(),
                    duration: entry.duration,
                })
            })
        }
        OccurrenceSource::Lead => return Err(ScheduleError::ReadOnlySource(target.source)),
    };

    match reflection {
        Some(Reflection::IntoHistory(completed)) => mirror_into_history(lead, completed, calendar, now),
        Some(Reflection::IntoSchedule(completed)) => {
            let completed_at = details.end_time.unwrap_or(now);
            reflect_into_schedule(lead, completed, calendar, completed_at)?;
        }
        None => {}
    }
    lead.status = LeadStatus::Converted;
    Ok(())
}

fn mirror_into_history(lead: &mut Lead, completed: Completed, calendar: &BusinessCalendar, now: DateTime<Utc>) {
    let day = calendar.day_of(completed.date);
    let existing = lead.wash_history.iter_mut().find(|e| {
        e.wash_status.can_become(WashStatus::Completed)
            && e.wash_type == completed.wash_type
            && e.date.is_some_and(|d| calendar.day_of(d) == day)
    });

    match existing {
        Some(entry) => {
            entry.wash_status = WashStatus::Completed;
            entry.washer = completed.washer.or(entry.washer);
            entry.amount = completed.amount;
            entry.paid = completed.paid;
            entry.feedback = completed.feedback.or(entry.feedback.take());
            entry.duration = completed.duration.or(entry.duration);
            entry.end_time = Some(now);
        }
        None => {
            let mut entry = WashHistoryEntry::pending(&completed.wash_type, completed.amount, completed.date);
            entry.wash_status = WashStatus::Completed;
            entry.washer = completed.washer;
            entry.paid = completed.paid;
            entry.feedback = completed.feedback;
            entry.duration = completed.duration;
            entry.end_time = Some(now);
            lead.wash_history.push(entry);
        }
    }
}

// Mensal tem precedência sobre a avulsa; só uma é fechada
fn reflect_into_schedule(
    lead: &mut Lead,
    completed: Completed,
    calendar: &BusinessCalendar,
    completed_at: DateTime<Utc>,
) -> Result<(), ScheduleError> {
    let day = calendar.day_of(completed.date);
    let on_day = |date: Option<DateTime<Utc>>| date.is_some_and(|d| calendar.day_of(d) == day);

    if let Some(sub) = lead
        .monthly_subscription
        .as_mut()
        .filter(|sub| sub.package_type == completed.wash_type)
    {
        let open = sub
            .scheduled_washes
            .iter()
            .position(|w| w.status.can_become(ScheduledWashStatus::Completed) && on_day(w.scheduled_date));
        if let Some(index) = open {
            let package_type = sub.package_type.clone();
            let wash = &mut sub.scheduled_washes[index];
            wash.status.transition_to(ScheduledWashStatus::Completed)?;
            wash.completed_date = Some(completed_at);
            wash.washer = completed.washer.or(wash.washer);
            wash.paid = completed.paid;
            wash.feedback = completed.feedback.or(wash.feedback.take());
            wash.duration = completed.duration.or(wash.duration);
            if wash.amount.is_zero() {
                wash.amount = package_wash_price(&package_type);
            }
            sub.record_completion();
            return Ok(());
        }
    }

    let label = lead.lead_type.label();
    let created_at = lead.created_at;
    let open_one_time = lead.one_time_wash.as_mut().filter(|w| {
        !w.status.is_terminal()
            && on_day(Some(w.scheduled_date.unwrap_or(created_at)))
            && w.wash_type.as_deref().unwrap_or(label) == completed.wash_type
    });
    if let Some(wash) = open_one_time {
        wash.status.transition_to(OneTimeWashStatus::Completed)?;
        wash.washer = completed.washer.or(wash.washer);
        wash.paid = completed.paid;
        wash.feedback = completed.feedback.or(wash.feedback.take());
        wash.duration = completed.duration.or(wash.duration);
        if wash.amount.is_zero() {
            wash.amount = completed.amount;
        }
    }
    Ok(())
}

/// Washer começou a lavagem: histórico vai para `in-progress`.
pub fn start_wash(lead: &mut Lead, index: usize, now: DateTime<Utc>) -> Result<(), ScheduleError> {
    let entry = lead
        .wash_history
        .get_mut(index)
        .ok_or(ScheduleError::OccurrenceNotFound(OccurrenceSource::WashHistory, index))?;
    entry.wash_status.transition_to(WashStatus::InProgress)?;
    entry.start_time = Some(now);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::{LeadType, MonthlySubscription, ScheduledWash};
    use crate::scheduling::fixtures::{lead, ts};
    use chrono::Duration;

    fn monthly(total: u32, washes: Vec<ScheduledWash>) -> MonthlySubscription {
        MonthlySubscription {
            package_type: "Premium".into(),
            custom_plan_name: String::new(),
            total_washes: total,
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
    fn monthly_completion_updates_mirror_and_counter() {
        let now = ts(2026, 10, 8, 12);
        let washer = Uuid::new_v4();
        let mut l = lead("Ravi");
        l.lead_type = LeadType::Monthly;
        l.monthly_subscription = Some(monthly(
            4,
            vec![
                ScheduledWash::stub(1, ts(2026, 10, 1, 10)),
                ScheduledWash::stub(2, ts(2026, 10, 8, 10)),
            ],
        ));
        l.wash_history = vec![WashHistoryEntry::pending("Premium", Decimal::from(100), ts(2026, 10, 8, 10))];

        let details = CompletionDetails {
            washer: Some(washer),
            paid: Some(true),
            ..Default::default()
        };
        let target = OccurrenceRef::new(OccurrenceSource::MonthlySubscription, 1);
        complete_occurrence(&mut l, target, details, &BusinessCalendar::default(), now).unwrap();

        let sub = l.monthly_subscription.as_ref().unwrap();
        assert_eq!(sub.completed_washes, 1);
        assert_eq!(sub.scheduled_washes[1].status, ScheduledWashStatus::Completed);
        assert_eq!(sub.scheduled_washes[1].completed_date, Some(now));
        // valor zerado cai no padrão do pacote
        assert_eq!(sub.scheduled_washes[1].amount, Decimal::from(125));

        assert_eq!(l.wash_history.len(), 1);
        assert_eq!(l.wash_history[0].wash_status, WashStatus::Completed);
        assert_eq!(l.wash_history[0].washer, Some(washer));
        assert!(l.wash_history[0].paid);
        assert_eq!(l.status, LeadStatus::Converted);
    }

    #[test]
    fn completing_twice_is_rejected() {
        let now = ts(2026, 10, 8, 12);
        let mut l = lead("Ravi");
        l.monthly_subscription = Some(monthly(4, vec![ScheduledWash::stub(1, ts(2026, 10, 8, 10))]));
        let target = OccurrenceRef::new(OccurrenceSource::MonthlySubscription, 0);
        let cal = BusinessCalendar::default();

        complete_occurrence(&mut l, target, CompletionDetails::default(), &cal, now).unwrap();
        let err = complete_occurrence(&mut l, target, CompletionDetails::default(), &cal, now).unwrap_err();

        assert!(matches!(err, ScheduleError::InvalidTransition { .. }));
        assert_eq!(l.monthly_subscription.as_ref().unwrap().completed_washes, 1);
    }

    #[test]
    fn last_wash_closes_subscription() {
        let now = ts(2026, 10, 8, 12);
        let mut l = lead("Ravi");
        l.monthly_subscription = Some(monthly(1, vec![ScheduledWash::stub(1, ts(2026, 10, 8, 10))]));

        let target = OccurrenceRef::new(OccurrenceSource::MonthlySubscription, 0);
        complete_occurrence(&mut l, target, CompletionDetails::default(), &BusinessCalendar::default(), now)
            .unwrap();

        let sub = l.monthly_subscription.as_ref().unwrap();
        assert_eq!(sub.completed_washes, 1);
        assert!(!sub.is_active);
    }

    #[test]
    fn one_time_without_mirror_appends_entry_on_wash_date() {
        let now = ts(2026, 10, 9, 12);
        let mut l = lead("Meera");
        l.assigned_washer = None;
        crate::scheduling::auto_assign::assign_to_date(
            &mut l,
            None,
            ts(2026, 10, 8, 10),
            Some("Deluxe"),
            &BusinessCalendar::default(),
            now,
        )
        .unwrap();

        let details = CompletionDetails {
            start_time: Some(ts(2026, 10, 8, 10)),
            end_time: Some(ts(2026, 10, 8, 10) + Duration::seconds(45 * 60 + 40)),
            ..Default::default()
        };
        let target = OccurrenceRef::new(OccurrenceSource::OneTimeWash, 0);
        complete_occurrence(&mut l, target, details, &BusinessCalendar::default(), now).unwrap();

        let wash = l.one_time_wash.as_ref().unwrap();
        assert_eq!(wash.status, OneTimeWashStatus::Completed);
        assert_eq!(wash.duration, Some(46));
        assert_eq!(l.wash_history.len(), 1);
        assert_eq!(l.wash_history[0].wash_type, "Deluxe");
        assert_eq!(l.wash_history[0].date, Some(ts(2026, 10, 8, 10)));
        assert_eq!(l.wash_history[0].wash_status, WashStatus::Completed);
    }

    #[test]
    fn inverted_time_range_is_rejected() {
        let mut l = lead("Ravi");
        l.wash_history = vec![WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, 8, 10))];
        let details = CompletionDetails {
            start_time: Some(ts(2026, 10, 8, 11)),
            end_time: Some(ts(2026, 10, 8, 10)),
            ..Default::default()
        };
        let target = OccurrenceRef::new(OccurrenceSource::WashHistory, 0);
        let err = complete_occurrence(&mut l, target, details, &BusinessCalendar::default(), ts(2026, 10, 8, 12))
            .unwrap_err();
        assert_eq!(err, ScheduleError::InvertedTimeRange);
        assert_eq!(l.wash_history[0].wash_status, WashStatus::Pending);
    }

    #[test]
    fn history_duration_from_stored_start() {
        let mut l = lead("Ravi");
        l.wash_history = vec![WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, 8, 10))];
        start_wash(&mut l, 0, ts(2026, 10, 8, 10)).unwrap();
        assert_eq!(l.wash_history[0].wash_status, WashStatus::InProgress);

        let target = OccurrenceRef::new(OccurrenceSource::WashHistory, 0);
        complete_occurrence(&mut l, target, CompletionDetails::default(), &BusinessCalendar::default(), ts(2026, 10, 8, 11))
            .unwrap();

        assert_eq!(l.wash_history[0].duration, Some(60));
        assert_eq!(l.wash_history[0].end_time, Some(ts(2026, 10, 8, 11)));
    }

    #[test]
    fn history_completion_closes_mirrored_monthly_wash() {
        use crate::models::lead::CreateSubscriptionPayload;
        use crate::scheduling::{pipeline::build_calendar, DateWindow, DisplayStatus};

        let now = ts(2026, 10, 15, 9);
        let cal = BusinessCalendar::default();
        let mut l = lead("Ravi");
        let payload = CreateSubscriptionPayload {
            package_type: Some("Basic".into()),
            custom_plan_name: None,
            total_washes: None,
            total_interior_washes: None,
            monthly_price: None,
            start_date: None,
            scheduled_dates: None,
            paid: false,
            washer_id: None,
        };
        crate::scheduling::subscription::attach_subscription(&mut l, &payload, None, &cal, now).unwrap();

        let target = OccurrenceRef::new(OccurrenceSource::WashHistory, 0);
        complete_occurrence(&mut l, target, CompletionDetails::default(), &cal, ts(2026, 10, 15, 11)).unwrap();

        let sub = l.monthly_subscription.as_ref().unwrap();
        assert_eq!(sub.completed_washes, 1);
        assert_eq!(sub.scheduled_washes[0].status, ScheduledWashStatus::Completed);
        assert_eq!(sub.scheduled_washes[0].completed_date, Some(ts(2026, 10, 15, 11)));
        assert_eq!(sub.scheduled_washes[1].status, ScheduledWashStatus::Scheduled);

        let window = DateWindow::new(ts(2026, 10, 15, 0), ts(2026, 10, 15, 23)).unwrap();
        let day = build_calendar(std::slice::from_ref(&l), &window, None, &cal);
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].occurrence.source, OccurrenceSource::MonthlySubscription);
        assert_eq!(day[0].status, DisplayStatus::Completed);
    }

    #[test]
    fn history_completion_of_other_type_leaves_monthly_open() {
        let now = ts(2026, 10, 8, 12);
        let mut l = lead("Ravi");
        l.monthly_subscription = Some(monthly(4, vec![ScheduledWash::stub(1, ts(2026, 10, 8, 10))]));
        l.wash_history = vec![WashHistoryEntry::pending("Interior", Decimal::from(80), ts(2026, 10, 8, 15))];

        let target = OccurrenceRef::new(OccurrenceSource::WashHistory, 0);
        complete_occurrence(&mut l, target, CompletionDetails::default(), &BusinessCalendar::default(), now).unwrap();

        let sub = l.monthly_subscription.as_ref().unwrap();
        assert_eq!(sub.completed_washes, 0);
        assert_eq!(sub.scheduled_washes[0].status, ScheduledWashStatus::Scheduled);
    }

    #[test]
    fn history_completion_closes_one_time_wash_on_same_day() {
        let now = ts(2026, 10, 9, 12);
        let washer = Uuid::new_v4();
        let mut l = lead("Meera");
        crate::scheduling::auto_assign::assign_to_date(
            &mut l,
            None,
            ts(2026, 10, 9, 8),
            Some("Deluxe"),
            &BusinessCalendar::default(),
            now,
        )
        .unwrap();
        l.wash_history = vec![WashHistoryEntry::pending("Deluxe", Decimal::from(150), ts(2026, 10, 9, 10))];

        let details = CompletionDetails {
            washer: Some(washer),
            paid: Some(true),
            ..Default::default()
        };
        let target = OccurrenceRef::new(OccurrenceSource::WashHistory, 0);
        complete_occurrence(&mut l, target, details, &BusinessCalendar::default(), now).unwrap();

        let wash = l.one_time_wash.as_ref().unwrap();
        assert_eq!(wash.status, OneTimeWashStatus::Completed);
        assert_eq!(wash.washer, Some(washer));
        assert!(wash.paid);
        assert_eq!(l.wash_history.len(), 1);
    }

    #[test]
    fn cannot_start_completed_wash() {
        let mut l = lead("Ravi");
        let mut entry = WashHistoryEntry::pending("Basic", Decimal::from(100), ts(2026, 10, 8, 10));
        entry.wash_status = WashStatus::Completed;
        l.wash_history = vec![entry];
        assert!(start_wash(&mut l, 0, ts(2026, 10, 8, 10)).is_err());
    }
}
