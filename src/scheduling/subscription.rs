// src/scheduling/subscription.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auto_assign::apply_policy;
use super::generator::{generate_scheduled_washes, SUBSCRIPTION_PERIOD_DAYS};
use super::{BusinessCalendar, OccurrenceRef, OccurrenceSource, ScheduleError};
use crate::models::lead::{
    CreateSubscriptionPayload, IndexedWashHistoryEntry, Lead, LeadStatus, LeadType, MonthlySubscription,
    ScheduledWash, WashHistoryEntry,
};

/// Plano efetivo depois de aplicar presets e sobrescritas.
#[derive(Debug, Clone, PartialEq)]
pub struct PackagePlan {
    pub package_type: String,
    pub custom_plan_name: String,
    pub total_washes: u32,
    pub total_interior_washes: u32,
    pub monthly_price: Decimal,
}

// (nome, lavagens, preço, internas)
const PRESETS: [(&str, u32, i64, u32); 3] = [
    ("Basic", 3, 300, 1),
    ("Premium", 4, 400, 2),
    ("Deluxe", 5, 500, 3),
];

/// Valor padrão de uma lavagem avulsa do pacote, usado quando a lavagem
/// agendada foi gravada sem valor.
pub fn package_wash_price(package_type: &str) -> Decimal {
    match package_type {
        "Premium" => Decimal::from(125),
        "Deluxe" => Decimal::from(150),
        _ => Decimal::from(100),
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

pub fn resolve_plan(payload: &CreateSubscriptionPayload) -> Result<PackagePlan, ScheduleError> {
    let package = non_empty(payload.package_type.as_ref());
    let custom_name = non_empty(payload.custom_plan_name.as_ref());

    let preset = package.and_then(|p| {
        PRESETS
            .iter()
            .find(|(name, ..)| name.eq_ignore_ascii_case(p))
    });

    let plan = match preset {
        Some(&(name, washes, price, interior)) => PackagePlan {
            package_type: name.to_string(),
            custom_plan_name: custom_name.unwrap_or(name).to_string(),
            total_washes: payload.total_washes.unwrap_or(washes),
            total_interior_washes: payload.total_interior_washes.unwrap_or(interior),
            monthly_price: payload.monthly_price.unwrap_or_else(|| Decimal::from(price)),
        },
        None => {
            // "Custom" é só um marcador: o nome real vem em customPlanName
            let name = match package {
                Some(p) if !p.eq_ignore_ascii_case("custom") => p,
                _ => custom_name.ok_or_else(|| {
                    ScheduleError::InvalidSubscription("packageType or customPlanName is required".into())
                })?,
            };
            let (Some(total_washes), Some(monthly_price)) = (payload.total_washes, payload.monthly_price) else {
                return Err(ScheduleError::InvalidSubscription(
                    "custom plans require totalWashes and monthlyPrice".into(),
                ));
            };
            PackagePlan {
                package_type: name.to_string(),
                custom_plan_name: custom_name.unwrap_or(name).to_string(),
                total_washes,
                total_interior_washes: payload.total_interior_washes.unwrap_or(0),
                monthly_price,
            }
        }
    };

    if plan.total_washes == 0 {
        return Err(ScheduleError::InvalidSubscription("totalWashes must be at least 1".into()));
    }
    if plan.monthly_price.is_sign_negative() {
        return Err(ScheduleError::InvalidSubscription("monthlyPrice cannot be negative".into()));
    }
    if plan.total_interior_washes > plan.total_washes {
        return Err(ScheduleError::InvalidSubscription(
            "totalInteriorWashes cannot exceed totalWashes".into(),
        ));
    }
    Ok(plan)
}

/// Assinatura criada e as entradas do histórico que a espelham.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOutcome {
    pub subscription: MonthlySubscription,
    pub mirrored_history: Vec<IndexedWashHistoryEntry>,
    pub amount_per_wash: Decimal,
    pub auto_assigned: bool,
    pub washer_resolved: bool,
}

/// Cria a assinatura mensal no registro, gera (ou recebe) as datas,
/// espelha cada lavagem no histórico e aplica a auto-atribuição.
pub fn attach_subscription(
    lead: &mut Lead,
    payload: &CreateSubscriptionPayload,
    washer: Option<Uuid>,
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> Result<SubscriptionOutcome, ScheduleError> {
    if lead.monthly_subscription.as_ref().is_some_and(|s| s.is_active) {
        return Err(ScheduleError::SubscriptionAlreadyActive);
    }
    let plan = resolve_plan(payload)?;

    let start = match non_empty(payload.start_date.as_ref()) {
        Some(raw) => calendar.parse_instant(raw)?,
        None => now,
    };
    let end = start
        .checked_add_signed(Duration::days(SUBSCRIPTION_PERIOD_DAYS))
        .ok_or_else(|| ScheduleError::InvalidSubscription("startDate is out of range".into()))?;

    let mut washes = match payload.scheduled_dates.as_deref() {
        Some(dates) if !dates.is_empty() => {
            if dates.len() > plan.total_washes as usize {
                return Err(ScheduleError::InvalidSubscription(format!(
                    "{} dates given for a {}-wash plan",
                    dates.len(),
                    plan.total_washes
                )));
            }
            dates
                .iter()
                .zip(1..)
                .map(|(raw, number)| -> Result<ScheduledWash, ScheduleError> {
                    Ok(ScheduledWash::stub(number, calendar.parse_instant(raw)?))
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        _ => generate_scheduled_washes(start, plan.total_washes),
    };

    let amount_per_wash = (plan.monthly_price / Decimal::from(plan.total_washes))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    for wash in &mut washes {
        wash.amount = amount_per_wash;
        wash.paid = payload.paid;
    }

    let mirror_start = lead.wash_history.len();
    for wash in &washes {
        let date = wash.scheduled_date.unwrap_or(start);
        let mut entry = WashHistoryEntry::pending(&plan.package_type, amount_per_wash, date);
        entry.paid = payload.paid;
        lead.wash_history.push(entry);
    }

    let wash_count = washes.len();
    lead.monthly_subscription = Some(MonthlySubscription {
        package_type: plan.package_type,
        custom_plan_name: plan.custom_plan_name,
        total_washes: plan.total_washes,
        total_interior_washes: plan.total_interior_washes,
        used_interior_washes: 0,
        completed_washes: 0,
        monthly_price: plan.monthly_price,
        start_date: start,
        end_date: end,
        scheduled_washes: washes,
        is_active: true,
    });
    lead.lead_type = LeadType::Monthly;
    lead.status = LeadStatus::Converted;

    let mut auto_assigned = false;
    for index in 0..wash_count {
        let target = OccurrenceRef::new(OccurrenceSource::MonthlySubscription, index);
        if apply_policy(lead, target, washer, calendar, now)? {
            auto_assigned = true;
            if let Some(mirror) = lead.wash_history.get_mut(mirror_start + index) {
                mirror.washer = washer;
            }
        }
    }

    let mirrored_history = lead.wash_history[mirror_start..]
        .iter()
        .cloned()
        .zip(mirror_start..)
        .map(|(entry, index)| IndexedWashHistoryEntry { index, entry })
        .collect();
    let subscription = lead
        .monthly_subscription
        .clone()
        .ok_or(ScheduleError::OccurrenceNotFound(OccurrenceSource::MonthlySubscription, 0))?;

    Ok(SubscriptionOutcome {
        subscription,
        mirrored_history,
        amount_per_wash,
        auto_assigned,
        washer_resolved: washer.is_some(),
    })
}
