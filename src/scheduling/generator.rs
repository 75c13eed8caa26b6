// src/scheduling/generator.rs

use chrono::{DateTime, Duration, Utc};

use crate::models::lead::ScheduledWash;

/// Período coberto por uma assinatura mensal.
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

/// Distribui `total_washes` lavagens em intervalos iguais dentro de 30 dias
/// a partir de `start`.
///
/// Não é idempotente: anexar o resultado duas vezes na mesma assinatura
/// duplica as lavagens. Só roda na criação da assinatura.
pub fn generate_scheduled_washes(start: DateTime<Utc>, total_washes: u32) -> Vec<ScheduledWash> {
    if total_washes == 0 {
        return Vec::new();
    }

    let Some(period_end) = start.checked_add_signed(Duration::days(SUBSCRIPTION_PERIOD_DAYS)) else {
        return Vec::new();
    };
    let interval = Duration::days(SUBSCRIPTION_PERIOD_DAYS / i64::from(total_washes));

    let mut washes = Vec::with_capacity(total_washes as usize);
    let mut date = start;
    let mut wash_number = 1;
    while wash_number <= total_washes && date <= period_end {
        washes.push(ScheduledWash::stub(wash_number, date));
        wash_number += 1;
        match date.checked_add_signed(interval) {
            Some(next) => date = next,
            None => break,
        }
    }
    washes
}
