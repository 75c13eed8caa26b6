// src/scheduling/priority.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use super::{BusinessCalendar, ResolvedOccurrence};

/// Colapsa ocorrências do mesmo cliente no mesmo dia (local), mantendo a
/// de maior prioridade de origem; em empate fica a primeira vista.
/// O resultado sai ordenado por data e, na mesma data, por status.
pub fn dedupe_and_sort(items: Vec<ResolvedOccurrence>, calendar: &BusinessCalendar) -> Vec<ResolvedOccurrence> {
    let mut slots: HashMap<(Uuid, NaiveDate), usize> = HashMap::new();
    let mut kept: Vec<ResolvedOccurrence> = Vec::with_capacity(items.len());

    for item in items {
        let key = (item.occurrence.lead, calendar.day_of(item.occurrence.date));
        match slots.get(&key) {
            Some(&slot) => {
                if item.occurrence.source.priority() > kept[slot].occurrence.source.priority() {
                    kept[slot] = item;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(item);
            }
        }
    }

    // sort_by é estável
    kept.sort_by(|a, b| {
        a.occurrence
            .date
            .cmp(&b.occurrence.date)
            .then(a.status.cmp(&b.status))
    });
    kept
}
