// src/scheduling/status.rs

use uuid::Uuid;

use super::{DisplayStatus, Occurrence, RawStatus, ResolvedOccurrence};
use crate::models::lead::Lead;

/// Lavador próprio da ocorrência, senão o lavador padrão do cliente.
pub fn resolve_washer(own: Option<Uuid>, fallback: Option<Uuid>) -> Option<Uuid> {
    own.or(fallback)
}

// Cancelada, perdida e não realizada não têm status próprio na agenda
pub fn display_status(raw: RawStatus, washer: Option<Uuid>) -> DisplayStatus {
    if raw.is_completed() {
        DisplayStatus::Completed
    } else if washer.is_some() {
        DisplayStatus::Assigned
    } else {
        DisplayStatus::Pending
    }
}

pub fn resolve(occurrence: Occurrence, lead: &Lead) -> ResolvedOccurrence {
    let washer = resolve_washer(occurrence.washer, lead.assigned_washer);
    let status = display_status(occurrence.raw_status, washer);
    ResolvedOccurrence {
        occurrence,
        washer,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::{ScheduledWashStatus, WashStatus};

    #[test]
    fn completed_wins_over_washer() {
        let w = Some(Uuid::new_v4());
        assert_eq!(
            display_status(RawStatus::History(WashStatus::Completed), w),
            DisplayStatus::Completed
        );
        assert_eq!(
            display_status(RawStatus::Scheduled(ScheduledWashStatus::Completed), None),
            DisplayStatus::Completed
        );
    }

    #[test]
    fn non_completed_depends_on_washer() {
        let w = Some(Uuid::new_v4());
        for raw in [
            RawStatus::History(WashStatus::Pending),
            RawStatus::History(WashStatus::NotCompleted),
            RawStatus::History(WashStatus::Cancelled),
            RawStatus::Scheduled(ScheduledWashStatus::Missed),
        ] {
            assert_eq!(display_status(raw, w), DisplayStatus::Assigned);
            assert_eq!(display_status(raw, None), DisplayStatus::Pending);
        }
    }

    #[test]
    fn own_washer_beats_lead_washer() {
        let own = Uuid::new_v4();
        let fallback = Uuid::new_v4();
        assert_eq!(resolve_washer(Some(own), Some(fallback)), Some(own));
        assert_eq!(resolve_washer(None, Some(fallback)), Some(fallback));
        assert_eq!(resolve_washer(None, None), None);
    }
}
