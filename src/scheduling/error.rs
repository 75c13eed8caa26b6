// src/scheduling/error.rs

use thiserror::Error;

use super::OccurrenceSource;

/// Erros do núcleo de agendamento. Todos são de validação ou de
/// referência inexistente; a tradução para HTTP fica no `AppError`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Start date and end date are required")]
    DatesRequired,

    #[error("Invalid date format provided: '{0}'")]
    UnparseableDate(String),

    #[error("Start date cannot be after end date")]
    InvertedWindow,

    #[error("Invalid business UTC offset: '{0}'")]
    InvalidOffset(String),

    #[error("Cannot move {entry} from '{from}' to '{to}'")]
    InvalidTransition {
        entry: &'static str,
        from: String,
        to: String,
    },

    #[error("No {0} entry at index {1}")]
    OccurrenceNotFound(OccurrenceSource, usize),

    #[error("Occurrences from source '{0}' cannot be modified")]
    ReadOnlySource(OccurrenceSource),

    #[error("End time cannot be before start time")]
    InvertedTimeRange,

    #[error("Lead already has an active monthly subscription")]
    SubscriptionAlreadyActive,

    #[error("Invalid subscription: {0}")]
    InvalidSubscription(String),
}

impl ScheduleError {
    pub fn invalid_transition(entry: &'static str, from: &str, to: &str) -> Self {
        ScheduleError::InvalidTransition {
            entry,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Código estável para o frontend
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::DatesRequired => "MISSING_DATES",
            ScheduleError::UnparseableDate(_) => "INVALID_DATE",
            ScheduleError::InvertedWindow => "INVALID_DATE_RANGE",
            ScheduleError::InvalidOffset(_) => "INVALID_OFFSET",
            ScheduleError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ScheduleError::OccurrenceNotFound(..) => "OCCURRENCE_NOT_FOUND",
            ScheduleError::ReadOnlySource(_) => "READ_ONLY_SOURCE",
            ScheduleError::InvertedTimeRange => "INVALID_TIME_RANGE",
            ScheduleError::SubscriptionAlreadyActive => "SUBSCRIPTION_ACTIVE",
            ScheduleError::InvalidSubscription(_) => "INVALID_SUBSCRIPTION",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ScheduleError::OccurrenceNotFound(..))
    }
}
