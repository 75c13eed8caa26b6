//! Núcleo de agendamento das lavagens.
//!
//! Tudo aqui é puro: recebe o registro do cliente (e um `now` explícito),
//! devolve ocorrências ou altera o registro em memória. Persistência fica
//! com os serviços.

pub mod auto_assign;
pub mod calendar;
pub mod completion;
pub mod error;
pub mod generator;
pub mod normalizer;
pub mod occurrence;
pub mod pipeline;
pub mod priority;
pub mod status;
pub mod subscription;
pub mod window;

pub use calendar::BusinessCalendar;
pub use error::ScheduleError;
pub use occurrence::{DisplayStatus, Occurrence, OccurrenceRef, OccurrenceSource, RawStatus, ResolvedOccurrence};
pub use window::DateWindow;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    use crate::models::lead::{Lead, LeadSource, LeadStatus, LeadType};

    pub fn ts(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    /// Lead vazio criado em 2026-10-01 09:00 UTC.
    pub fn lead(name: &str) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            lead_id: 1,
            lead_type: LeadType::OneTime,
            lead_source: LeadSource::WhatsApp,
            status: LeadStatus::New,
            customer_name: name.to_string(),
            phone: "9999999999".to_string(),
            area: "Indiranagar".to_string(),
            car_model: Some("Swift".to_string()),
            vehicle_number: None,
            notes: None,
            latitude: None,
            longitude: None,
            assigned_washer: None,
            one_time_wash: None,
            monthly_subscription: None,
            wash_history: Vec::new(),
            version: 0,
            created_at: ts(2026, 10, 1, 9),
            updated_at: ts(2026, 10, 1, 9),
        }
    }
}
