// src/models/lead.rs

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::scheduling::{OccurrenceSource, ScheduleError};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_type")]
pub enum LeadType {
    #[serde(rename = "One-time")]
    #[sqlx(rename = "One-time")]
    OneTime,
    Monthly,
}

impl LeadType {
    pub fn label(&self) -> &'static str {
        match self {
            LeadType::OneTime => "One-time",
            LeadType::Monthly => "Monthly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_source")]
pub enum LeadSource {
    Pamphlet,
    WhatsApp,
    Referral,
    #[serde(rename = "Walk-in")]
    #[sqlx(rename = "Walk-in")]
    WalkIn,
    Other,
    #[serde(rename = "Social Media")]
    #[sqlx(rename = "Social Media")]
    SocialMedia,
    Website,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status")]
pub enum LeadStatus {
    New,
    Converted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ServiceType {
    Interior,
    #[default]
    Exterior,
}

/// Status da lavagem avulsa.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OneTimeWashStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl OneTimeWashStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn transition_to(&mut self, next: Self) -> Result<(), ScheduleError> {
        if self.is_terminal() || next == Self::Pending {
            return Err(ScheduleError::invalid_transition("oneTimeWash", self.as_str(), next.as_str()));
        }
        *self = next;
        Ok(())
    }
}

/// Status de uma lavagem agendada da assinatura mensal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScheduledWashStatus {
    #[default]
    Scheduled,
    Completed,
    Missed,
    Cancelled,
}

impl ScheduledWashStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    // scheduled -> completed | missed | cancelled ; missed -> completed
    pub fn can_become(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Scheduled, Self::Completed | Self::Missed | Self::Cancelled) => true,
            (Self::Missed, Self::Completed) => true,
            _ => false,
        }
    }

    pub fn transition_to(&mut self, next: Self) -> Result<(), ScheduleError> {
        if !self.can_become(next) {
            return Err(ScheduleError::invalid_transition("scheduledWash", self.as_str(), next.as_str()));
        }
        *self = next;
        Ok(())
    }
}

/// Status de uma entrada do histórico de lavagens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum WashStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "notcompleted")]
    NotCompleted,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl WashStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::NotCompleted => "notcompleted",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn can_become(&self, next: Self) -> bool {
        use WashStatus::*;
        match (self, next) {
            (Pending, InProgress | Completed | NotCompleted | Cancelled) => true,
            (InProgress, Completed | NotCompleted | Cancelled) => true,
            // Lavagem não realizada volta para a fila
            (NotCompleted, Pending) => true,
            _ => false,
        }
    }

    pub fn transition_to(&mut self, next: Self) -> Result<(), ScheduleError> {
        if !self.can_become(next) {
            return Err(ScheduleError::invalid_transition("washHistory", self.as_str(), next.as_str()));
        }
        *self = next;
        Ok(())
    }
}

// --- DATAS DENTRO DO JSONB ---

/// Lê uma data guardada no JSONB. Valores ilegíveis viram `None`
/// (a entrada continua no documento, só não gera ocorrência).
pub fn parse_stored_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_stored_datetime))
}

fn default_wash_time() -> String {
    "10:00".to_string()
}

fn default_true() -> bool {
    true
}

// --- SUB-DOCUMENTOS ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OneTimeWash {
    #[schema(example = "Premium")]
    pub wash_type: Option<String>,
    #[serde(default)]
    #[schema(example = "150.00")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub scheduled_date: Option<DateTime<Utc>>,
    pub washer: Option<Uuid>,
    #[serde(default)]
    pub status: OneTimeWashStatus,
    #[serde(default)]
    pub service_type: ServiceType,
    /// Minutos
    pub duration: Option<i64>,
    #[serde(default)]
    pub paid: bool,
    pub feedback: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledWash {
    #[schema(example = 1)]
    pub wash_number: u32,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default = "default_wash_time")]
    #[schema(example = "10:00")]
    pub scheduled_time: String,
    #[serde(default)]
    pub status: ScheduledWashStatus,
    pub completed_date: Option<DateTime<Utc>>,
    pub washer: Option<Uuid>,
    pub feedback: Option<String>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub service_type: ServiceType,
    pub duration: Option<i64>,
}

impl ScheduledWash {
    /// Esqueleto de uma lavagem agendada (ainda sem lavador, valor ou pagamento).
    pub fn stub(wash_number: u32, scheduled_date: DateTime<Utc>) -> Self {
        Self {
            wash_number,
            scheduled_date: Some(scheduled_date),
            scheduled_time: default_wash_time(),
            status: ScheduledWashStatus::Scheduled,
            completed_date: None,
            washer: None,
            feedback: None,
            amount: Decimal::ZERO,
            paid: false,
            service_type: ServiceType::Exterior,
            duration: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySubscription {
    #[schema(example = "Premium")]
    pub package_type: String,
    #[serde(default)]
    pub custom_plan_name: String,
    pub total_washes: u32,
    #[serde(default)]
    pub total_interior_washes: u32,
    #[serde(default)]
    pub used_interior_washes: u32,
    #[serde(default)]
    pub completed_washes: u32,
    pub monthly_price: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub scheduled_washes: Vec<ScheduledWash>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl MonthlySubscription {
    /// Conta uma lavagem concluída sem ultrapassar o total contratado.
    /// Ao atingir o total a assinatura é encerrada.
    pub fn record_completion(&mut self) {
        if self.completed_washes < self.total_washes {
            self.completed_washes += 1;
        }
        if self.completed_washes >= self.total_washes {
            self.is_active = false;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WashHistoryEntry {
    #[schema(example = "Basic")]
    pub wash_type: String,
    pub washer: Option<Uuid>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub date: Option<DateTime<Utc>>,
    pub feedback: Option<String>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub wash_status: WashStatus,
    #[serde(default)]
    pub service_type: ServiceType,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
}

impl WashHistoryEntry {
    pub fn pending(wash_type: &str, amount: Decimal, date: DateTime<Utc>) -> Self {
        Self {
            wash_type: wash_type.to_string(),
            washer: None,
            amount,
            date: Some(date),
            feedback: None,
            paid: false,
            wash_status: WashStatus::Pending,
            service_type: ServiceType::Exterior,
            start_time: None,
            end_time: None,
            duration: None,
        }
    }
}

// --- LEAD (O registro do cliente) ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = 42)]
    pub lead_id: i64,
    pub lead_type: LeadType,
    pub lead_source: LeadSource,
    pub status: LeadStatus,

    #[schema(example = "Ravi Kumar")]
    pub customer_name: String,
    #[schema(example = "9876543210")]
    pub phone: String,
    #[schema(example = "Koramangala")]
    pub area: String,
    pub car_model: Option<String>,
    pub vehicle_number: Option<String>,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Lavador padrão: vale para toda ocorrência sem lavador próprio.
    pub assigned_washer: Option<Uuid>,

    pub one_time_wash: Option<OneTimeWash>,
    pub monthly_subscription: Option<MonthlySubscription>,
    pub wash_history: Vec<WashHistoryEntry>,

    #[serde(skip_serializing)]
    pub version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Nenhuma das três estruturas de lavagem tem conteúdo.
    pub fn has_no_wash_entries(&self) -> bool {
        self.one_time_wash.is_none()
            && self
                .monthly_subscription
                .as_ref()
                .is_none_or(|sub| sub.scheduled_washes.is_empty())
            && self.wash_history.is_empty()
    }
}

// Linha crua da tabela `leads` (JSONB ainda embrulhado)
#[derive(Debug, FromRow)]
pub struct LeadRow {
    pub id: Uuid,
    pub lead_id: i64,
    pub lead_type: LeadType,
    pub lead_source: LeadSource,
    pub status: LeadStatus,
    pub customer_name: String,
    pub phone: String,
    pub area: String,
    pub car_model: Option<String>,
    pub vehicle_number: Option<String>,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub assigned_washer: Option<Uuid>,
    pub one_time_wash: Option<Json<OneTimeWash>>,
    pub monthly_subscription: Option<Json<MonthlySubscription>>,
    pub wash_history: Json<Vec<WashHistoryEntry>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LeadRow> for Lead {
    fn from(row: LeadRow) -> Self {
        Self {
            id: row.id,
            lead_id: row.lead_id,
            lead_type: row.lead_type,
            lead_source: row.lead_source,
            status: row.status,
            customer_name: row.customer_name,
            phone: row.phone,
            area: row.area,
            car_model: row.car_model,
            vehicle_number: row.vehicle_number,
            notes: row.notes,
            latitude: row.latitude,
            longitude: row.longitude,
            assigned_washer: row.assigned_washer,
            one_time_wash: row.one_time_wash.map(|j| j.0),
            monthly_subscription: row.monthly_subscription.map(|j| j.0),
            wash_history: row.wash_history.0,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// --- PAYLOADS ---

// POST /api/leads/{leadId}/monthly-subscription
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionPayload {
    /// Basic, Premium, Deluxe ou Custom
    #[schema(example = "Premium")]
    pub package_type: Option<String>,
    #[validate(length(max = 80, message = "plan_name_too_long"))]
    pub custom_plan_name: Option<String>,
    #[validate(range(min = 1, max = 31, message = "invalid_total_washes"))]
    pub total_washes: Option<u32>,
    pub total_interior_washes: Option<u32>,
    pub monthly_price: Option<Decimal>,
    /// RFC 3339 ou YYYY-MM-DD; padrão: agora
    pub start_date: Option<String>,
    /// Sem datas, a agenda é gerada automaticamente
    pub scheduled_dates: Option<Vec<String>>,
    #[serde(default)]
    pub paid: bool,
    /// `userId` público do lavador
    #[schema(example = 7)]
    pub washer_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OneTimeWashInput {
    #[schema(example = "Premium")]
    pub wash_type: Option<String>,
    pub amount: Option<Decimal>,
    /// RFC 3339 ou YYYY-MM-DD; sem data vale a criação do registro
    pub scheduled_date: Option<String>,
    pub washer_id: Option<i64>,
    #[serde(default)]
    pub service_type: ServiceType,
}

// POST /api/leads
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Ravi Kumar")]
    pub customer_name: String,
    #[validate(length(min = 6, max = 20, message = "invalid_phone"))]
    #[schema(example = "9876543210")]
    pub phone: String,
    #[validate(length(min = 1, message = "required"))]
    pub area: String,
    pub lead_type: LeadType,
    pub lead_source: LeadSource,
    pub car_model: Option<String>,
    pub vehicle_number: Option<String>,
    pub notes: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "invalid_latitude"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "invalid_longitude"))]
    pub longitude: Option<f64>,
    /// Lavador padrão (`userId` público)
    pub assigned_washer_id: Option<i64>,
    #[validate(nested)]
    pub one_time_wash: Option<OneTimeWashInput>,
    #[validate(nested)]
    pub monthly_subscription: Option<CreateSubscriptionPayload>,
}

// PUT /api/leads/{leadId}
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    pub customer_name: Option<String>,
    #[validate(length(min = 6, max = 20, message = "invalid_phone"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub area: Option<String>,
    pub car_model: Option<String>,
    pub vehicle_number: Option<String>,
    pub notes: Option<String>,
    pub lead_source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    #[validate(range(min = -90.0, max = 90.0, message = "invalid_latitude"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "invalid_longitude"))]
    pub longitude: Option<f64>,
}

// POST /api/leads/{leadId}/wash-history
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogWashPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Basic")]
    pub wash_type: String,
    pub washer_id: Option<i64>,
    pub amount: Option<Decimal>,
    /// Padrão: agora
    pub date: Option<String>,
    pub feedback: Option<String>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub service_type: ServiceType,
}

// PUT /api/leads/{leadId}/complete
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteWashPayload {
    pub source: OccurrenceSource,
    #[serde(default)]
    pub index: usize,
    pub washer_id: Option<i64>,
    pub paid: Option<bool>,
    #[validate(length(max = 1000, message = "feedback_too_long"))]
    pub feedback: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Minutos
    #[validate(range(min = 0, message = "invalid_duration"))]
    pub duration: Option<i64>,
}

// PUT /api/leads/{leadId}/reschedule
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReschedulePayload {
    pub source: OccurrenceSource,
    #[serde(default)]
    pub index: usize,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "2026-10-20")]
    pub new_date: String,
    pub wash_type: Option<String>,
}

/// Entrada do histórico com a posição original (usada nas rotas de escrita).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndexedWashHistoryEntry {
    pub index: usize,
    #[serde(flatten)]
    pub entry: WashHistoryEntry,
}

/// Mais recentes primeiro; entradas sem data vão para o fim.
pub fn history_newest_first(history: &[WashHistoryEntry]) -> Vec<IndexedWashHistoryEntry> {
    let mut out: Vec<IndexedWashHistoryEntry> = history
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, entry)| IndexedWashHistoryEntry { index, entry })
        .collect();
    out.sort_by(|a, b| b.entry.date.cmp(&a.entry.date));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_history_date_becomes_none() {
        let json = r#"{
            "washType": "Basic",
            "amount": 100,
            "date": "not-a-date",
            "washStatus": "pending"
        }"#;

        let entry: WashHistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.date, None);
        assert_eq!(entry.wash_status, WashStatus::Pending);
    }

    #[test]
    fn history_status_uses_dashed_names() {
        let json = r#"{ "washType": "Basic", "date": "2026-03-01T10:00:00Z", "washStatus": "in-progress" }"#;
        let entry: WashHistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.wash_status, WashStatus::InProgress);
        assert!(entry.date.is_some());
    }

    #[test]
    fn scheduled_wash_transitions() {
        let mut status = ScheduledWashStatus::Scheduled;
        assert!(status.transition_to(ScheduledWashStatus::Missed).is_ok());
        assert!(status.transition_to(ScheduledWashStatus::Completed).is_ok());
        assert!(status.transition_to(ScheduledWashStatus::Completed).is_err());
        assert_eq!(status, ScheduledWashStatus::Completed);
    }

    #[test]
    fn history_transitions_reject_reopening_completed() {
        let mut status = WashStatus::Completed;
        assert!(status.transition_to(WashStatus::Pending).is_err());

        let mut status = WashStatus::NotCompleted;
        assert!(status.transition_to(WashStatus::Pending).is_ok());
    }

    #[test]
    fn subscription_completion_is_capped() {
        let mut sub = MonthlySubscription {
            package_type: "Basic".into(),
            custom_plan_name: String::new(),
            total_washes: 2,
            total_interior_washes: 0,
            used_interior_washes: 0,
            completed_washes: 1,
            monthly_price: Decimal::from(300),
            start_date: Utc::now(),
            end_date: Utc::now(),
            scheduled_washes: Vec::new(),
            is_active: true,
        };

        sub.record_completion();
        sub.record_completion();

        assert_eq!(sub.completed_washes, 2);
        assert!(!sub.is_active);
    }

    #[test]
    fn history_is_listed_newest_first_with_original_index() {
        let day = |d: u32| DateTime::parse_from_rfc3339(&format!("2026-10-{d:02}T10:00:00Z")).unwrap().with_timezone(&Utc);
        let mut undated = WashHistoryEntry::pending("Basic", Decimal::from(100), day(1));
        undated.date = None;
        let history = vec![
            WashHistoryEntry::pending("Basic", Decimal::from(100), day(3)),
            undated,
            WashHistoryEntry::pending("Basic", Decimal::from(100), day(9)),
        ];

        let listed = history_newest_first(&history);
        let indexes: Vec<usize> = listed.iter().map(|e| e.index).collect();
        assert_eq!(indexes, vec![2, 0, 1]);
    }
}
