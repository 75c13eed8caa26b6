// src/models/schedule.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::lead::{Lead, LeadType};
use crate::models::washer::WasherRef;
use crate::scheduling::{
    auto_assign::AssignmentOutcome, DateWindow, DisplayStatus, OccurrenceSource, ResolvedOccurrence,
};

// GET /api/schedule/washes
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ScheduleQuery {
    /// RFC 3339 ou YYYY-MM-DD
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// `userId` público do lavador
    pub washer_id: Option<i64>,
}

// POST /api/schedule/assign
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignWasherPayload {
    /// `leadId` público do cliente
    #[validate(range(min = 1, message = "invalid_customer_id"))]
    #[schema(example = 42)]
    pub customer_id: i64,
    #[validate(range(min = 1, message = "invalid_washer_id"))]
    #[schema(example = 7)]
    pub washer_id: i64,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "2026-10-16")]
    pub target_date: String,
    #[schema(example = "Premium")]
    pub wash_type: Option<String>,
}

/// Uma linha da agenda consolidada.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledWashView {
    /// `<origem>_<id do cliente>_<índice>`
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub area: String,
    pub car_model: Option<String>,
    pub wash_type: String,
    pub scheduled_date: DateTime<Utc>,
    pub washer: Option<WasherRef>,
    pub lead_id: i64,
    pub lead_type: LeadType,
    pub status: DisplayStatus,
    pub source: OccurrenceSource,
    pub index: usize,
}

impl ScheduledWashView {
    pub fn new(lead: &Lead, item: &ResolvedOccurrence, washer: Option<WasherRef>) -> Self {
        let occurrence = &item.occurrence;
        Self {
            id: occurrence.reference().public_id(lead.id),
            customer_name: lead.customer_name.clone(),
            phone: lead.phone.clone(),
            area: lead.area.clone(),
            car_model: lead.car_model.clone(),
            wash_type: occurrence.wash_type.clone(),
            scheduled_date: occurrence.date,
            washer,
            lead_id: lead.lead_id,
            lead_type: lead.lead_type,
            status: item.status,
            source: occurrence.source,
            index: occurrence.sequence_index,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub data: Vec<ScheduledWashView>,
    pub count: usize,
    pub date_range: DateWindow,
}

/// Atribuição, registro ou reagendamento: os flags do resultado e a
/// entrada como ficou na agenda depois de gravada.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    #[serde(flatten)]
    pub outcome: AssignmentOutcome,
    pub wash: Option<ScheduledWashView>,
}
