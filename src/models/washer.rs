// src/models/washer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::{User, UserStatus};
use crate::scheduling::BusinessCalendar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    #[default]
    Incomplete,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub date: DateTime<Utc>,
    pub time_in: Option<DateTime<Utc>>,
    pub time_out: Option<DateTime<Utc>>,
    /// Horas trabalhadas (2 casas)
    pub duration: Option<Decimal>,
    #[serde(default)]
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceKind {
    In,
    Out,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttendanceError {
    #[error("Time-in already marked for today")]
    AlreadyClockedIn,
    #[error("Must mark time-in before marking time-out")]
    NotClockedIn,
    #[error("Time-out already marked for today")]
    AlreadyClockedOut,
}

/// Registra entrada/saída do dia corrente (no fuso do negócio).
pub fn mark_attendance(
    records: &mut Vec<Attendance>,
    kind: AttendanceKind,
    calendar: &BusinessCalendar,
    now: DateTime<Utc>,
) -> Result<Attendance, AttendanceError> {
    let today = calendar.today(now);
    let existing = records
        .iter_mut()
        .find(|a| calendar.day_of(a.date) == today);

    match (kind, existing) {
        (AttendanceKind::In, Some(record)) => {
            if record.time_in.is_some() {
                return Err(AttendanceError::AlreadyClockedIn);
            }
            record.time_in = Some(now);
            record.status = AttendanceStatus::Incomplete;
            Ok(record.clone())
        }
        (AttendanceKind::In, None) => {
            let record = Attendance {
                date: now,
                time_in: Some(now),
                time_out: None,
                duration: None,
                status: AttendanceStatus::Incomplete,
            };
            records.push(record.clone());
            Ok(record)
        }
        (AttendanceKind::Out, Some(record)) => {
            let Some(time_in) = record.time_in else {
                return Err(AttendanceError::NotClockedIn);
            };
            if record.time_out.is_some() {
                return Err(AttendanceError::AlreadyClockedOut);
            }
            let hours = Decimal::from((now - time_in).num_seconds()) / Decimal::from(3600);
            record.time_out = Some(now);
            record.duration = Some(hours.round_dp(2));
            record.status = AttendanceStatus::Present;
            Ok(record.clone())
        }
        (AttendanceKind::Out, None) => Err(AttendanceError::NotClockedIn),
    }
}

// Referência enxuta ao lavador, usada nas visões de agenda
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WasherRef {
    pub id: Uuid,
    #[schema(example = 7)]
    pub user_id: i64,
    #[schema(example = "Suresh")]
    pub name: String,
}

impl From<&User> for WasherRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            user_id: user.user_id,
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WasherSummary {
    pub id: Uuid,
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub area: Option<String>,
    pub status: UserStatus,
    pub present_today: bool,
}

impl WasherSummary {
    pub fn new(user: &User, calendar: &BusinessCalendar, now: DateTime<Utc>) -> Self {
        let today = calendar.today(now);
        let present_today = user
            .attendance
            .iter()
            .any(|a| calendar.day_of(a.date) == today && a.time_in.is_some());
        Self {
            id: user.id,
            user_id: user.user_id,
            name: user.name.clone(),
            phone: user.phone.clone(),
            area: user.area.clone(),
            status: user.status,
            present_today,
        }
    }
}

// POST /api/washers
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWasherPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Suresh")]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 6, max = 20, message = "invalid_phone"))]
    pub phone: String,
    pub area: Option<String>,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
    pub base_salary: Option<Decimal>,
}

// PUT /api/washers/{userId}; campos ausentes ficam como estão
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWasherPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 20, message = "invalid_phone"))]
    pub phone: Option<String>,
    pub area: Option<String>,
}

// POST /api/washers/{userId}/status
#[derive(Debug, Deserialize, ToSchema)]
pub struct WasherStatusPayload {
    pub status: UserStatus,
}

// POST /api/washers/{userId}/salary
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryPayload {
    #[schema(example = 18000.0)]
    pub base_salary: Decimal,
    /// RFC 3339 ou YYYY-MM-DD; ausente = agora
    #[schema(example = "2026-11-01")]
    pub effective_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryInfo {
    pub base_salary: Decimal,
    pub effective_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for SalaryInfo {
    fn from(user: &User) -> Self {
        Self {
            base_salary: user.base_salary,
            effective_date: user.salary_effective_date,
            updated_at: user.updated_at,
        }
    }
}

// POST /api/washers/{userId}/attendance
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendancePayload {
    #[serde(rename = "type")]
    pub kind: AttendanceKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, h, m, 0).unwrap()
    }

    #[test]
    fn clock_in_then_out_computes_hours() {
        let calendar = BusinessCalendar::default();
        let mut records = Vec::new();

        mark_attendance(&mut records, AttendanceKind::In, &calendar, at(8, 0)).unwrap();
        let out = mark_attendance(&mut records, AttendanceKind::Out, &calendar, at(16, 45)).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(out.status, AttendanceStatus::Present);
        assert_eq!(out.duration, Some(Decimal::new(875, 2)));
    }

    #[test]
    fn double_clock_in_is_rejected() {
        let calendar = BusinessCalendar::default();
        let mut records = Vec::new();

        mark_attendance(&mut records, AttendanceKind::In, &calendar, at(8, 0)).unwrap();
        let err = mark_attendance(&mut records, AttendanceKind::In, &calendar, at(9, 0)).unwrap_err();
        assert_eq!(err, AttendanceError::AlreadyClockedIn);
    }

    #[test]
    fn clock_out_without_clock_in_is_rejected() {
        let calendar = BusinessCalendar::default();
        let mut records = Vec::new();

        let err = mark_attendance(&mut records, AttendanceKind::Out, &calendar, at(17, 0)).unwrap_err();
        assert_eq!(err, AttendanceError::NotClockedIn);
    }

    #[test]
    fn clock_in_before_local_midnight_belongs_to_previous_day() {
        // 20:00 UTC de 14/10 já é 15/10 01:30 em +05:30
        let calendar = BusinessCalendar::parse_offset("+05:30").unwrap();
        let mut records = Vec::new();
        let late = Utc.with_ymd_and_hms(2026, 10, 14, 20, 0, 0).unwrap();

        mark_attendance(&mut records, AttendanceKind::In, &calendar, late).unwrap();
        let err = mark_attendance(&mut records, AttendanceKind::In, &calendar, at(6, 0)).unwrap_err();
        assert_eq!(err, AttendanceError::AlreadyClockedIn);
    }
}
