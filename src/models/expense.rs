// src/models/expense.rs

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::User;
use crate::models::washer::AttendanceStatus;
use crate::scheduling::BusinessCalendar;

// =============================================================================
//  ÁREA 1: DESPESAS
// =============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    #[schema(example = "Suresh")]
    pub washer_name: String,
    #[schema(example = 250.0)]
    pub amount: Decimal,
    #[schema(example = "Adiantamento")]
    pub reason: String,
    pub date: DateTime<Utc>,
    #[schema(example = "Admin")]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpenseError {
    #[error("Amount cannot be negative")]
    NegativeAmount,
    #[error("Invalid payroll period {month}/{year}")]
    InvalidPeriod { month: u32, year: i32 },
}

// POST /api/expenses e PUT /api/expenses/{id} (substitui tudo)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Suresh")]
    pub washer_name: String,
    #[schema(example = 250.0)]
    pub amount: Decimal,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Adiantamento")]
    pub reason: String,
    /// RFC 3339 ou YYYY-MM-DD; ausente = agora
    #[schema(example = "2026-10-15")]
    pub date: Option<String>,
}

// GET /api/expenses
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpenseQuery {
    /// Só filtra por data quando `startDate` e `endDate` vêm juntos
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Nome do lavador (parcial, sem diferenciar maiúsculas)
    pub name: Option<String>,
    pub reason: Option<String>,
}

// GET /api/expenses/washer/{userId}
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// 1-12; ausente = mês corrente
    pub month: Option<u32>,
    pub year: Option<i32>,
}

// GET /api/expenses/salary-calculation
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SalaryQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    /// `userId` público; ausente = todos os lavadores
    pub washer_id: Option<i64>,
}

// =============================================================================
//  ÁREA 2: FOLHA
// =============================================================================

/// Mês de folha no fuso do negócio: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayrollPeriod {
    pub month: u32,
    pub year: i32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: u32,
}

impl PayrollPeriod {
    pub fn resolve(
        month: Option<u32>,
        year: Option<i32>,
        calendar: &BusinessCalendar,
        now: DateTime<Utc>,
    ) -> Result<Self, ExpenseError> {
        let today = calendar.today(now);
        let month = month.unwrap_or(today.month());
        let year = year.unwrap_or(today.year());
        let invalid = ExpenseError::InvalidPeriod { month, year };

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(invalid.clone())?;
        let next = first.checked_add_months(Months::new(1)).ok_or(invalid.clone())?;
        let start = calendar.start_of_day(first).ok_or(invalid.clone())?;
        let end = calendar.start_of_day(next).ok_or(invalid)?;
        let days = u32::try_from((next - first).num_days()).unwrap_or_default();

        Ok(Self { month, year, start, end, days })
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start <= date && date < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBreakdown {
    pub washer_id: Uuid,
    #[schema(example = 7)]
    pub user_id: i64,
    #[schema(example = "Suresh")]
    pub washer_name: String,
    pub base_salary: Decimal,
    pub bonus: Decimal,
    pub wash_count: i64,
    pub present_days: u32,
    pub total_working_days: u32,
    /// Percentual com uma casa
    #[schema(example = 90.0)]
    pub attendance_percentage: Decimal,
    pub expenses: Decimal,
    pub loss_of_pay: Decimal,
    pub total_salary: Decimal,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryReport {
    pub month: u32,
    pub year: i32,
    pub salary_data: Vec<SalaryBreakdown>,
}

/// Todo dia do mês é dia útil; dia sem ponto completo desconta
/// `base / dias`. Despesas saem do que sobra e o total nunca fica negativo.
pub fn calculate_salary(
    washer: &User,
    period: &PayrollPeriod,
    wash_count: i64,
    expenses: Decimal,
) -> SalaryBreakdown {
    let present = washer
        .attendance
        .iter()
        .filter(|a| a.status == AttendanceStatus::Present && period.contains(a.date))
        .count();
    let present_days = u32::try_from(present).unwrap_or(u32::MAX).min(period.days);
    let absent_days = period.days - present_days;

    let (loss_of_pay, attendance_percentage) = if period.days == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let days = Decimal::from(period.days);
        let per_day = washer.base_salary / days;
        (
            (per_day * Decimal::from(absent_days)).round_dp(2),
            (Decimal::from(present_days) * Decimal::ONE_HUNDRED / days).round_dp(1),
        )
    };
    let total_salary = (washer.base_salary - loss_of_pay - expenses)
        .max(Decimal::ZERO)
        .round_dp(2);

    SalaryBreakdown {
        washer_id: washer.id,
        user_id: washer.user_id,
        washer_name: washer.name.clone(),
        base_salary: washer.base_salary,
        bonus: Decimal::ZERO,
        wash_count,
        present_days,
        total_working_days: period.days,
        attendance_percentage,
        expenses,
        loss_of_pay,
        total_salary,
        month: period.month,
        year: period.year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        auth::{UserRole, UserStatus},
        washer::Attendance,
    };
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 3, 0, 0).unwrap()
    }

    fn attendance(date: DateTime<Utc>, status: AttendanceStatus) -> Attendance {
        Attendance {
            date,
            time_in: Some(date),
            time_out: None,
            duration: None,
            status,
        }
    }

    fn washer(base_salary: Decimal, attendance: Vec<Attendance>) -> User {
        let now = day(2026, 10, 1);
        User {
            id: Uuid::new_v4(),
            user_id: 7,
            name: "Suresh".into(),
            email: "suresh@carwash.in".into(),
            phone: "9876500000".into(),
            role: UserRole::Washer,
            status: UserStatus::Active,
            area: None,
            password_hash: String::new(),
            base_salary,
            salary_effective_date: None,
            attendance,
            created_at: now,
            updated_at: now,
        }
    }

    fn november() -> PayrollPeriod {
        PayrollPeriod::resolve(Some(11), Some(2026), &BusinessCalendar::default(), day(2026, 10, 15)).unwrap()
    }

    #[test]
    fn period_defaults_to_current_business_month() {
        // 2026-10-31 20:00 UTC já é novembro em +05:30
        let calendar = BusinessCalendar::parse_offset("+05:30").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 31, 20, 0, 0).unwrap();

        let period = PayrollPeriod::resolve(None, None, &calendar, now).unwrap();

        assert_eq!((period.month, period.year, period.days), (11, 2026, 30));
        assert_eq!(period.start, Utc.with_ymd_and_hms(2026, 10, 31, 18, 30, 0).unwrap());
        assert_eq!(period.end, Utc.with_ymd_and_hms(2026, 11, 30, 18, 30, 0).unwrap());
    }

    #[test]
    fn december_rolls_into_next_year_and_leap_february_has_29_days() {
        let calendar = BusinessCalendar::default();
        let now = day(2026, 10, 15);

        let december = PayrollPeriod::resolve(Some(12), Some(2026), &calendar, now).unwrap();
        assert_eq!(december.end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
        assert!(!december.contains(december.end));

        let february = PayrollPeriod::resolve(Some(2), Some(2028), &calendar, now).unwrap();
        assert_eq!(february.days, 29);
    }

    #[test]
    fn invalid_month_is_rejected() {
        let err = PayrollPeriod::resolve(Some(13), Some(2026), &BusinessCalendar::default(), day(2026, 10, 15))
            .unwrap_err();
        assert_eq!(err, ExpenseError::InvalidPeriod { month: 13, year: 2026 });
    }

    #[test]
    fn absences_and_expenses_reduce_salary() {
        let period = november();
        // 27 dias presentes em 30
        let records = (1..=27)
            .map(|d| attendance(day(2026, 11, d), AttendanceStatus::Present))
            .collect();
        let washer = washer(Decimal::from(30000), records);

        let salary = calculate_salary(&washer, &period, 41, Decimal::from(500));

        assert_eq!(salary.present_days, 27);
        assert_eq!(salary.total_working_days, 30);
        assert_eq!(salary.loss_of_pay, Decimal::from(3000));
        assert_eq!(salary.total_salary, Decimal::from(26500));
        assert_eq!(salary.attendance_percentage, Decimal::new(900, 1));
        assert_eq!(salary.wash_count, 41);
        assert_eq!(salary.bonus, Decimal::ZERO);
    }

    #[test]
    fn only_complete_days_inside_the_month_count() {
        let period = november();
        let washer = washer(
            Decimal::from(30000),
            vec![
                attendance(day(2026, 11, 2), AttendanceStatus::Present),
                attendance(day(2026, 11, 3), AttendanceStatus::Incomplete),
                attendance(day(2026, 10, 31), AttendanceStatus::Present),
                attendance(day(2026, 12, 1), AttendanceStatus::Present),
            ],
        );

        let salary = calculate_salary(&washer, &period, 0, Decimal::ZERO);

        assert_eq!(salary.present_days, 1);
        assert_eq!(salary.loss_of_pay, Decimal::from(29000));
        assert_eq!(salary.attendance_percentage, Decimal::new(33, 1));
    }

    #[test]
    fn salary_never_goes_negative() {
        let washer = washer(Decimal::from(3000), Vec::new());

        let salary = calculate_salary(&washer, &november(), 0, Decimal::from(100));

        assert_eq!(salary.loss_of_pay, Decimal::from(3000));
        assert_eq!(salary.total_salary, Decimal::ZERO);
    }
}
