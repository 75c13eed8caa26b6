// src/services/expense_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        expense_repo::{ExpenseFilter, ExpenseRecord},
        ExpenseRepository, LeadRepository, UserRepository,
    },
    models::{
        auth::Claims,
        expense::{
            calculate_salary, Expense, ExpenseError, ExpensePayload, ExpenseQuery, PayrollPeriod,
            PeriodQuery, SalaryQuery, SalaryReport,
        },
    },
    scheduling::{BusinessCalendar, DateWindow},
};

const DEFAULT_CREATED_BY: &str = "Admin";

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Clone)]
pub struct ExpenseService {
    expense_repo: ExpenseRepository,
    user_repo: UserRepository,
    lead_repo: LeadRepository,
    calendar: BusinessCalendar,
    pool: PgPool,
}

impl ExpenseService {
    pub fn new(
        expense_repo: ExpenseRepository,
        user_repo: UserRepository,
        lead_repo: LeadRepository,
        calendar: BusinessCalendar,
        pool: PgPool,
    ) -> Self {
        Self { expense_repo, user_repo, lead_repo, calendar, pool }
    }

    // =========================================================================
    //  ÁREA 1: DESPESAS
    // =========================================================================

    pub async fn list(&self, query: &ExpenseQuery) -> Result<Vec<Expense>, AppError> {
        // Data só filtra com as duas pontas presentes
        let window = match (present(query.start_date.as_deref()), present(query.end_date.as_deref())) {
            (Some(start), Some(end)) => Some(DateWindow::parse(Some(start), Some(end), &self.calendar)?),
            _ => None,
        };
        let filter = ExpenseFilter {
            window,
            name: present(query.name.as_deref()).map(str::to_string),
            reason: present(query.reason.as_deref()).map(str::to_string),
        };
        self.expense_repo.list(&filter).await
    }

    pub async fn create(&self, actor: &Claims, payload: &ExpensePayload) -> Result<Expense, AppError> {
        let record = self.record(payload, Utc::now())?;
        let created_by = self
            .user_repo
            .find_by_id(actor.sub)
            .await?
            .map(|user| user.name)
            .unwrap_or_else(|| DEFAULT_CREATED_BY.to_string());

        let expense = self.expense_repo.create(&record, &created_by).await?;
        tracing::info!(expense = %expense.id, washer = %expense.washer_name, amount = %expense.amount, "despesa lançada");
        Ok(expense)
    }

    /// Substitui todos os campos; data ausente volta a ser "agora".
    pub async fn update(&self, id: Uuid, payload: &ExpensePayload) -> Result<Expense, AppError> {
        let record = self.record(payload, Utc::now())?;
        self.expense_repo
            .update(id, &record)
            .await?
            .ok_or(AppError::ExpenseNotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.expense_repo.delete(id).await? {
            return Err(AppError::ExpenseNotFound);
        }
        tracing::info!(expense = %id, "despesa removida");
        Ok(())
    }

    fn record<'a>(&self, payload: &'a ExpensePayload, now: DateTime<Utc>) -> Result<ExpenseRecord<'a>, AppError> {
        if payload.amount < Decimal::ZERO {
            return Err(ExpenseError::NegativeAmount.into());
        }
        let date = match present(payload.date.as_deref()) {
            Some(raw) => self.calendar.parse_instant(raw)?,
            None => now,
        };
        Ok(ExpenseRecord {
            washer_name: payload.washer_name.trim(),
            amount: payload.amount,
            reason: payload.reason.trim(),
            date,
        })
    }

    // =========================================================================
    //  ÁREA 2: FOLHA
    // =========================================================================

    /// Despesas do lavador no mês, casadas pelo nome.
    pub async fn washer_expenses(&self, user_id: i64, query: &PeriodQuery) -> Result<Vec<Expense>, AppError> {
        let period = PayrollPeriod::resolve(query.month, query.year, &self.calendar, Utc::now())?;
        let washer = self
            .user_repo
            .find_washer(&self.pool, user_id, false)
            .await?
            .ok_or(AppError::WasherNotFound)?;

        self.expense_repo
            .list_for_washer(&washer.name, period.start, period.end)
            .await
    }

    pub async fn salary_report(&self, query: &SalaryQuery) -> Result<SalaryReport, AppError> {
        let period = PayrollPeriod::resolve(query.month, query.year, &self.calendar, Utc::now())?;

        let washers = match query.washer_id {
            Some(user_id) => vec![self
                .user_repo
                .find_washer(&self.pool, user_id, false)
                .await?
                .ok_or(AppError::WasherNotFound)?],
            None => self.user_repo.list_washers().await?,
        };

        // Lavador apagado ou UUID inválido no histórico não entra na conta
        let wash_counts: HashMap<Uuid, i64> = self
            .lead_repo
            .completed_wash_counts(period.start, period.end)
            .await?
            .into_iter()
            .filter_map(|(washer, count)| Uuid::parse_str(&washer).ok().map(|id| (id, count)))
            .collect();
        let expenses: HashMap<String, Decimal> = self
            .expense_repo
            .totals_by_washer(period.start, period.end)
            .await?
            .into_iter()
            .collect();

        let salary_data = washers
            .iter()
            .map(|washer| {
                let washes = wash_counts.get(&washer.id).copied().unwrap_or_default();
                let spent = expenses
                    .get(&washer.name.trim().to_lowercase())
                    .copied()
                    .unwrap_or_default();
                calculate_salary(washer, &period, washes, spent)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            month = period.month,
            year = period.year,
            washers = salary_data.len(),
            "folha calculada"
        );

        Ok(SalaryReport {
            month: period.month,
            year: period.year,
            salary_data,
        })
    }
}
