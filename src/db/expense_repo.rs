// src/db/expense_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::expense::Expense, scheduling::DateWindow};

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub window: Option<DateWindow>,
    pub name: Option<String>,
    pub reason: Option<String>,
}

// Dados já validados de uma despesa
pub struct ExpenseRecord<'a> {
    pub washer_name: &'a str,
    pub amount: Decimal,
    pub reason: &'a str,
    pub date: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, record: &ExpenseRecord<'_>, created_by: &str) -> Result<Expense, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (washer_name, amount, reason, date, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(record.washer_name)
        .bind(record.amount)
        .bind(record.reason)
        .bind(record.date)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(expense)
    }

    pub async fn list(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses
            WHERE ($1::timestamptz IS NULL OR date >= $1)
              AND ($2::timestamptz IS NULL OR date <= $2)
              AND ($3::text IS NULL OR washer_name ILIKE '%' || $3 || '%')
              AND ($4::text IS NULL OR reason ILIKE '%' || $4 || '%')
            ORDER BY date DESC
            "#,
        )
        .bind(filter.window.map(|w| w.start))
        .bind(filter.window.map(|w| w.end))
        .bind(filter.name.as_deref())
        .bind(filter.reason.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    pub async fn update(&self, id: Uuid, record: &ExpenseRecord<'_>) -> Result<Option<Expense>, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses SET
                washer_name = $2,
                amount = $3,
                reason = $4,
                date = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(record.washer_name)
        .bind(record.amount)
        .bind(record.reason)
        .bind(record.date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(expense)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ===== FOLHA: período `[start, end)`, nome sem diferenciar maiúsculas =====

    pub async fn list_for_washer(
        &self,
        washer_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Expense>, AppError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses
            WHERE LOWER(TRIM(washer_name)) = LOWER($1)
              AND date >= $2 AND date < $3
            ORDER BY date DESC
            "#,
        )
        .bind(washer_name.trim())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    /// Total por nome (em minúsculas) dentro do período.
    pub async fn totals_by_washer(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, Decimal)>, AppError> {
        let totals = sqlx::query_as::<_, (String, Decimal)>(
            r#"
            SELECT LOWER(TRIM(washer_name)), SUM(amount)
            FROM expenses
            WHERE date >= $1 AND date < $2
            GROUP BY LOWER(TRIM(washer_name))
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(totals)
    }
}
