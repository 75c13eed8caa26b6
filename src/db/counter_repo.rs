// src/db/counter_repo.rs

use sqlx::{Executor, Postgres};

use crate::common::error::AppError;

pub const LEAD_COUNTER: &str = "leadId";
pub const USER_COUNTER: &str = "userId";

// Sequências públicas (leadId, userId) guardadas na tabela `counters`
// Sempre roda dentro da transação de quem cria o registro
#[derive(Clone, Default)]
pub struct CounterRepository;

impl CounterRepository {
    pub fn new() -> Self {
        Self
    }

    /// Incrementa e lê numa única instrução: dois requests simultâneos
    /// nunca recebem o mesmo valor.
    pub async fn next_value<'e, E>(&self, executor: E, name: &str) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO counters (name, sequence_value)
            VALUES ($1, 1)
            ON CONFLICT (name)
            DO UPDATE SET sequence_value = counters.sequence_value + 1
            RETURNING sequence_value
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(value)
    }
}
