// src/db/lead_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::lead::{Lead, LeadRow, LeadSource, LeadStatus, LeadType},
    scheduling::DateWindow,
};

#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub lead_type: Option<LeadType>,
    pub search: Option<String>,
}

// Campos de perfil alteráveis; `None` mantém o valor atual
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub area: Option<String>,
    pub car_model: Option<String>,
    pub vehicle_number: Option<String>,
    pub notes: Option<String>,
    pub lead_source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("leads_phone_key") => AppError::PhoneAlreadyExists,
                Some(other) => AppError::UniqueConstraintViolation(other.to_string()),
                None => AppError::UniqueConstraintViolation("leads".into()),
            };
        }
    }
    e.into()
}

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, lead: &Lead) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, LeadRow>(
            r#"
            INSERT INTO leads (
                id, lead_id, lead_type, lead_source, status,
                customer_name, phone, area, car_model, vehicle_number, notes,
                latitude, longitude, assigned_washer,
                one_time_wash, monthly_subscription, wash_history
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(lead.id)
        .bind(lead.lead_id)
        .bind(lead.lead_type)
        .bind(lead.lead_source)
        .bind(lead.status)
        .bind(&lead.customer_name)
        .bind(&lead.phone)
        .bind(&lead.area)
        .bind(&lead.car_model)
        .bind(&lead.vehicle_number)
        .bind(&lead.notes)
        .bind(lead.latitude)
        .bind(lead.longitude)
        .bind(lead.assigned_washer)
        .bind(lead.one_time_wash.as_ref().map(Json))
        .bind(lead.monthly_subscription.as_ref().map(Json))
        .bind(Json(&lead.wash_history))
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)?;

        Ok(row.into())
    }

    pub async fn find_by_lead_id(&self, lead_id: i64) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query_as::<_, LeadRow>("SELECT * FROM leads WHERE lead_id = $1")
            .bind(lead_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Lead::from))
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query_as::<_, LeadRow>("SELECT * FROM leads WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Lead::from))
    }

    pub async fn list(&self, filter: &LeadFilter) -> Result<Vec<Lead>, AppError> {
        let rows = sqlx::query_as::<_, LeadRow>(
            r#"
            SELECT * FROM leads
            WHERE ($1::lead_status IS NULL OR status = $1)
              AND ($2::lead_type IS NULL OR lead_type = $2)
              AND ($3::text IS NULL
                   OR customer_name ILIKE '%' || $3 || '%'
                   OR phone ILIKE '%' || $3 || '%'
                   OR area ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.lead_type)
        .bind(filter.search.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Lead::from).collect())
    }

    /// Filtro grosso da agenda. Cada data é comparada com um dia de folga
    /// dos dois lados (datas sem fuso no JSONB e a ocorrência sintética),
    /// o filtro fino roda depois em memória.
    pub async fn find_in_window(&self, window: &DateWindow) -> Result<Vec<Lead>, AppError> {
        let rows = sqlx::query_as::<_, LeadRow>(
            r#"
            SELECT * FROM leads l
            WHERE (
                l.one_time_wash IS NOT NULL
                AND COALESCE(try_timestamptz(l.one_time_wash->>'scheduledDate'), l.created_at)
                    BETWEEN $1 - INTERVAL '1 day' AND $2 + INTERVAL '1 day'
            )
            OR EXISTS (
                SELECT 1
                FROM jsonb_array_elements(COALESCE(l.monthly_subscription->'scheduledWashes', '[]'::jsonb)) w
                WHERE try_timestamptz(w->>'scheduledDate')
                    BETWEEN $1 - INTERVAL '1 day' AND $2 + INTERVAL '1 day'
            )
            OR EXISTS (
                SELECT 1
                FROM jsonb_array_elements(l.wash_history) h
                WHERE try_timestamptz(h->>'date')
                    BETWEEN $1 - INTERVAL '1 day' AND $2 + INTERVAL '1 day'
            )
            OR (
                l.assigned_washer IS NOT NULL
                AND l.one_time_wash IS NULL
                AND jsonb_array_length(COALESCE(l.monthly_subscription->'scheduledWashes', '[]'::jsonb)) = 0
                AND jsonb_array_length(l.wash_history) = 0
                AND l.created_at BETWEEN $1 - INTERVAL '1 day' AND $2 + INTERVAL '1 day'
            )
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Lead::from).collect())
    }

    /// Grava as estruturas de lavagem com compare-and-swap em `version`.
    /// Se outro request gravou antes, devolve `WriteConflict`.
    pub async fn save_washes<'e, E>(&self, executor: E, lead: &Lead) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, LeadRow>(
            r#"
            UPDATE leads SET
                lead_type = $3,
                status = $4,
                assigned_washer = $5,
                one_time_wash = $6,
                monthly_subscription = $7,
                wash_history = $8,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(lead.id)
        .bind(lead.version)
        .bind(lead.lead_type)
        .bind(lead.status)
        .bind(lead.assigned_washer)
        .bind(lead.one_time_wash.as_ref().map(Json))
        .bind(lead.monthly_subscription.as_ref().map(Json))
        .bind(Json(&lead.wash_history))
        .fetch_optional(executor)
        .await?;

        row.map(Lead::from).ok_or(AppError::WriteConflict(lead.lead_id))
    }

    /// Lavagens concluídas por lavador (UUID em texto) no período `[start, end)`.
    pub async fn completed_wash_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, i64)>, AppError> {
        let counts = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT h->>'washer', COUNT(*)
            FROM leads l, jsonb_array_elements(l.wash_history) h
            WHERE h->>'washStatus' = 'completed'
              AND h->>'washer' IS NOT NULL
              AND try_timestamptz(h->>'date') >= $1
              AND try_timestamptz(h->>'date') < $2
            GROUP BY h->>'washer'
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    pub async fn update_profile(&self, lead_id: i64, changes: &ProfileChanges) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query_as::<_, LeadRow>(
            r#"
            UPDATE leads SET
                customer_name = COALESCE($2, customer_name),
                phone = COALESCE($3, phone),
                area = COALESCE($4, area),
                car_model = COALESCE($5, car_model),
                vehicle_number = COALESCE($6, vehicle_number),
                notes = COALESCE($7, notes),
                lead_source = COALESCE($8, lead_source),
                status = COALESCE($9, status),
                latitude = COALESCE($10, latitude),
                longitude = COALESCE($11, longitude),
                version = version + 1,
                updated_at = NOW()
            WHERE lead_id = $1
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(changes.customer_name.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.area.as_deref())
        .bind(changes.car_model.as_deref())
        .bind(changes.vehicle_number.as_deref())
        .bind(changes.notes.as_deref())
        .bind(changes.lead_source)
        .bind(changes.status)
        .bind(changes.latitude)
        .bind(changes.longitude)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(row.map(Lead::from))
    }

    pub async fn delete(&self, lead_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE lead_id = $1")
            .bind(lead_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
