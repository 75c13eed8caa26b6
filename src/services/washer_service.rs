// src/services/washer_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{
        counter_repo::USER_COUNTER,
        user_repo::{NewUser, WasherChanges},
        CounterRepository, UserRepository,
    },
    models::{
        auth::{Claims, User, UserRole, UserStatus},
        expense::ExpenseError,
        washer::{
            mark_attendance, Attendance, AttendanceKind, CreateWasherPayload, SalaryInfo, SalaryPayload,
            UpdateWasherPayload, WasherSummary,
        },
    },
    scheduling::BusinessCalendar,
    services::auth::AuthService,
};

#[derive(Clone)]
pub struct WasherService {
    user_repo: UserRepository,
    counter_repo: CounterRepository,
    calendar: BusinessCalendar,
    pool: PgPool,
}

impl WasherService {
    pub fn new(
        user_repo: UserRepository,
        counter_repo: CounterRepository,
        calendar: BusinessCalendar,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, counter_repo, calendar, pool }
    }

    pub async fn list_washers(&self) -> Result<Vec<WasherSummary>, AppError> {
        let now = Utc::now();
        let washers = self.user_repo.list_washers().await?;
        Ok(washers
            .iter()
            .map(|user| WasherSummary::new(user, &self.calendar, now))
            .collect())
    }

    pub async fn get_washer(&self, user_id: i64) -> Result<User, AppError> {
        self.user_repo
            .find_washer(&self.pool, user_id, false)
            .await?
            .ok_or(AppError::WasherNotFound)
    }

    pub async fn create_washer(&self, payload: &CreateWasherPayload) -> Result<User, AppError> {
        let password_hash = AuthService::hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;
        let user_id = self.counter_repo.next_value(&mut *tx, USER_COUNTER).await?;
        let washer = self
            .user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    user_id,
                    name: payload.name.trim(),
                    email: payload.email.trim(),
                    phone: payload.phone.trim(),
                    role: UserRole::Washer,
                    area: payload.area.as_deref(),
                    password_hash: &password_hash,
                    base_salary: payload.base_salary.unwrap_or(Decimal::ZERO),
                },
            )
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = washer.user_id, "lavador cadastrado");
        Ok(washer)
    }

    /// Entrada/saída do dia. A linha do lavador fica travada até o commit,
    /// então duas marcações simultâneas não se sobrescrevem. Lavador só
    /// marca o próprio ponto.
    pub async fn mark_attendance(
        &self,
        actor: &Claims,
        user_id: i64,
        kind: AttendanceKind,
    ) -> Result<Attendance, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut washer = self
            .user_repo
            .find_washer(&mut *tx, user_id, true)
            .await?
            .ok_or(AppError::WasherNotFound)?;
        if actor.role == UserRole::Washer && actor.sub != washer.id {
            return Err(AppError::Forbidden);
        }

        let record = mark_attendance(&mut washer.attendance, kind, &self.calendar, now)?;
        self.user_repo
            .save_attendance(&mut *tx, washer.id, &washer.attendance)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id, kind = ?kind, "ponto registrado");
        Ok(record)
    }

    /// Registros de ponto, mais recentes primeiro.
    pub async fn attendance(&self, user_id: i64) -> Result<Vec<Attendance>, AppError> {
        let mut records = self.get_washer(user_id).await?.attendance;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    // ===== CADASTRO E SALÁRIO =====

    pub async fn update_washer(&self, user_id: i64, payload: UpdateWasherPayload) -> Result<User, AppError> {
        let trimmed = |value: Option<String>| value.map(|v| v.trim().to_string());
        let changes = WasherChanges {
            name: trimmed(payload.name),
            email: trimmed(payload.email),
            phone: trimmed(payload.phone),
            area: trimmed(payload.area),
        };
        let washer = self
            .user_repo
            .update_washer(user_id, &changes)
            .await?
            .ok_or(AppError::WasherNotFound)?;

        tracing::info!(user_id, "lavador atualizado");
        Ok(washer)
    }

    pub async fn delete_washer(&self, user_id: i64) -> Result<(), AppError> {
        if !self.user_repo.delete_washer(user_id).await? {
            return Err(AppError::WasherNotFound);
        }
        tracing::info!(user_id, "lavador removido");
        Ok(())
    }

    pub async fn set_status(&self, user_id: i64, status: UserStatus) -> Result<User, AppError> {
        let washer = self
            .user_repo
            .set_status(user_id, status)
            .await?
            .ok_or(AppError::WasherNotFound)?;

        tracing::info!(user_id, status = ?status, "status do lavador alterado");
        Ok(washer)
    }

    pub async fn salary(&self, user_id: i64) -> Result<SalaryInfo, AppError> {
        let washer = self.get_washer(user_id).await?;
        Ok(SalaryInfo::from(&washer))
    }

    /// Novo salário base a partir de `effectiveDate` (ausente = agora).
    pub async fn set_salary(&self, user_id: i64, payload: &SalaryPayload) -> Result<SalaryInfo, AppError> {
        if payload.base_salary < Decimal::ZERO {
            return Err(ExpenseError::NegativeAmount.into());
        }
        let effective_date = match payload.effective_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => self.calendar.parse_instant(raw)?,
            None => Utc::now(),
        };

        let washer = self
            .user_repo
            .set_salary(user_id, payload.base_salary, effective_date)
            .await?
            .ok_or(AppError::WasherNotFound)?;

        tracing::info!(user_id, base_salary = %washer.base_salary, "salário atualizado");
        Ok(SalaryInfo::from(&washer))
    }
}
