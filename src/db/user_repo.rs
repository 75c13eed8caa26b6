// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{User, UserRole, UserStatus},
        washer::Attendance,
    },
};

// Dados já validados para inserir um usuário
pub struct NewUser<'a> {
    pub user_id: i64,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub role: UserRole,
    pub area: Option<&'a str>,
    pub password_hash: &'a str,
    pub base_salary: Decimal,
}

// Campos de perfil do lavador; `None` mantém o valor atual
#[derive(Debug, Clone, Default)]
pub struct WasherChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub area: Option<String>,
}

// E-mail/telefone duplicados viram erros específicos
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    "users_email_key" => AppError::EmailAlreadyExists,
                    "users_phone_key" => AppError::PhoneAlreadyExists,
                    _ => AppError::UniqueConstraintViolation(constraint.to_string()),
                };
            }
        }
    }
    e.into()
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID interno
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Lavador pelo `userId` público. `FOR UPDATE` quando chamado dentro
    /// de uma transação que vai regravar o ponto.
    pub async fn find_washer<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        lock: bool,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if lock {
            "SELECT * FROM users WHERE user_id = $1 AND role = 'washer' FOR UPDATE"
        } else {
            "SELECT * FROM users WHERE user_id = $1 AND role = 'washer'"
        };
        let user = sqlx::query_as::<_, User>(sql)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn list_washers(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = 'washer' ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // Cria um novo usuário
    pub async fn create_user<'e, E>(&self, executor: E, new_user: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                user_id, name, email, phone, role, area, password_hash, base_salary
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new_user.user_id)
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.phone)
        .bind(new_user.role)
        .bind(new_user.area)
        .bind(new_user.password_hash)
        .bind(new_user.base_salary)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)?;

        Ok(user)
    }

    pub async fn save_attendance<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        attendance: &[Attendance],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET attendance = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(Json(attendance))
            .execute(executor)
            .await?;
        Ok(())
    }

    // ===== ADMINISTRAÇÃO DO LAVADOR =====

    pub async fn update_washer(&self, user_id: i64, changes: &WasherChanges) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                area = COALESCE($5, area),
                updated_at = NOW()
            WHERE user_id = $1 AND role = 'washer'
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.area.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(user)
    }

    pub async fn set_status(&self, user_id: i64, status: UserStatus) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET status = $2, updated_at = NOW()
            WHERE user_id = $1 AND role = 'washer'
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn set_salary(
        &self,
        user_id: i64,
        base_salary: Decimal,
        effective_date: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                base_salary = $2,
                salary_effective_date = $3,
                updated_at = NOW()
            WHERE user_id = $1 AND role = 'washer'
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(base_salary)
        .bind(effective_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Clientes atribuídos ficam sem lavador (`ON DELETE SET NULL`).
    pub async fn delete_washer(&self, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1 AND role = 'washer'")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
