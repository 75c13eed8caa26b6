// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{counter_repo::USER_COUNTER, user_repo::NewUser, CounterRepository, UserRepository},
    models::auth::{Claims, User, UserRole},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    counter_repo: CounterRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        counter_repo: CounterRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, counter_repo, jwt_secret, pool }
    }

    pub async fn hash_password(password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = user.user_id, role = ?user.role, "login");
        self.create_token(user.id, user.role)
    }

    /// Só decodifica e confere assinatura/expiração; não toca no banco.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    pub async fn current_user(&self, claims: &Claims) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub fn create_token(&self, user_id: Uuid, role: UserRole) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    /// Cria o superadmin inicial se ainda não existir ninguém com esse e-mail.
    pub async fn ensure_superadmin(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Ok(());
        }
        let password_hash = Self::hash_password(password).await?;

        let mut tx = self.pool.begin().await?;
        let user_id = self.counter_repo.next_value(&mut *tx, USER_COUNTER).await?;
        self.user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    user_id,
                    name: "Super Admin",
                    email,
                    phone: "0000000000",
                    role: UserRole::Superadmin,
                    area: None,
                    password_hash: &password_hash,
                    base_salary: Decimal::ZERO,
                },
            )
            .await?;
        tx.commit().await?;

        tracing::info!("✅ Superadmin inicial criado: {}", email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/carwash_test")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            CounterRepository::new(),
            secret.to_string(),
            pool,
        )
    }

    #[tokio::test]
    async fn token_round_trip_keeps_role() {
        let auth = service("segredo");
        let id = Uuid::new_v4();
        let token = auth.create_token(id, UserRole::Washer).unwrap();

        let claims = auth.decode_token(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, UserRole::Washer);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("um").create_token(Uuid::new_v4(), UserRole::Admin).unwrap();
        let err = service("outro").decode_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
