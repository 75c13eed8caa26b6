// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{CounterRepository, ExpenseRepository, LeadRepository, UserRepository},
    scheduling::BusinessCalendar,
    services::{
        auth::AuthService, expense_service::ExpenseService, lead_service::LeadService,
        schedule_service::ScheduleService, washer_service::WasherService,
    },
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// Configuração lida do ambiente (.env incluso)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub calendar: BusinessCalendar,
    /// (e-mail, senha) do superadmin criado na primeira subida
    pub bootstrap_admin: Option<(String, String)>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let calendar = match lookup("BUSINESS_UTC_OFFSET") {
            Some(raw) => BusinessCalendar::parse_offset(&raw)?,
            None => BusinessCalendar::default(),
        };
        let bootstrap_admin = lookup("BOOTSTRAP_ADMIN_EMAIL").zip(lookup("BOOTSTRAP_ADMIN_PASSWORD"));

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr,
            db_max_connections,
            calendar,
            bootstrap_admin,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub lead_service: LeadService,
    pub schedule_service: ScheduleService,
    pub washer_service: WasherService,
    pub expense_service: ExpenseService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, settings.jwt_secret.clone(), settings.calendar))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, jwt_secret: String, calendar: BusinessCalendar) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let counter_repo = CounterRepository::new();
        let expense_repo = ExpenseRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            counter_repo.clone(),
            jwt_secret,
            db_pool.clone(),
        );
        let lead_service = LeadService::new(
            lead_repo.clone(),
            user_repo.clone(),
            counter_repo.clone(),
            calendar,
            db_pool.clone(),
        );
        let schedule_service = ScheduleService::new(
            lead_repo.clone(),
            user_repo.clone(),
            lead_service.clone(),
            calendar,
            db_pool.clone(),
        );
        let expense_service = ExpenseService::new(
            expense_repo,
            user_repo.clone(),
            lead_repo,
            calendar,
            db_pool.clone(),
        );
        let washer_service = WasherService::new(user_repo, counter_repo, calendar, db_pool.clone());

        Self {
            db_pool,
            auth_service,
            lead_service,
            schedule_service,
            washer_service,
            expense_service,
        }
    }
}
