//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod scheduling;
mod services;

#[cfg(test)]
mod tests;

// Importações principais
use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some((email, password)) = &settings.bootstrap_admin {
        app_state.auth_service.ensure_superadmin(email, password).await?;
    }

    let listener = TcpListener::bind(&settings.server_addr).await?;
    tracing::info!(
        "🚀 Servidor escutando em {} (fuso do negócio {})",
        listener.local_addr()?,
        settings.calendar.offset()
    );
    axum::serve(listener, app(app_state)).await?;
    Ok(())
}

pub fn app(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Define as rotas de usuário
    let user_routes = Router::new().route("/me", get(handlers::auth::get_me));

    let schedule_routes = Router::new()
        .route("/washes", get(handlers::schedule::list_scheduled_washes))
        .route("/assign", post(handlers::schedule::assign_washer));

    let lead_routes = Router::new()
        .route("/"
               ,post(handlers::leads::create_lead)
               .get(handlers::leads::list_leads)
        )
        .route("/{leadId}"
               ,get(handlers::leads::get_lead)
               .put(handlers::leads::update_lead)
               .delete(handlers::leads::delete_lead)
        )
        .route("/{leadId}/wash-history"
               ,get(handlers::leads::get_wash_history)
               .post(handlers::leads::log_wash)
        )
        .route("/{leadId}/wash-history/{index}/start", put(handlers::leads::start_wash))
        .route("/{leadId}/monthly-subscription"
               ,post(handlers::leads::create_subscription)
               .get(handlers::leads::get_subscription)
        )
        .route("/{leadId}/complete", put(handlers::leads::complete_wash))
        .route("/{leadId}/reschedule", put(handlers::leads::reschedule));

    let washer_routes = Router::new()
        .route("/"
               ,get(handlers::washers::list_washers)
               .post(handlers::washers::create_washer)
        )
        .route("/{userId}"
               ,get(handlers::washers::get_washer)
               .put(handlers::washers::update_washer)
               .delete(handlers::washers::delete_washer)
        )
        .route("/{userId}/status", post(handlers::washers::set_status))
        .route("/{userId}/salary"
               ,get(handlers::washers::get_salary)
               .post(handlers::washers::set_salary)
        )
        .route("/{userId}/attendance"
               ,post(handlers::washers::mark_attendance)
               .get(handlers::washers::get_attendance)
        );

    let expense_routes = Router::new()
        .route("/"
               ,get(handlers::expenses::list_expenses)
               .post(handlers::expenses::create_expense)
        )
        .route("/{id}"
               ,put(handlers::expenses::update_expense)
               .delete(handlers::expenses::delete_expense)
        )
        .route("/washer/{userId}", get(handlers::expenses::washer_expenses))
        .route("/salary-calculation", get(handlers::expenses::salary_calculation));

    // Tudo abaixo exige Bearer token
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/schedule", schedule_routes)
        .nest("/leads", lead_routes)
        .nest("/washers", washer_routes)
        .nest("/expenses", expense_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
