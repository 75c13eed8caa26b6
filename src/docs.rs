// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::scheduling;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Schedule ---
        handlers::schedule::list_scheduled_washes,
        handlers::schedule::assign_washer,

        // --- Leads ---
        handlers::leads::create_lead,
        handlers::leads::list_leads,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::delete_lead,
        handlers::leads::get_wash_history,
        handlers::leads::log_wash,
        handlers::leads::start_wash,
        handlers::leads::create_subscription,
        handlers::leads::get_subscription,
        handlers::leads::complete_wash,
        handlers::leads::reschedule,

        // --- Washers ---
        handlers::washers::list_washers,
        handlers::washers::create_washer,
        handlers::washers::get_washer,
        handlers::washers::update_washer,
        handlers::washers::delete_washer,
        handlers::washers::set_status,
        handlers::washers::get_salary,
        handlers::washers::set_salary,
        handlers::washers::mark_attendance,
        handlers::washers::get_attendance,

        // --- Expenses ---
        handlers::expenses::list_expenses,
        handlers::expenses::create_expense,
        handlers::expenses::update_expense,
        handlers::expenses::delete_expense,
        handlers::expenses::washer_expenses,
        handlers::expenses::salary_calculation,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::UserStatus,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Leads ---
            models::lead::LeadType,
            models::lead::LeadSource,
            models::lead::LeadStatus,
            models::lead::ServiceType,
            models::lead::OneTimeWashStatus,
            models::lead::ScheduledWashStatus,
            models::lead::WashStatus,
            models::lead::OneTimeWash,
            models::lead::ScheduledWash,
            models::lead::MonthlySubscription,
            models::lead::WashHistoryEntry,
            models::lead::IndexedWashHistoryEntry,
            models::lead::Lead,
            models::lead::CreateLeadPayload,
            models::lead::OneTimeWashInput,
            models::lead::UpdateLeadPayload,
            models::lead::LogWashPayload,
            models::lead::CreateSubscriptionPayload,
            models::lead::CompleteWashPayload,
            models::lead::ReschedulePayload,

            // --- Schedule ---
            models::schedule::AssignWasherPayload,
            models::schedule::ScheduledWashView,
            models::schedule::ScheduleResponse,
            models::schedule::AssignmentResponse,
            scheduling::OccurrenceSource,
            scheduling::OccurrenceRef,
            scheduling::DisplayStatus,
            scheduling::DateWindow,
            scheduling::auto_assign::AssignmentOutcome,
            scheduling::subscription::SubscriptionOutcome,

            // --- Washers ---
            models::washer::WasherRef,
            models::washer::WasherSummary,
            models::washer::Attendance,
            models::washer::AttendanceStatus,
            models::washer::AttendanceKind,
            models::washer::AttendancePayload,
            models::washer::CreateWasherPayload,
            models::washer::UpdateWasherPayload,
            models::washer::WasherStatusPayload,
            models::washer::SalaryPayload,
            models::washer::SalaryInfo,

            // --- Expenses ---
            models::expense::Expense,
            models::expense::ExpensePayload,
            models::expense::SalaryBreakdown,
            models::expense::SalaryReport,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Schedule", description = "Agenda consolidada e atribuição de lavadores"),
        (name = "Leads", description = "Clientes, lavagens e assinaturas mensais"),
        (name = "Washers", description = "Lavadores e ponto"),
        (name = "Expenses", description = "Despesas e folha dos lavadores")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
