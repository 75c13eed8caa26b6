// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::expense::ExpenseError;
use crate::models::washer::AttendanceError;
use crate::scheduling::ScheduleError;

// Erro único da camada HTTP; serviços devolvem isto, handlers só traduzem.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    #[error(transparent)]
    Expense(#[from] ExpenseError),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Telefone já cadastrado")]
    PhoneAlreadyExists,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Permissão insuficiente")]
    Forbidden,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Cliente não encontrado")]
    LeadNotFound,

    #[error("Lavador não encontrado")]
    WasherNotFound,

    #[error("Assinatura mensal não encontrada")]
    SubscriptionNotFound,

    #[error("Despesa não encontrada")]
    ExpenseNotFound,

    // Outro request alterou o cliente entre a leitura e a escrita
    #[error("Conflito de escrita no cliente {0}")]
    WriteConflict(i64),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Schedule(e) => e.code(),
            AppError::Attendance(_) => "ATTENDANCE_ERROR",
            AppError::Expense(ExpenseError::NegativeAmount) => "INVALID_AMOUNT",
            AppError::Expense(ExpenseError::InvalidPeriod { .. }) => "INVALID_PERIOD",
            AppError::EmailAlreadyExists => "EMAIL_EXISTS",
            AppError::PhoneAlreadyExists => "PHONE_EXISTS",
            AppError::UniqueConstraintViolation(_) => "DUPLICATE",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::Forbidden => "FORBIDDEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::LeadNotFound => "LEAD_NOT_FOUND",
            AppError::WasherNotFound => "WASHER_NOT_FOUND",
            AppError::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            AppError::ExpenseNotFound => "EXPENSE_NOT_FOUND",
            AppError::WriteConflict(_) => "WRITE_CONFLICT",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match &self {
            // Todos os detalhes da validação, campo a campo
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| e.message.as_ref().map_or_else(|| e.code.to_string(), |m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "code": code,
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Schedule(e) if e.is_not_found() => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Schedule(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Attendance(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Expense(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "This email is already in use.".into()),
            AppError::PhoneAlreadyExists => (StatusCode::CONFLICT, "This phone number is already registered.".into()),
            AppError::UniqueConstraintViolation(_) => (StatusCode::CONFLICT, "Duplicate value.".into()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password.".into()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or missing authentication token.".into()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "You do not have permission for this action.".into()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found.".into()),
            AppError::LeadNotFound => (StatusCode::NOT_FOUND, "Lead not found.".into()),
            AppError::WasherNotFound => (StatusCode::NOT_FOUND, "Washer not found.".into()),
            AppError::SubscriptionNotFound => (StatusCode::NOT_FOUND, "No monthly subscription found.".into()),
            AppError::ExpenseNotFound => (StatusCode::NOT_FOUND, "Expense not found.".into()),

            // Todo o resto (banco, conflito de escrita, interno) vira 500.
            // O detalhe vai só para o log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                let message = match e {
                    AppError::WriteConflict(_) => "The record was modified concurrently, please retry.",
                    _ => "An unexpected error occurred.",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        let body = Json(json!({ "error": error_message, "code": code }));
        (status, body).into_response()
    }
}
