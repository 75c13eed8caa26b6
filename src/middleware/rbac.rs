// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{Claims, UserRole},
};

/// 1. O trait que define quem passa pelo guardião
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
}

/// 2. O extrator (guardião). Roda depois do `auth_guard`.
pub struct RequireRole<R>(pub Claims, PhantomData<R>);

impl<R, S> FromRequestParts<S> for RequireRole<R>
where
    R: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !R::allows(claims.role) {
            tracing::warn!(user = %claims.sub, role = ?claims.role, "acesso negado");
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole(claims, PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

/// superadmin e admin
pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn allows(role: UserRole) -> bool {
        role.is_admin()
    }
}

/// Qualquer membro da equipe de escritório (não lavador)
pub struct StaffOnly;
impl RoleDef for StaffOnly {
    fn allows(role: UserRole) -> bool {
        role != UserRole::Washer
    }
}

pub type AdminUser = RequireRole<AdminOnly>;
pub type StaffUser = RequireRole<StaffOnly>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gate_rejects_limited_admin_and_washer() {
        assert!(AdminOnly::allows(UserRole::Superadmin));
        assert!(AdminOnly::allows(UserRole::Admin));
        assert!(!AdminOnly::allows(UserRole::LimitedAdmin));
        assert!(!AdminOnly::allows(UserRole::Washer));
    }

    #[test]
    fn staff_gate_only_rejects_washers() {
        assert!(StaffOnly::allows(UserRole::LimitedAdmin));
        assert!(!StaffOnly::allows(UserRole::Washer));
    }
}
