// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{common::error::AppError, models::auth::Session};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião). Entrega a sessão já verificada.
pub struct RequirePermission<T> {
    pub session: Session,
    _perm: PhantomData<T>,
}

// 3. Implementação do FromRequestParts
// As permissões já vieram com a sessão, então não há ida ao banco aqui.
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        check::<T>(session)
    }
}

fn check<T: PermissionDef>(session: Session) -> Result<RequirePermission<T>, AppError> {
    let required_perm = T::slug();
    if !session.has_permission(required_perm) {
        return Err(AppError::Forbidden(format!(
            "You need the '{}' permission to perform this action.",
            required_perm
        )));
    }
    Ok(RequirePermission {
        session,
        _perm: PhantomData,
    })
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermRolesManage;
impl PermissionDef for PermRolesManage {
    fn slug() -> &'static str { "roles:manage" }
}

pub struct PermPermissionsManage;
impl PermissionDef for PermPermissionsManage {
    fn slug() -> &'static str { "permissions:manage" }
}

pub struct PermPagesManage;
impl PermissionDef for PermPagesManage {
    fn slug() -> &'static str { "pages:manage" }
}

pub struct PermUsersManage;
impl PermissionDef for PermUsersManage {
    fn slug() -> &'static str { "users:manage" }
}

// Não é semeada: na prática só o cargo admin passa
pub struct PermConfigManage;
impl PermissionDef for PermConfigManage {
    fn slug() -> &'static str { "config:manage" }
}

pub struct PermTasksManage;
impl PermissionDef for PermTasksManage {
    fn slug() -> &'static str { crate::services::task_service::PERM_TASKS_MANAGE }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::session;

    #[test]
    fn missing_permission_is_forbidden() {
        let result = check::<PermUsersManage>(session(Some("editor"), &["pages:manage"]));
        match result {
            Err(AppError::Forbidden(msg)) => assert!(msg.contains("users:manage")),
            _ => panic!("expected Forbidden"),
        }
    }

    #[test]
    fn granted_permission_passes_session_through() {
        let guard = check::<PermPagesManage>(session(Some("editor"), &["pages:manage"])).unwrap();
        assert_eq!(guard.session.role_slug.as_deref(), Some("editor"));
        assert!(check::<PermRolesManage>(session(Some("admin"), &[])).is_ok());
    }
}
