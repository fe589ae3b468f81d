// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que sai do banco (Tabela permissions)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Payload de criação/edição de cargo. Sem slug, ele é derivado do nome.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RolePayload {
    #[validate(length(min = 2, max = 100, message = "Name must have 2 to 100 characters."))]
    pub name: String,
    #[validate(length(min = 2, max = 100, message = "Slug must have 2 to 100 characters."))]
    pub slug: Option<String>,
    #[validate(length(max = 500, message = "Description is too long."))]
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPayload {
    #[validate(length(min = 2, max = 100, message = "Name must have 2 to 100 characters."))]
    pub name: String,
    #[validate(length(min = 2, max = 100, message = "Slug must have 2 to 100 characters."))]
    pub slug: String,
    #[validate(length(max = 500, message = "Description is too long."))]
    pub description: Option<String>,
}

// roleId é opcional no formato, mas obrigatório na regra (erro de validação se ausente)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRolePermissionsPayload {
    pub role_id: Option<Uuid>,
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

// Resultado da reconciliação cargo <-> permissões
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionsResult {
    pub role_id: Uuid,
    pub permissions: Vec<Permission>,
    pub deleted: u64,
    pub created: u64,
}
