// src/models/page.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// Linha plana da tabela pages
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub icon: Option<String>,
    pub parent_id: Option<Uuid>,
    pub order_index: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Nó da árvore da sidebar. `children` é omitido (não `[]`) quando não há filhos.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    #[serde(flatten)]
    pub page: Page,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PageNode>>,
}

// Opção do dropdown "página pai"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentOption {
    pub id: Uuid,
    pub name: String,
    pub depth: usize,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PagePayload {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Url must have 1 to 255 characters."))]
    pub url: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<Uuid>,
    pub order_index: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyQuery {
    pub search: Option<String>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentOptionsQuery {
    pub exclude_id: Option<Uuid>,
}
