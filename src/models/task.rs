// src/models/task.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::pagination::PageQuery;

// Mapeia o CREATE TYPE task_field do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_field", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskField {
    Status,
    Label,
    Priority,
}

impl TaskField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::Status => "status",
            TaskField::Label => "label",
            TaskField::Priority => "priority",
        }
    }
}

// Tabela de lookup: valores válidos para status/label/priority
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskProperty {
    pub id: Uuid,
    pub field: TaskField,
    pub value: String,
    pub label: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub label: Option<String>,
    pub priority: String,
    pub parent_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description is too long."))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Status is required."))]
    pub status: String,
    pub label: Option<String>,
    #[validate(length(min = 1, message = "Priority is required."))]
    pub priority: String,
    pub parent_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPropertyPayload {
    pub field: TaskField,
    #[validate(length(min = 1, max = 50, message = "Value must have 1 to 50 characters."))]
    pub value: String,
    #[validate(length(min = 1, max = 100, message = "Label is required."))]
    pub label: String,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskPropertyQuery {
    pub field: Option<TaskField>,
}

// Campos repetidos em vez de `flatten`: o serde_urlencoded não converte números dentro de flatten.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub page_index: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

impl TaskListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page_index: self.page_index,
            page_size: self.page_size,
            search: self.search.clone(),
        }
    }
}
