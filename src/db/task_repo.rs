// src/db/task_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageQuery},
    models::task::{Task, TaskField, TaskProperty},
};

pub const TASK_PROPERTY_TAKEN: &str = "Task property already is existed!";

pub struct TaskFields<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub status: &'a str,
    pub label: Option<&'a str>,
    pub priority: &'a str,
    pub parent_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

// Filtros extras da listagem (além da busca textual)
#[derive(Debug, Default)]
pub struct TaskFilter<'a> {
    pub status: Option<&'a str>,
    pub priority: Option<&'a str>,
}

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  TAREFAS
    // =========================================================================

    pub async fn find(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    pub async fn create(&self, creator_id: Uuid, fields: TaskFields<'_>) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, label, priority, parent_id, assignee_id, creator_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.status)
        .bind(fields.label)
        .bind(fields.priority)
        .bind(fields.parent_id)
        .bind(fields.assignee_id)
        .bind(creator_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    pub async fn update(&self, id: Uuid, fields: TaskFields<'_>) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, label = $5, priority = $6,
                parent_id = $7, assignee_id = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.status)
        .bind(fields.label)
        .bind(fields.priority)
        .bind(fields.parent_id)
        .bind(fields.assignee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_subtasks(&self, parent_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE parent_id = $1 ORDER BY created_at ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    /// Mesmo teste de ciclo das páginas, sobre tasks.parent_id.
    pub async fn is_ancestor_or_self(&self, task_id: Uuid, candidate_parent: Uuid) -> Result<bool, AppError> {
        let found: bool = sqlx::query_scalar(
            r#"
            WITH RECURSIVE chain AS (
                SELECT id, parent_id FROM tasks WHERE id = $1
                UNION
                SELECT t.id, t.parent_id FROM tasks t JOIN chain c ON t.id = c.parent_id
            )
            SELECT EXISTS (SELECT 1 FROM chain WHERE id = $2)
            "#,
        )
        .bind(candidate_parent)
        .bind(task_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    pub async fn list(&self, query: &PageQuery, filter: TaskFilter<'_>) -> Result<(Vec<Task>, i64), AppError> {
        let pattern = query.search_pattern();

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE ($1::text IS NULL OR title ILIKE $1 OR id::text ILIKE $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR priority = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(pattern.as_deref())
        .bind(filter.status)
        .bind(filter.priority)
        .bind(query.page_size())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let row_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE ($1::text IS NULL OR title ILIKE $1 OR id::text ILIKE $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR priority = $3)
            "#,
        )
        .bind(pattern.as_deref())
        .bind(filter.status)
        .bind(filter.priority)
        .fetch_one(&self.pool)
        .await?;

        Ok((tasks, row_count))
    }

    // =========================================================================
    //  PROPRIEDADES (lookup de status/label/priority)
    // =========================================================================

    pub async fn property_exists(&self, field: TaskField, value: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM task_properties WHERE field = $1 AND value = $2)",
        )
        .bind(field)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn list_properties(&self, field: Option<TaskField>) -> Result<Vec<TaskProperty>, AppError> {
        let properties = sqlx::query_as::<_, TaskProperty>(
            r#"
            SELECT * FROM task_properties
            WHERE ($1::task_field IS NULL OR field = $1)
            ORDER BY field, created_at ASC
            "#,
        )
        .bind(field)
        .fetch_all(&self.pool)
        .await?;
        Ok(properties)
    }

    pub async fn create_property(
        &self,
        field: TaskField,
        value: &str,
        label: &str,
        icon: Option<&str>,
    ) -> Result<TaskProperty, AppError> {
        sqlx::query_as::<_, TaskProperty>(
            r#"
            INSERT INTO task_properties (field, value, label, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(field)
        .bind(value)
        .bind(label)
        .bind(icon)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, TASK_PROPERTY_TAKEN))
    }

    pub async fn find_property(&self, id: Uuid) -> Result<Option<TaskProperty>, AppError> {
        let property = sqlx::query_as::<_, TaskProperty>("SELECT * FROM task_properties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(property)
    }

    /// Quantas tarefas usam este valor no campo correspondente.
    pub async fn count_tasks_using(&self, field: TaskField, value: &str) -> Result<i64, AppError> {
        let sql = match field {
            TaskField::Status => "SELECT COUNT(*) FROM tasks WHERE status = $1",
            TaskField::Label => "SELECT COUNT(*) FROM tasks WHERE label = $1",
            TaskField::Priority => "SELECT COUNT(*) FROM tasks WHERE priority = $1",
        };
        let count: i64 = sqlx::query_scalar(sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn delete_property(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM task_properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
