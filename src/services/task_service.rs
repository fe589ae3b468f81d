// src/services/task_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{
        task_repo::{TaskFields, TaskFilter, TASK_PROPERTY_TAKEN},
        TaskRepository, UserRepository,
    },
    models::{
        auth::Session,
        task::{Task, TaskField, TaskPayload, TaskProperty, TaskPropertyPayload},
    },
};

pub const PERM_TASKS_MANAGE: &str = "tasks:manage";

#[derive(Clone)]
pub struct TaskService {
    repo: TaskRepository,
    user_repo: UserRepository,
}

impl TaskService {
    pub fn new(repo: TaskRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    pub async fn get_task(&self, id: Uuid) -> Result<Task, AppError> {
        self.repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    pub async fn list_tasks(
        &self,
        query: &PageQuery,
        status: Option<&str>,
        priority: Option<&str>,
    ) -> Result<Paginated<Task>, AppError> {
        let (tasks, row_count) = self.repo.list(query, TaskFilter { status, priority }).await?;
        Ok(Paginated::new(tasks, row_count, query))
    }

    pub async fn list_subtasks(&self, id: Uuid) -> Result<Vec<Task>, AppError> {
        self.get_task(id).await?;
        self.repo.list_subtasks(id).await
    }

    /// O criador é sempre quem está na sessão.
    pub async fn create_task(&self, session: &Session, payload: TaskPayload) -> Result<Task, AppError> {
        self.validate_references(None, &payload).await?;

        let task = self.repo.create(session.user_id(), fields(&payload)).await?;
        tracing::info!(task_id = %task.id, creator_id = %task.creator_id, "Task created");
        Ok(task)
    }

    pub async fn update_task(&self, session: &Session, id: Uuid, payload: TaskPayload) -> Result<Task, AppError> {
        let existing = self.get_task(id).await?;
        ensure_can_edit(session, &existing)?;
        self.validate_references(Some(id), &payload).await?;

        self.repo
            .update(id, fields(&payload))
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    pub async fn delete_task(&self, session: &Session, id: Uuid) -> Result<Uuid, AppError> {
        let existing = self.get_task(id).await?;
        ensure_can_edit(session, &existing)?;

        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Task not found".into()));
        }
        Ok(id)
    }

    // status/label/priority precisam existir no lookup; pai e responsável também
    async fn validate_references(&self, id: Option<Uuid>, payload: &TaskPayload) -> Result<(), AppError> {
        self.ensure_property(TaskField::Status, &payload.status).await?;
        self.ensure_property(TaskField::Priority, &payload.priority).await?;
        if let Some(label) = payload.label.as_deref() {
            self.ensure_property(TaskField::Label, label).await?;
        }

        if let Some(assignee_id) = payload.assignee_id {
            if self.user_repo.find_by_id(assignee_id).await?.is_none() {
                return Err(AppError::BadRequest("Assignee does not exist".into()));
            }
        }

        if let Some(parent_id) = payload.parent_id {
            if Some(parent_id) == id {
                return Err(AppError::BadRequest("A task cannot be its own parent".into()));
            }
            if self.repo.find(parent_id).await?.is_none() {
                return Err(AppError::BadRequest("Parent task does not exist".into()));
            }
            if let Some(id) = id {
                if self.repo.is_ancestor_or_self(id, parent_id).await? {
                    return Err(AppError::BadRequest(
                        "A task cannot be moved under one of its subtasks".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    async fn ensure_property(&self, field: TaskField, value: &str) -> Result<(), AppError> {
        if !self.repo.property_exists(field, value).await? {
            return Err(AppError::BadRequest(format!(
                "Invalid {} '{}'",
                field.as_str(),
                value
            )));
        }
        Ok(())
    }

    // =========================================================================
    //  PROPRIEDADES
    // =========================================================================

    pub async fn list_properties(&self, field: Option<TaskField>) -> Result<Vec<TaskProperty>, AppError> {
        self.repo.list_properties(field).await
    }

    pub async fn create_property(&self, payload: TaskPropertyPayload) -> Result<TaskProperty, AppError> {
        let value = payload.value.trim();
        if self.repo.property_exists(payload.field, value).await? {
            return Err(AppError::Conflict(TASK_PROPERTY_TAKEN.into()));
        }
        self.repo
            .create_property(payload.field, value, payload.label.trim(), payload.icon.as_deref())
            .await
    }

    /// Valor ainda em uso por alguma tarefa não pode sumir do lookup.
    pub async fn delete_property(&self, id: Uuid) -> Result<Uuid, AppError> {
        let property = self
            .repo
            .find_property(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task property not found".into()))?;

        let in_use = self.repo.count_tasks_using(property.field, &property.value).await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Task property is used by {} task(s)",
                in_use
            )));
        }

        self.repo.delete_property(id).await?;
        Ok(id)
    }
}

fn fields(payload: &TaskPayload) -> TaskFields<'_> {
    TaskFields {
        title: payload.title.trim(),
        description: payload.description.as_deref(),
        status: &payload.status,
        label: payload.label.as_deref(),
        priority: &payload.priority,
        parent_id: payload.parent_id,
        assignee_id: payload.assignee_id,
    }
}

/// Criador edita a própria tarefa; as dos outros exigem `tasks:manage`.
fn ensure_can_edit(session: &Session, task: &Task) -> Result<(), AppError> {
    if task.creator_id == session.user_id() || session.has_permission(PERM_TASKS_MANAGE) {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Only the creator or a task manager can change this task".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::session;
    use chrono::Utc;

    fn task_by(creator_id: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Ship it".into(),
            description: None,
            status: "todo".into(),
            label: None,
            priority: "high".into(),
            parent_id: None,
            assignee_id: None,
            creator_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn creator_can_edit_own_task() {
        let s = session(Some("user"), &[]);
        assert!(ensure_can_edit(&s, &task_by(s.user_id())).is_ok());
    }

    #[test]
    fn others_need_tasks_manage() {
        let stranger = session(Some("user"), &[]);
        let manager = session(Some("lead"), &[PERM_TASKS_MANAGE]);
        let admin = session(Some("admin"), &[]);
        let task = task_by(Uuid::new_v4());

        assert!(matches!(ensure_can_edit(&stranger, &task), Err(AppError::Forbidden(_))));
        assert!(ensure_can_edit(&manager, &task).is_ok());
        assert!(ensure_can_edit(&admin, &task).is_ok());
    }

    // --- Contra um banco migrado ---

    fn new_task(title: &str, parent_id: Option<Uuid>) -> TaskPayload {
        TaskPayload {
            title: title.into(),
            description: None,
            status: "todo".into(),
            label: None,
            priority: "high".into(),
            parent_id,
            assignee_id: None,
        }
    }

    async fn owner(state: &crate::config::AppState) -> Session {
        let signed_up = state
            .auth_service
            .sign_up("owner@example.com", "password123", "Owner")
            .await
            .unwrap();
        crate::test_support::session_for(signed_up.user, None, &[])
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn task_parent_cycles_are_rejected(pool: sqlx::PgPool) {
        let state = crate::test_support::state(pool);
        let me = owner(&state).await;
        let tasks = &state.task_service;

        let epic = tasks.create_task(&me, new_task("Epic", None)).await.unwrap();
        let story = tasks.create_task(&me, new_task("Story", Some(epic.id))).await.unwrap();
        let step = tasks.create_task(&me, new_task("Step", Some(story.id))).await.unwrap();

        let result = tasks.update_task(&me, epic.id, new_task("Epic", Some(step.id))).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result = tasks.update_task(&me, story.id, new_task("Story", Some(story.id))).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let subtasks = tasks.list_subtasks(epic.id).await.unwrap();
        assert_eq!(subtasks.len(), 1);
        assert_eq!(subtasks[0].id, story.id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_status_is_rejected(pool: sqlx::PgPool) {
        let state = crate::test_support::state(pool);
        let me = owner(&state).await;

        let payload = TaskPayload { status: "someday".into(), ..new_task("Later", None) };
        let result = state.task_service.create_task(&me, payload).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn property_in_use_cannot_be_deleted(pool: sqlx::PgPool) {
        let state = crate::test_support::state(pool);
        let me = owner(&state).await;
        let tasks = &state.task_service;

        let blocked = tasks
            .create_property(TaskPropertyPayload {
                field: TaskField::Status,
                value: "blocked".into(),
                label: "Blocked".into(),
                icon: None,
            })
            .await
            .unwrap();

        let duplicate = tasks
            .create_property(TaskPropertyPayload {
                field: TaskField::Status,
                value: "blocked".into(),
                label: "Blocked again".into(),
                icon: None,
            })
            .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(msg)) if msg == TASK_PROPERTY_TAKEN));

        let payload = TaskPayload { status: "blocked".into(), ..new_task("Waiting", None) };
        let task = tasks.create_task(&me, payload).await.unwrap();
        assert!(matches!(tasks.delete_property(blocked.id).await, Err(AppError::Conflict(_))));

        tasks.delete_task(&me, task.id).await.unwrap();
        assert_eq!(tasks.delete_property(blocked.id).await.unwrap(), blocked.id);
    }
}
