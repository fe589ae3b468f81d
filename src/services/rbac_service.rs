// src/services/rbac_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
        slug::slugify,
    },
    db::{
        rbac_repo::{PERMISSION_SLUG_TAKEN, ROLE_NAME_TAKEN, ROLE_SLUG_TAKEN},
        RbacRepository,
    },
    models::{
        auth::ADMIN_ROLE_SLUG,
        rbac::{Permission, PermissionPayload, Role, RolePayload, RolePermissionsResult},
    },
    services::reconcile,
};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    // =========================================================================
    //  CARGOS
    // =========================================================================

    pub async fn get_role(&self, id: Uuid) -> Result<Role, AppError> {
        self.repo
            .find_role(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found".into()))
    }

    pub async fn list_roles(&self, query: &PageQuery) -> Result<Paginated<Role>, AppError> {
        let (roles, row_count) = self.repo.list_roles(query).await?;
        Ok(Paginated::new(roles, row_count, query))
    }

    pub async fn create_role(&self, payload: RolePayload) -> Result<Role, AppError> {
        let slug = role_slug(&payload)?;
        self.ensure_role_unique(&payload.name, &slug, None).await?;

        let role = self
            .repo
            .create_role(
                &self.pool,
                payload.name.trim(),
                &slug,
                payload.description.as_deref(),
                payload.icon.as_deref(),
            )
            .await?;

        tracing::info!(role_id = %role.id, slug = %role.slug, "Role created");
        Ok(role)
    }

    pub async fn update_role(&self, id: Uuid, payload: RolePayload) -> Result<Role, AppError> {
        let slug = role_slug(&payload)?;
        let current = self.get_role(id).await?;
        ensure_admin_role_kept(&current, Some(&slug))?;
        self.ensure_role_unique(&payload.name, &slug, Some(id)).await?;

        self.repo
            .update_role(
                id,
                payload.name.trim(),
                &slug,
                payload.description.as_deref(),
                payload.icon.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found".into()))
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<Uuid, AppError> {
        let current = self.get_role(id).await?;
        ensure_admin_role_kept(&current, None)?;
        if !self.repo.delete_role(id).await? {
            return Err(AppError::NotFound("Role not found".into()));
        }
        tracing::info!(role_id = %id, "Role deleted");
        Ok(id)
    }

    // Checagem antes do INSERT/UPDATE: a mensagem de domínio sai daqui, sem tocar na tabela
    async fn ensure_role_unique(&self, name: &str, slug: &str, exclude_id: Option<Uuid>) -> Result<(), AppError> {
        if self.repo.role_name_taken(name.trim(), exclude_id).await? {
            return Err(AppError::Conflict(ROLE_NAME_TAKEN.into()));
        }
        if self.repo.role_slug_taken(slug, exclude_id).await? {
            return Err(AppError::Conflict(ROLE_SLUG_TAKEN.into()));
        }
        Ok(())
    }

    // =========================================================================
    //  PERMISSÕES
    // =========================================================================

    pub async fn get_permission(&self, id: Uuid) -> Result<Permission, AppError> {
        self.repo
            .find_permission(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Permission not found".into()))
    }

    pub async fn list_permissions(&self, query: &PageQuery) -> Result<Paginated<Permission>, AppError> {
        let (permissions, row_count) = self.repo.list_permissions(query).await?;
        Ok(Paginated::new(permissions, row_count, query))
    }

    pub async fn create_permission(&self, payload: PermissionPayload) -> Result<Permission, AppError> {
        let slug = permission_slug(&payload)?;
        if self.repo.permission_slug_taken(slug, None).await? {
            return Err(AppError::Conflict(PERMISSION_SLUG_TAKEN.into()));
        }

        let permission = self
            .repo
            .create_permission(payload.name.trim(), slug, payload.description.as_deref())
            .await?;

        tracing::info!(permission_id = %permission.id, slug = %permission.slug, "Permission created");
        Ok(permission)
    }

    pub async fn update_permission(&self, id: Uuid, payload: PermissionPayload) -> Result<Permission, AppError> {
        let slug = permission_slug(&payload)?;
        if self.repo.permission_slug_taken(slug, Some(id)).await? {
            return Err(AppError::Conflict(PERMISSION_SLUG_TAKEN.into()));
        }

        self.repo
            .update_permission(id, payload.name.trim(), slug, payload.description.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("Permission not found".into()))
    }

    pub async fn delete_permission(&self, id: Uuid) -> Result<Uuid, AppError> {
        if !self.repo.delete_permission(id).await? {
            return Err(AppError::NotFound("Permission not found".into()));
        }
        Ok(id)
    }

    // =========================================================================
    //  VÍNCULO CARGO <-> PERMISSÃO
    // =========================================================================

    pub async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
        self.get_role(role_id).await?;
        self.repo.role_permissions(&self.pool, role_id).await
    }

    /// Reconcilia as permissões do cargo com a lista desejada, com o mínimo de escritas:
    /// um DELETE em lote para o que sobrou e um INSERT em lote para o que falta.
    pub async fn set_role_permissions(
        &self,
        role_id: Option<Uuid>,
        desired: &[Uuid],
    ) -> Result<RolePermissionsResult, AppError> {
        let role_id = role_id.ok_or_else(|| AppError::BadRequest("Role id is required".into()))?;

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. O cargo existe?
        if self.repo.find_role(&mut *tx, role_id).await?.is_none() {
            return Err(AppError::NotFound("Role not found".into()));
        }

        // 3. Calcula a diferença
        let current = self.repo.role_permission_ids(&mut *tx, role_id).await?;
        let diff = reconcile::diff(&current, desired);

        // 4. Ids desconhecidos virariam violação de FK; melhor um erro claro
        if !diff.to_create.is_empty() {
            let found = self.repo.existing_permission_ids(&mut *tx, &diff.to_create).await?;
            if found.len() != diff.to_create.len() {
                return Err(AppError::BadRequest("Unknown permission id".into()));
            }
        }

        // 5. Aplica só o necessário
        let mut deleted = 0;
        if !diff.to_delete.is_empty() {
            deleted = self.repo.unassign_permissions(&mut *tx, role_id, &diff.to_delete).await?;
        }
        let mut created = 0;
        if !diff.to_create.is_empty() {
            created = self.repo.assign_permissions(&mut *tx, role_id, &diff.to_create).await?;
        }

        let permissions = self.repo.role_permissions(&mut *tx, role_id).await?;

        // 6. Commit
        tx.commit().await?;

        tracing::info!(role_id = %role_id, deleted, created, "Role permissions reconciled");

        Ok(RolePermissionsResult {
            role_id,
            permissions,
            deleted,
            created,
        })
    }
}

/// Slug informado ou derivado do nome; precisa sobrar algo depois da normalização.
fn role_slug(payload: &RolePayload) -> Result<String, AppError> {
    let source = payload.slug.as_deref().unwrap_or(&payload.name);
    let slug = slugify(source);
    if slug.is_empty() {
        return Err(AppError::BadRequest("Slug must contain letters or digits".into()));
    }
    Ok(slug)
}

/// Slug da permissão é usado como veio (ex.: "roles:manage"), só sem espaços nas pontas.
fn permission_slug(payload: &PermissionPayload) -> Result<&str, AppError> {
    let slug = payload.slug.trim();
    if slug.chars().count() < 2 {
        return Err(AppError::BadRequest("Slug must have 2 to 100 characters.".into()));
    }
    Ok(slug)
}

// O cargo admin sustenta o bypass de permissões: não pode ser renomeado (slug) nem removido
fn ensure_admin_role_kept(current: &Role, new_slug: Option<&str>) -> Result<(), AppError> {
    if current.slug == ADMIN_ROLE_SLUG && new_slug != Some(ADMIN_ROLE_SLUG) {
        return Err(AppError::BadRequest("The admin role slug cannot be changed or removed".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, slug: Option<&str>) -> RolePayload {
        RolePayload {
            name: name.into(),
            slug: slug.map(String::from),
            description: None,
            icon: None,
        }
    }

    #[test]
    fn slug_is_derived_from_name() {
        assert_eq!(role_slug(&payload("Sales Manager", None)).unwrap(), "sales-manager");
        assert_eq!(role_slug(&payload("x", Some("Ops Team"))).unwrap(), "ops-team");
    }

    #[test]
    fn symbol_only_slug_is_rejected() {
        assert!(matches!(role_slug(&payload("!!", None)), Err(AppError::BadRequest(_))));
    }

    fn permission(slug: &str) -> PermissionPayload {
        PermissionPayload { name: "Reports".into(), slug: slug.into(), description: None }
    }

    #[test]
    fn permission_slug_is_trimmed() {
        assert_eq!(permission_slug(&permission("  reports:view ")).unwrap(), "reports:view");
    }

    #[test]
    fn blank_permission_slug_is_rejected() {
        assert!(matches!(permission_slug(&permission("  ")), Err(AppError::BadRequest(_))));
        assert!(matches!(permission_slug(&permission(" x ")), Err(AppError::BadRequest(_))));
    }

    fn role(slug: &str) -> Role {
        let now = chrono::Utc::now();
        Role {
            id: Uuid::new_v4(),
            name: "Role".into(),
            slug: slug.into(),
            description: None,
            icon: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn admin_role_keeps_its_slug() {
        assert!(ensure_admin_role_kept(&role(ADMIN_ROLE_SLUG), Some(ADMIN_ROLE_SLUG)).is_ok());
        assert!(ensure_admin_role_kept(&role(ADMIN_ROLE_SLUG), Some("root")).is_err());
        assert!(ensure_admin_role_kept(&role(ADMIN_ROLE_SLUG), None).is_err());
    }

    #[test]
    fn other_roles_can_change_freely() {
        assert!(ensure_admin_role_kept(&role("editor"), Some("writer")).is_ok());
        assert!(ensure_admin_role_kept(&role("editor"), None).is_ok());
    }

    // --- Contra um banco migrado ---

    async fn permission_id(pool: &PgPool, slug: &str) -> Uuid {
        sqlx::query_scalar("SELECT id FROM permissions WHERE slug = $1")
            .bind(slug)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn assigned(pool: &PgPool, role_id: Uuid) -> Vec<Uuid> {
        sqlx::query_scalar("SELECT permission_id FROM role_permissions WHERE role_id = $1 ORDER BY permission_id")
            .bind(role_id)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_role_name_is_rejected_without_insert(pool: PgPool) {
        let rbac = crate::test_support::state(pool.clone()).rbac_service;
        rbac.create_role(payload("Editors", None)).await.unwrap();

        let err = rbac.create_role(payload("Editors", Some("other-slug"))).await.unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, ROLE_NAME_TAKEN),
            other => panic!("expected Conflict, got {other:?}"),
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE name = 'Editors'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn role_update_checks_names_of_other_roles_only(pool: PgPool) {
        let rbac = crate::test_support::state(pool).rbac_service;
        let editors = rbac.create_role(payload("Editors", None)).await.unwrap();
        let writers = rbac.create_role(payload("Writers", None)).await.unwrap();

        let same = rbac.update_role(editors.id, payload("Editors", None)).await.unwrap();
        assert_eq!(same.name, "Editors");

        let err = rbac.update_role(writers.id, payload("Editors", Some("writers"))).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == ROLE_NAME_TAKEN));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn role_search_filters_rows_and_counts(pool: PgPool) {
        let rbac = crate::test_support::state(pool).rbac_service;
        for name in ["Sales Team", "Ops Team", "Marketing"] {
            rbac.create_role(payload(name, None)).await.unwrap();
        }

        let query = PageQuery { page_index: Some(0), page_size: Some(1), search: Some("team".into()) };
        let page = rbac.list_roles(&query).await.unwrap();
        assert_eq!(page.row_count, 2);
        assert_eq!(page.data.len(), 1);
        assert!(page.data[0].name.ends_with("Team"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reconcile_reaches_desired_set(pool: PgPool) {
        let rbac = crate::test_support::state(pool.clone()).rbac_service;
        let role = rbac.create_role(payload("Support", None)).await.unwrap();
        let a = permission_id(&pool, "roles:manage").await;
        let b = permission_id(&pool, "pages:manage").await;
        let c = permission_id(&pool, "tasks:manage").await;

        let first = rbac.set_role_permissions(Some(role.id), &[a, b]).await.unwrap();
        assert_eq!((first.deleted, first.created), (0, 2));

        let second = rbac.set_role_permissions(Some(role.id), &[b, c]).await.unwrap();
        assert_eq!((second.deleted, second.created), (1, 1));
        let mut expected = vec![b, c];
        expected.sort();
        assert_eq!(assigned(&pool, role.id).await, expected);

        let again = rbac.set_role_permissions(Some(role.id), &[c, b]).await.unwrap();
        assert_eq!((again.deleted, again.created), (0, 0));
        assert_eq!(again.permissions.len(), 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_permission_leaves_role_untouched(pool: PgPool) {
        let rbac = crate::test_support::state(pool.clone()).rbac_service;
        let role = rbac.create_role(payload("Support", None)).await.unwrap();
        let a = permission_id(&pool, "roles:manage").await;
        rbac.set_role_permissions(Some(role.id), &[a]).await.unwrap();

        let err = rbac
            .set_role_permissions(Some(role.id), &[Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(assigned(&pool, role.id).await, vec![a]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn admin_role_cannot_be_deleted(pool: PgPool) {
        let rbac = crate::test_support::state(pool).rbac_service;
        let admin = rbac.create_role(payload("Admin", Some(ADMIN_ROLE_SLUG))).await.unwrap();

        assert!(matches!(rbac.delete_role(admin.id).await, Err(AppError::BadRequest(_))));
        assert!(rbac.get_role(admin.id).await.is_ok());
    }
}
