// src/services/page_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, slug::slugify},
    db::{
        page_repo::{PageFields, PAGE_URL_TAKEN},
        PageRepository,
    },
    models::page::{Page, PageNode, PagePayload, ParentOption},
    services::hierarchy,
};

#[derive(Clone)]
pub struct PageService {
    repo: PageRepository,
}

impl PageService {
    pub fn new(repo: PageRepository) -> Self {
        Self { repo }
    }

    /// Floresta completa (ou só as ativas), filtrada pela busca.
    pub async fn get_hierarchy(&self, search: Option<&str>, active_only: bool) -> Result<Vec<PageNode>, AppError> {
        let rows = self.repo.list_all().await?;
        let mut forest = hierarchy::build_forest(rows);
        if active_only {
            forest = hierarchy::prune_inactive(forest);
        }
        Ok(hierarchy::filter_forest(forest, search.unwrap_or_default()))
    }

    pub async fn get_parent_options(&self, exclude_id: Option<Uuid>) -> Result<Vec<ParentOption>, AppError> {
        let forest = hierarchy::build_forest(self.repo.list_all().await?);
        Ok(hierarchy::flatten_options(&forest, exclude_id))
    }

    pub async fn get_page(&self, id: Uuid) -> Result<Page, AppError> {
        self.repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Page not found".into()))
    }

    pub async fn create_page(&self, payload: PagePayload) -> Result<Page, AppError> {
        let url = page_url(&payload)?;
        if self.repo.url_taken(&url, None).await? {
            return Err(AppError::Conflict(PAGE_URL_TAKEN.into()));
        }
        if let Some(parent_id) = payload.parent_id {
            if self.repo.find(parent_id).await?.is_none() {
                return Err(AppError::BadRequest("Parent page does not exist".into()));
            }
        }

        let page = self.repo.create(fields(&payload, &url)).await?;
        tracing::info!(page_id = %page.id, url = %page.url, "Page created");
        Ok(page)
    }

    pub async fn update_page(&self, id: Uuid, payload: PagePayload) -> Result<Page, AppError> {
        let url = page_url(&payload)?;
        if self.repo.url_taken(&url, Some(id)).await? {
            return Err(AppError::Conflict(PAGE_URL_TAKEN.into()));
        }
        self.ensure_valid_parent(id, payload.parent_id).await?;

        self.repo
            .update(id, fields(&payload, &url))
            .await?
            .ok_or_else(|| AppError::NotFound("Page not found".into()))
    }

    pub async fn toggle_active(&self, id: Uuid) -> Result<Page, AppError> {
        self.repo
            .toggle_active(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Page not found".into()))
    }

    /// Filhos não somem: o FK `ON DELETE SET NULL` os promove a raiz.
    pub async fn delete_page(&self, id: Uuid) -> Result<Uuid, AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Page not found".into()));
        }
        tracing::info!(page_id = %id, "Page deleted");
        Ok(id)
    }

    // Ciclos são barrados na escrita: o pai não pode ser a própria página nem um descendente dela
    async fn ensure_valid_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<(), AppError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        if parent_id == id {
            return Err(AppError::BadRequest("A page cannot be its own parent".into()));
        }
        if self.repo.find(parent_id).await?.is_none() {
            return Err(AppError::BadRequest("Parent page does not exist".into()));
        }
        if self.repo.is_ancestor_or_self(id, parent_id).await? {
            return Err(AppError::BadRequest(
                "A page cannot be moved under one of its descendants".into(),
            ));
        }
        Ok(())
    }
}

fn fields<'a>(payload: &'a PagePayload, url: &'a str) -> PageFields<'a> {
    PageFields {
        name: payload.name.trim(),
        url,
        icon: payload.icon.as_deref(),
        parent_id: payload.parent_id,
        order_index: payload.order_index.unwrap_or(0),
        is_active: payload.is_active.unwrap_or(true),
    }
}

/// Url informada (com `/` inicial garantido) ou `/slug-do-nome`.
fn page_url(payload: &PagePayload) -> Result<String, AppError> {
    let url = match payload.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) if url.starts_with('/') || url.starts_with("http") => url.to_string(),
        Some(url) => format!("/{}", url),
        None => {
            let slug = slugify(&payload.name);
            if slug.is_empty() {
                return Err(AppError::BadRequest("Url could not be derived from the name".into()));
            }
            format!("/{}", slug)
        }
    };
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, url: Option<&str>) -> PagePayload {
        PagePayload {
            name: name.into(),
            url: url.map(String::from),
            icon: None,
            parent_id: None,
            order_index: None,
            is_active: None,
        }
    }

    #[test]
    fn url_defaults_to_slugged_name() {
        assert_eq!(page_url(&payload("Task Board", None)).unwrap(), "/task-board");
        assert_eq!(page_url(&payload("x", Some("  "))).unwrap(), "/x");
    }

    #[test]
    fn url_gets_leading_slash() {
        assert_eq!(page_url(&payload("x", Some("settings/roles"))).unwrap(), "/settings/roles");
        assert_eq!(page_url(&payload("x", Some("/users"))).unwrap(), "/users");
    }

    #[test]
    fn defaults_for_order_and_active() {
        let p = payload("Home", None);
        let f = fields(&p, "/home");
        assert_eq!(f.order_index, 0);
        assert!(f.is_active);
    }

    // --- Contra um banco migrado ---

    fn child(name: &str, parent_id: Option<Uuid>) -> PagePayload {
        PagePayload { parent_id, ..payload(name, None) }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn parent_cycles_are_rejected_on_write(pool: sqlx::PgPool) {
        let pages = crate::test_support::state(pool).page_service;
        let root = pages.create_page(child("Settings", None)).await.unwrap();
        let mid = pages.create_page(child("Access", Some(root.id))).await.unwrap();
        let leaf = pages.create_page(child("Roles", Some(mid.id))).await.unwrap();

        let under_descendant = pages.update_page(root.id, child("Settings", Some(leaf.id))).await;
        assert!(matches!(under_descendant, Err(AppError::BadRequest(_))));

        let own_parent = pages.update_page(mid.id, child("Access", Some(mid.id))).await;
        assert!(matches!(own_parent, Err(AppError::BadRequest(_))));

        // Mover para um ramo não relacionado continua permitido
        let other = pages.create_page(child("Reports", None)).await.unwrap();
        let moved = pages.update_page(leaf.id, child("Roles", Some(other.id))).await.unwrap();
        assert_eq!(moved.parent_id, Some(other.id));

        let forest = pages.get_hierarchy(None, false).await.unwrap();
        assert_eq!(forest.len(), 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_page_url_is_rejected(pool: sqlx::PgPool) {
        let pages = crate::test_support::state(pool).page_service;
        pages.create_page(payload("Users", None)).await.unwrap();

        let err = pages.create_page(payload("People", Some("/users"))).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == PAGE_URL_TAKEN));
    }
}
