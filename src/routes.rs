// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{config::AppState, handlers, middleware::auth::session_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/sign-up", post(handlers::auth::sign_up))
        .route("/api/auth/sign-in", post(handlers::auth::sign_in))
        .route("/api/auth/otp/send", post(handlers::auth::send_otp))
        .route("/api/auth/otp/verify", post(handlers::auth::verify_otp))
        .route("/api/setup/admin", post(handlers::setup::create_admin));

    // Rotas protegidas pela sessão; permissões finas ficam nos extratores dos handlers
    let protected_routes = Router::new()
        .route("/api/auth/sign-out", post(handlers::auth::sign_out))
        .route("/api/auth/session", get(handlers::auth::get_session))
        // Cargos
        .route("/api/roles"
               ,get(handlers::rbac::list_roles)
               .post(handlers::rbac::create_role)
        )
        .route("/api/roles/{id}"
               ,get(handlers::rbac::get_role)
               .put(handlers::rbac::update_role)
               .delete(handlers::rbac::delete_role)
        )
        .route("/api/roles/{id}/permissions", get(handlers::rbac::get_role_permissions))
        .route("/api/role-permissions", put(handlers::rbac::set_role_permissions))
        // Permissões
        .route("/api/permissions"
               ,get(handlers::rbac::list_permissions)
               .post(handlers::rbac::create_permission)
        )
        .route("/api/permissions/{id}"
               ,get(handlers::rbac::get_permission)
               .put(handlers::rbac::update_permission)
               .delete(handlers::rbac::delete_permission)
        )
        // Páginas
        .route("/api/pages", post(handlers::pages::create_page))
        .route("/api/pages/hierarchy", get(handlers::pages::get_hierarchy))
        .route("/api/pages/parent-options", get(handlers::pages::get_parent_options))
        .route("/api/pages/{id}"
               ,get(handlers::pages::get_page)
               .put(handlers::pages::update_page)
               .delete(handlers::pages::delete_page)
        )
        .route("/api/pages/{id}/toggle-active", post(handlers::pages::toggle_page_active))
        // Tarefas
        .route("/api/tasks"
               ,get(handlers::tasks::list_tasks)
               .post(handlers::tasks::create_task)
        )
        .route("/api/tasks/{id}"
               ,get(handlers::tasks::get_task)
               .put(handlers::tasks::update_task)
               .delete(handlers::tasks::delete_task)
        )
        .route("/api/tasks/{id}/subtasks", get(handlers::tasks::list_subtasks))
        .route("/api/task-properties"
               ,get(handlers::tasks::list_task_properties)
               .post(handlers::tasks::create_task_property)
        )
        .route("/api/task-properties/{id}", delete(handlers::tasks::delete_task_property))
        // Usuários
        .route("/api/users"
               ,get(handlers::users::list_users)
               .post(handlers::users::create_user)
        )
        .route("/api/users/{id}"
               ,get(handlers::users::get_user)
               .put(handlers::users::update_user)
        )
        .route("/api/users/{id}/role", put(handlers::users::set_user_role))
        .route("/api/users/{id}/password", put(handlers::users::set_user_password))
        .route("/api/users/{id}/ban", post(handlers::users::ban_user))
        .route("/api/users/{id}/unban", post(handlers::users::unban_user))
        // Configuração
        .route("/api/config/{key}"
               ,get(handlers::setup::get_config)
               .put(handlers::setup::set_config)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            session_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // Pool preguiçoso: nenhuma destas rotas chega a abrir conexão
    fn app() -> Router {
        let settings = test_support::settings();
        let pool = PgPoolOptions::new()
            .connect_lazy(&settings.database_url)
            .unwrap();
        build_router(AppState::from_pool(pool, &settings))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let response = app()
            .oneshot(Request::builder().uri("/api/roles").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["data"], Value::Null);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/pages/hierarchy")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_up_validates_before_touching_the_database() {
        let payload = serde_json::json!({ "email": "not-an-email", "password": "short", "name": "" });
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/sign-up")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["data"], Value::Null);
        assert!(body["details"].get("email").is_some());
        assert!(body["details"].get("password").is_some());
    }

    #[tokio::test]
    async fn malformed_json_gets_the_error_envelope() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/sign-in")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["data"], Value::Null);
        assert!(body["error"].as_str().unwrap().contains("JSON"));
    }
}
