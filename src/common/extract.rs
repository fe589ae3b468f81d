// src/common/extract.rs

// Extratores com a mesma cara dos do axum, mas cuja rejeição vira AppError,
// então corpo/rota/query inválidos também respondem com o envelope { data, error }.

use axum::extract::{FromRequest, FromRequestParts};

use crate::common::error::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
        routing::{get, post},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::common::pagination::PageQuery;

    fn app() -> Router {
        Router::new()
            .route("/items/{id}", get(|Path(id): Path<Uuid>| async move { id.to_string() }))
            .route(
                "/items",
                get(|Query(q): Query<PageQuery>| async move { q.page_size().to_string() })
                    .post(|Json(v): Json<Value>| async move { v.to_string() }),
            )
    }

    async fn envelope(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn non_uuid_path_uses_envelope() {
        let response = app()
            .oneshot(Request::builder().uri("/items/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = envelope(response).await;
        assert!(body["data"].is_null());
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn bad_query_uses_envelope() {
        let response = app()
            .oneshot(Request::builder().uri("/items?pageSize=lots").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(envelope(response).await["data"].is_null());
    }

    #[tokio::test]
    async fn malformed_json_uses_envelope() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/items")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = envelope(response).await;
        assert!(body["data"].is_null());
        assert!(body["error"].as_str().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn missing_content_type_uses_envelope() {
        let response = app()
            .oneshot(Request::builder().method("POST").uri("/items").body(Body::from("{}")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(envelope(response).await["data"].is_null());
    }

    #[tokio::test]
    async fn valid_requests_pass_through() {
        let id = Uuid::new_v4();
        let response = app()
            .oneshot(Request::builder().uri(format!("/items/{id}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
