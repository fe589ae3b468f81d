pub mod auth;
pub mod hierarchy;
pub mod page_service;
pub mod rbac_service;
pub mod reconcile;
pub mod setup_service;
pub mod task_service;
pub mod user_service;
