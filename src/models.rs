pub mod auth;
pub mod config;
pub mod page;
pub mod rbac;
pub mod task;
pub mod user;
