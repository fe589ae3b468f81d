pub mod auth;
pub mod pages;
pub mod rbac;
pub mod setup;
pub mod tasks;
pub mod users;
