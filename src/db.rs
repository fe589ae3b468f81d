pub mod config_repo;
pub use config_repo::ConfigRepository;
pub mod page_repo;
pub use page_repo::PageRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod session_repo;
pub use session_repo::SessionRepository;
pub mod task_repo;
pub use task_repo::TaskRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
