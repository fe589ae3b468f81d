pub mod error;
pub mod extract;
pub mod pagination;
pub mod response;
pub mod slug;
