//! Business rules between the HTTP handlers and the stores.
//!
//! Every read or write of a folder or task checks existence first (`404`) and
//! ownership second (`403`).

pub mod folders;
pub mod tasks;
pub mod users;

pub use folders::FolderService;
pub use tasks::TaskService;
pub use users::UserService;
