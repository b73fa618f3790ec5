pub mod folder;
pub mod task;
pub mod token;
pub mod user;

pub use folder::{CreateFolderDto, Folder, UpdateFolderDto};
pub use task::{CreateTaskDto, NewTask, Task, TaskChanges, TaskStatus, UpdateTaskDto};
pub use token::{RefreshToken, TokenScope};
pub use user::{CreateUserDto, User};
