pub mod comment;
pub mod notification;
pub mod project;
pub mod task;
pub mod token_record;
pub mod user;

pub use comment::{Comment, CommentInput};
pub use notification::{
    Notification, NotificationCategory, NotificationInput, NotificationKind, NotificationQuery,
};
pub use project::{Priority, Project, ProjectDetail, ProjectInput, ProjectStatus, ProjectUpdate};
pub use task::{
    Task, TaskDetail, TaskInput, TaskPriority, TaskQuery, TaskStatus, TaskStatusInput, TaskUpdate,
};
pub use token_record::{PasswordResetToken, RevokedToken};
pub use user::{
    ChangePasswordInput, CreateUserInput, Role, UpdateRoleInput, UpdateUserInput, User,
};
