pub mod bug;
pub mod comment;
pub mod edit;
pub mod role;
pub mod user;

pub use bug::{Bug, BugChanges, NewBug};
pub use comment::Comment;
pub use edit::Edit;
pub use role::Role;
pub use user::{NewUser, User, UserChanges, UserCredentials};
