pub use super::bugs::Entity as Bugs;
pub use super::comments::Entity as Comments;
pub use super::edits::Entity as Edits;
pub use super::roles::Entity as Roles;
pub use super::users::Entity as Users;
