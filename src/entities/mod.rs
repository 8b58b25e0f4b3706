pub mod prelude;

pub mod bugs;
pub mod comments;
pub mod edits;
pub mod roles;
pub mod users;
