use super::*;

pub mod chat_rooms;
pub mod comments;
pub mod members;
pub mod projects;
pub mod tech_stacks;
