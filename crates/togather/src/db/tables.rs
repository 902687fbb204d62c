pub mod chat_message;
pub mod chat_room;
pub mod comment;
pub mod member;
pub mod member_tech_stack;
pub mod project;
pub mod project_member;
pub mod project_tech_stack;
pub mod tech_stack;
