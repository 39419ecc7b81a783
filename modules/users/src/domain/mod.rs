pub mod handlers;
pub mod repo;
pub mod requests;
pub mod validators;
